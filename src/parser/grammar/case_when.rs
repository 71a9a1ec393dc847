use crate::ast::*;
use crate::error::DinoResult;
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl Parser<'_> {
    /// `CASE [subject] WHEN cond THEN result ... [ELSE result] END`
    pub(crate) fn parse_case(&mut self) -> DinoResult<Expr> {
        let span = self.span();
        self.expect(TokenKind::Case, "Expected CASE")?;

        let operand = if self.check(TokenKind::When) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        let mut whens = Vec::new();
        while self.eat(TokenKind::When)? {
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Then, "Expected THEN after WHEN condition")?;
            let result = self.parse_expression()?;
            whens.push(WhenClause { condition, result });
        }
        if whens.is_empty() {
            return Err(self.error("CASE expression requires at least one WHEN clause"));
        }

        let else_result = if self.eat(TokenKind::Else)? {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect(TokenKind::End, "Expected END to close CASE")?;

        Ok(Expr::Case(CaseExpr {
            operand,
            whens,
            else_result,
            span,
        }))
    }
}
