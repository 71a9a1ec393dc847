use crate::ast::*;
use crate::error::DinoResult;
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl Parser<'_> {
    /// `SELECT [DISTINCT] items [FROM ...] [WHERE ...] [GROUP BY ...]
    /// [ORDER BY ...] [LIMIT n] [OFFSET n]`
    pub(crate) fn parse_select(&mut self) -> DinoResult<SelectQuery> {
        let span = self.span();
        self.expect(TokenKind::Select, "Expected SELECT")?;

        let distinct = self.eat(TokenKind::Distinct)?;
        let items = self.parse_select_items()?;

        let from = if self.eat(TokenKind::From)? {
            Some(self.parse_from()?)
        } else {
            None
        };

        let where_clause = if self.check(TokenKind::Where) {
            let span = self.span();
            self.advance()?;
            Some(WhereClause {
                condition: self.parse_expression()?,
                span,
            })
        } else {
            None
        };

        let group_by = if self.check(TokenKind::Group) {
            Some(self.parse_group_by()?)
        } else {
            None
        };

        let order_by = if self.check(TokenKind::Order) {
            Some(self.parse_order_by()?)
        } else {
            None
        };

        let limit = if self.eat(TokenKind::Limit)? {
            Some(self.parse_count("LIMIT")?)
        } else {
            None
        };

        let offset = if self.eat(TokenKind::Offset)? {
            Some(self.parse_count("OFFSET")?)
        } else {
            None
        };

        Ok(SelectQuery {
            items,
            distinct,
            from,
            where_clause,
            group_by,
            order_by,
            limit,
            offset,
            span,
        })
    }

    /// `*` on its own, or `expr [[AS] alias], ...`
    fn parse_select_items(&mut self) -> DinoResult<Vec<SelectItem>> {
        if self.check(TokenKind::Star) {
            let span = self.span();
            self.advance()?;
            return Ok(vec![SelectItem {
                expr: Expr::Identifier(Identifier {
                    name: "*".to_string(),
                    span,
                }),
                alias: None,
            }]);
        }

        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            let alias = self.parse_alias("Expected alias after AS")?;
            items.push(SelectItem { expr, alias });

            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        Ok(items)
    }

    /// Optional `AS name` or a bare trailing identifier.
    pub(crate) fn parse_alias(&mut self, message: &str) -> DinoResult<Option<String>> {
        if self.eat(TokenKind::As)? {
            return Ok(Some(self.expect_identifier(message)?));
        }
        if self.check(TokenKind::Identifier) {
            return Ok(Some(self.advance()?.value));
        }
        Ok(None)
    }

    /// Non-negative integer argument of LIMIT / OFFSET.
    fn parse_count(&mut self, clause: &str) -> DinoResult<u32> {
        if !self.check(TokenKind::NumberLiteral) {
            return Err(self.error(format!("Expected integer after {}", clause)));
        }
        match self.current.value.parse::<u32>() {
            Ok(n) => {
                self.advance()?;
                Ok(n)
            }
            Err(_) => Err(self.error(format!(
                "Invalid integer value '{}'",
                self.current.value
            ))),
        }
    }
}
