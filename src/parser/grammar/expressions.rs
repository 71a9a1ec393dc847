//! Expression grammar, lowest precedence first:
//!
//! ```text
//! or          := and (OR and)*
//! and         := not (AND not)*
//! not         := NOT not | NOT EXISTS (select) | comparison
//! comparison  := additive [op additive | [NOT] LIKE additive | [NOT] IN (...)
//!                          | [NOT] BETWEEN additive AND additive | IS [NOT] NULL]
//! additive    := multiplicative (('+' | '-' | '||') multiplicative)*
//! multiplicative := unary (('*' | '/' | '%') unary)*
//! unary       := ('+' | '-') unary | postfix
//! postfix     := primary ('.' ident | '(' args ')')*
//! ```

use crate::ast::*;
use crate::error::DinoResult;
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;
use rust_decimal::Decimal;

impl Parser<'_> {
    pub(crate) fn parse_expression(&mut self) -> DinoResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> DinoResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Or)? {
            let right = self.parse_and()?;
            left = Expr::binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> DinoResult<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(TokenKind::And)? {
            let right = self.parse_not()?;
            left = Expr::binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> DinoResult<Expr> {
        if !self.check(TokenKind::Not) {
            return self.parse_comparison();
        }
        let span = self.span();
        self.advance()?;
        if self.check(TokenKind::Exists) {
            return self.parse_exists(true, span);
        }
        let operand = self.parse_not()?;
        Ok(Expr::unary(UnaryOperator::Not, operand, span))
    }

    fn parse_comparison(&mut self) -> DinoResult<Expr> {
        let left = self.parse_additive()?;
        let span = left.span();

        let op = match self.current.kind {
            TokenKind::Equal => Some(BinaryOperator::Equal),
            TokenKind::NotEqual => Some(BinaryOperator::NotEqual),
            TokenKind::GreaterThan => Some(BinaryOperator::GreaterThan),
            TokenKind::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
            TokenKind::LessThan => Some(BinaryOperator::LessThan),
            TokenKind::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let right = self.parse_additive()?;
            return Ok(Expr::binary(left, op, right));
        }

        match self.current.kind {
            TokenKind::Is => {
                self.advance()?;
                let op = if self.eat(TokenKind::Not)? {
                    UnaryOperator::IsNotNull
                } else {
                    UnaryOperator::IsNull
                };
                self.expect(TokenKind::Null, "Expected NULL after IS")?;
                Ok(Expr::unary(op, left, span))
            }
            TokenKind::Not => match self.peek_kind()? {
                TokenKind::Like | TokenKind::In | TokenKind::Between => {
                    self.advance()?;
                    self.parse_predicate_suffix(left, true)
                }
                _ => Ok(left),
            },
            TokenKind::Like | TokenKind::In | TokenKind::Between => {
                self.parse_predicate_suffix(left, false)
            }
            _ => Ok(left),
        }
    }

    /// LIKE / IN / BETWEEN after the left operand (and an optional NOT).
    fn parse_predicate_suffix(&mut self, left: Expr, negated: bool) -> DinoResult<Expr> {
        let span = left.span();
        match self.current.kind {
            TokenKind::Like => {
                self.advance()?;
                let pattern = self.parse_additive()?;
                let like = Expr::binary(left, BinaryOperator::Like, pattern);
                if negated {
                    Ok(Expr::unary(UnaryOperator::Not, like, span))
                } else {
                    Ok(like)
                }
            }
            TokenKind::In => {
                self.advance()?;
                let values = self.parse_in_list()?;
                Ok(Expr::In(InExpr {
                    expr: Box::new(left),
                    values,
                    negated,
                    span,
                }))
            }
            _ => {
                self.expect(TokenKind::Between, "Expected BETWEEN")?;
                let low = self.parse_additive()?;
                self.expect(TokenKind::And, "Expected AND in BETWEEN expression")?;
                let high = self.parse_additive()?;
                Ok(Expr::Between(BetweenExpr {
                    expr: Box::new(left),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                    span,
                }))
            }
        }
    }

    /// `( SELECT ... )` or `( expr, ... )`
    fn parse_in_list(&mut self) -> DinoResult<Vec<Expr>> {
        self.expect(TokenKind::OpenParen, "Expected '(' after IN")?;

        let values = if self.check(TokenKind::Select) {
            let span = self.span();
            let query = self.parse_select()?;
            vec![Expr::Subquery(SubqueryExpr {
                query: Box::new(query),
                span,
            })]
        } else {
            let mut values = vec![self.parse_expression()?];
            while self.eat(TokenKind::Comma)? {
                values.push(self.parse_expression()?);
            }
            values
        };

        self.expect(TokenKind::CloseParen, "Expected ')' after IN list")?;
        Ok(values)
    }

    fn parse_additive(&mut self) -> DinoResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                TokenKind::Concat => BinaryOperator::Concat,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> DinoResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Divide => BinaryOperator::Divide,
                TokenKind::Modulo => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> DinoResult<Expr> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            _ => return self.parse_postfix(),
        };
        let span = self.span();
        self.advance()?;
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand, span))
    }

    fn parse_postfix(&mut self) -> DinoResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(TokenKind::Dot) {
                self.advance()?;
                let member = self.expect_identifier("Expected member name after '.'")?;
                let span = expr.span();
                expr = Expr::MemberAccess(MemberAccess {
                    object: Box::new(expr),
                    member,
                    span,
                });
                continue;
            }
            if self.check(TokenKind::OpenParen) {
                if let Expr::Identifier(id) = &expr {
                    let (name, span) = (id.name.clone(), id.span);
                    expr = self.parse_call(name, span)?;
                    continue;
                }
            }
            break;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> DinoResult<Expr> {
        let span = self.span();
        match self.current.kind {
            TokenKind::NumberLiteral => {
                let value = match self.current.value.parse::<Decimal>() {
                    Ok(n) => n,
                    Err(_) => {
                        return Err(self.error(format!(
                            "Invalid number literal '{}'",
                            self.current.value
                        )));
                    }
                };
                self.advance()?;
                Ok(Expr::Literal(Literal {
                    value: Value::Decimal(value),
                    kind: ValueKind::Decimal,
                    span,
                }))
            }
            TokenKind::StringLiteral => {
                let token = self.advance()?;
                Ok(Expr::Literal(Literal {
                    value: Value::String(token.value),
                    kind: ValueKind::String,
                    span,
                }))
            }
            TokenKind::BooleanLiteral => {
                let token = self.advance()?;
                Ok(Expr::Literal(Literal {
                    value: Value::Bool(token.value == "TRUE"),
                    kind: ValueKind::Bool,
                    span,
                }))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::Literal(Literal {
                    value: Value::Null,
                    kind: ValueKind::Untyped,
                    span,
                }))
            }
            TokenKind::Parameter => {
                let token = self.advance()?;
                Ok(self.bind_parameter(token.value, span))
            }
            TokenKind::Identifier => {
                let token = self.advance()?;
                Ok(Expr::Identifier(Identifier {
                    name: token.value,
                    span,
                }))
            }
            TokenKind::OpenParen => {
                self.advance()?;
                let expr = if self.check(TokenKind::Select) {
                    let query = self.parse_select()?;
                    Expr::Subquery(SubqueryExpr {
                        query: Box::new(query),
                        span,
                    })
                } else {
                    self.parse_expression()?
                };
                self.expect(TokenKind::CloseParen, "Expected ')'")?;
                Ok(expr)
            }
            TokenKind::Case => self.parse_case(),
            TokenKind::Exists => self.parse_exists(false, span),
            kind if kind.is_function_name() => {
                let token = self.advance()?;
                self.parse_call(token.value, span)
            }
            _ => Err(self.error(format!("Unexpected token {}", self.current.describe()))),
        }
    }

    /// Replace `@name` with its bound value, or keep it as a parameter node.
    fn bind_parameter(&self, name: String, span: Span) -> Expr {
        let key = name.strip_prefix('@').unwrap_or(&name);
        match self.params.and_then(|params| params.get(key)) {
            Some(value) => Expr::Literal(Literal {
                value: value.clone(),
                kind: value.kind(),
                span,
            }),
            None => Expr::Parameter(Parameter { name, span }),
        }
    }

    /// Argument list of a call; the function name is already consumed.
    fn parse_call(&mut self, name: String, span: Span) -> DinoResult<Expr> {
        self.expect(TokenKind::OpenParen, "Expected '(' after function name")?;

        let mut args = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                if args.is_empty() && self.check(TokenKind::Star) {
                    let star = self.span();
                    self.advance()?;
                    args.push(Expr::Identifier(Identifier {
                        name: "*".to_string(),
                        span: star,
                    }));
                } else {
                    args.push(self.parse_expression()?);
                }
                if !self.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }

        self.expect(TokenKind::CloseParen, "Expected ')' after function arguments")?;
        Ok(Expr::FunctionCall(FunctionCall { name, args, span }))
    }

    /// `EXISTS ( SELECT ... )`; a preceding NOT is already consumed.
    fn parse_exists(&mut self, negated: bool, span: Span) -> DinoResult<Expr> {
        self.expect(TokenKind::Exists, "Expected EXISTS")?;
        self.expect(TokenKind::OpenParen, "Expected '(' after EXISTS")?;
        let query = self.parse_select()?;
        self.expect(TokenKind::CloseParen, "Expected ')' after subquery")?;
        Ok(Expr::Exists(ExistsExpr {
            subquery: Box::new(query),
            negated,
            span,
        }))
    }
}
