//! Dino parser.
//!
//! A single-pass recursive-descent parser over the [`Lexer`] token stream.
//! Named parameters are substituted while parsing, so a bound `@name` never
//! reaches the AST as a parameter node.
//!
//! # Syntax Overview
//!
//! ```text
//! SELECT [DISTINCT] items
//! FROM table [alias] {[INNER|LEFT|RIGHT|FULL|CROSS] JOIN table [alias] [ON expr]}
//! [WHERE expr]
//! [GROUP BY exprs [HAVING expr]]
//! [ORDER BY expr [ASC|DESC], ...]
//! [LIMIT n] [OFFSET n]
//! ```

pub mod grammar;
pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;

use crate::ast::{SelectQuery, Span, Value};
use crate::error::{DinoError, DinoResult, ParseError};
use lexer::Lexer;
use std::collections::HashMap;
use tokens::{Token, TokenKind};

/// Parameter values keyed by name without the leading `@`.
pub type Parameters = HashMap<String, Value>;

/// Parse a complete Dino query.
pub fn parse(query: &str) -> DinoResult<SelectQuery> {
    Parser::new(query, None)?.parse_statement()
}

/// Parse a query, replacing every bound `@name` with a literal.
pub fn parse_with_params(query: &str, params: &Parameters) -> DinoResult<SelectQuery> {
    Parser::new(query, Some(params))?.parse_statement()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    query: &'a str,
    params: Option<&'a Parameters>,
}

impl<'a> Parser<'a> {
    pub fn new(query: &'a str, params: Option<&'a Parameters>) -> DinoResult<Self> {
        if query.trim().is_empty() {
            return Err(DinoError::EmptyQuery);
        }
        let mut lexer = Lexer::new(query);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            query,
            params,
        })
    }

    /// Parse one SELECT statement and require the input to end after it.
    pub fn parse_statement(mut self) -> DinoResult<SelectQuery> {
        let query = self.parse_select()?;
        if !self.check(TokenKind::EndOfInput) {
            return Err(self.error(format!(
                "Unexpected token '{}' after query end",
                self.current.value
            )));
        }
        tracing::debug!(
            items = query.items.len(),
            joins = query.from.as_ref().map_or(0, |f| f.joins.len()),
            "parsed query"
        );
        Ok(query)
    }

    // -- token helpers ------------------------------------------------------

    fn check(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    fn span(&self) -> Span {
        Span::new(self.current.line, self.current.column)
    }

    /// Move to the next token, returning the one just passed.
    fn advance(&mut self) -> DinoResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Consume the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> DinoResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> DinoResult<Token> {
        if self.check(kind) {
            return self.advance();
        }
        Err(self.error(format!(
            "{}. Expected {} but found {}",
            message,
            kind,
            self.current.describe()
        )))
    }

    fn expect_identifier(&mut self, message: &str) -> DinoResult<String> {
        Ok(self.expect(TokenKind::Identifier, message)?.value)
    }

    /// Kind of the token after the current one.
    fn peek_kind(&mut self) -> DinoResult<TokenKind> {
        Ok(self.lexer.peek_token()?.kind)
    }

    fn error(&self, message: impl Into<String>) -> DinoError {
        DinoError::Syntax(ParseError::new(message, self.current.clone(), self.query))
    }
}
