//! Tokenizer for Dino.
//!
//! Each token kind is recognized by a small `nom` parser over the rest of
//! the input. The [`Lexer`] itself is a cursor: it runs the parsers, then
//! advances past what they consumed while tracking line and column for
//! diagnostics. Keywords are case-insensitive; everything else that looks
//! like a word is an identifier.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, satisfy},
    combinator::{opt, recognize, value},
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
};

use super::tokens::{Token, TokenKind, keyword};
use crate::error::LexError;

pub struct Lexer<'a> {
    source: &'a str,
    /// Byte offset into `source`.
    offset: usize,
    /// Character offset, reported as the token position.
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            offset: 0,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input. The result always ends with
    /// [`TokenKind::EndOfInput`], even for empty input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is(TokenKind::EndOfInput);
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token, LexError> {
        let saved = (self.offset, self.pos, self.line, self.column);
        let token = self.next_token();
        (self.offset, self.pos, self.line, self.column) = saved;
        token
    }

    /// Rewind to the start of the input.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.pos = 0;
        self.line = 1;
        self.column = 1;
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Ok((_, blank)) = whitespace(self.rest()) {
            self.consume(blank);
        }

        let (start, line, column) = (self.pos, self.line, self.column);
        let input = self.rest();
        let Some(ch) = input.chars().next() else {
            return Ok(Token::new(TokenKind::EndOfInput, "", start, line, column));
        };

        if let Ok((_, text)) = word(input) {
            self.consume(text);
            return Ok(word_token(text, start, line, column));
        }

        if let Ok((_, text)) = number(input) {
            self.consume(text);
            return Ok(Token::new(TokenKind::NumberLiteral, text, start, line, column));
        }

        if ch == '\'' || ch == '"' {
            return match string_literal(input, ch) {
                Ok((rest, text)) => {
                    self.consume(&input[..input.len() - rest.len()]);
                    Ok(Token::new(TokenKind::StringLiteral, text, start, line, column))
                }
                Err(_) => Err(self.error(
                    format!("Unterminated string literal starting at position {}", start),
                    start,
                    line,
                    column,
                )),
            };
        }

        if ch == '@' {
            return match parameter(input) {
                Ok((_, text)) => {
                    self.consume(text);
                    Ok(Token::new(TokenKind::Parameter, text, start, line, column))
                }
                Err(_) => Err(self.error("Invalid parameter name", start, line, column)),
            };
        }

        match symbol(input) {
            Ok((rest, kind)) => {
                let text = &input[..input.len() - rest.len()];
                self.consume(text);
                Ok(Token::new(kind, text, start, line, column))
            }
            Err(_) => Err(self.error(
                format!("Unexpected character '{}'", ch),
                start,
                line,
                column,
            )),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    /// Move past `text`, which must be a prefix of the remaining input.
    fn consume(&mut self, text: &str) {
        for ch in text.chars() {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += text.len();
    }

    fn error(&self, message: impl Into<String>, position: usize, line: usize, column: usize) -> LexError {
        LexError::new(message, position, line, column, self.source)
    }
}

fn word_token(text: &str, start: usize, line: usize, column: usize) -> Token {
    let upper = text.to_uppercase();
    match keyword(&upper) {
        Some(TokenKind::BooleanLiteral) => Token::new(TokenKind::BooleanLiteral, upper, start, line, column),
        Some(kind) => Token::new(kind, text, start, line, column),
        None => Token::new(TokenKind::Identifier, text, start, line, column),
    }
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

/// Keyword or identifier: a letter or `_`, then letters, digits and `_`.
fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Digits with an optional fraction. A dot followed by anything but a digit
/// is left for the next token.
fn number(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)
}

/// `@name`, keeping the `@`.
fn parameter(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('@'), word))(input)
}

/// A string delimited by `quote`. A backslash escapes the quote; any other
/// backslash is kept as is.
fn string_literal(input: &str, quote: char) -> IResult<&str, String> {
    delimited(
        char(quote),
        fold_many0(
            alt((
                preceded(char('\\'), char(quote)),
                satisfy(move |c| c != quote),
            )),
            String::new,
            |mut text, c| {
                text.push(c);
                text
            },
        ),
        char(quote),
    )(input)
}

/// Operators and punctuation; two-character forms first.
fn symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::GreaterThanOrEqual, tag(">=")),
        value(TokenKind::LessThanOrEqual, tag("<=")),
        value(TokenKind::NotEqual, tag("<>")),
        value(TokenKind::NotEqual, tag("!=")),
        value(TokenKind::Concat, tag("||")),
        value(TokenKind::Equal, char('=')),
        value(TokenKind::GreaterThan, char('>')),
        value(TokenKind::LessThan, char('<')),
        value(TokenKind::OpenParen, char('(')),
        value(TokenKind::CloseParen, char(')')),
        value(TokenKind::OpenBracket, char('[')),
        value(TokenKind::CloseBracket, char(']')),
        value(TokenKind::Comma, char(',')),
        value(TokenKind::Dot, char('.')),
        value(TokenKind::Star, char('*')),
        value(TokenKind::Plus, char('+')),
        value(TokenKind::Minus, char('-')),
        value(TokenKind::Divide, char('/')),
        value(TokenKind::Modulo, char('%')),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_leaves_trailing_dot() {
        assert_eq!(number("42.5 x"), Ok((" x", "42.5")));
        assert_eq!(number("42.x"), Ok((".x", "42")));
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal(r"'it\'s' rest", '\''), Ok((" rest", "it's".to_string())));
        assert_eq!(string_literal(r"'a\b'", '\''), Ok(("", r"a\b".to_string())));
        assert!(string_literal("'open", '\'').is_err());
    }

    #[test]
    fn test_symbol_prefers_two_character_forms() {
        assert_eq!(symbol("<>1"), Ok(("1", TokenKind::NotEqual)));
        assert_eq!(symbol("<1"), Ok(("1", TokenKind::LessThan)));
        assert!(symbol("#").is_err());
    }
}
