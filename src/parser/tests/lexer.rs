use crate::parser::lexer::Lexer;
use crate::parser::tokens::{Token, TokenKind};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_simple_select_tokens() {
    assert_eq!(
        kinds("SELECT name FROM users"),
        vec![
            TokenKind::Select,
            TokenKind::Identifier,
            TokenKind::From,
            TokenKind::Identifier,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_empty_input_has_end_token() {
    assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
    assert_eq!(kinds("  \n\t "), vec![TokenKind::EndOfInput]);
}

#[test]
fn test_keywords_case_insensitive() {
    let tokens = Lexer::new("select Distinct WHERE row_number").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Select);
    assert_eq!(tokens[0].value, "select");
    assert_eq!(tokens[1].kind, TokenKind::Distinct);
    assert_eq!(tokens[2].kind, TokenKind::Where);
    assert_eq!(tokens[3].kind, TokenKind::RowNumber);
}

#[test]
fn test_boolean_literals_uppercased() {
    let tokens = Lexer::new("true False").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::BooleanLiteral);
    assert_eq!(tokens[0].value, "TRUE");
    assert_eq!(tokens[1].value, "FALSE");
}

#[test]
fn test_host_hint_keywords() {
    assert_eq!(
        kinds("Include ThenInclude AsNoTracking"),
        vec![
            TokenKind::Include,
            TokenKind::ThenInclude,
            TokenKind::AsNoTracking,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_numbers_and_trailing_dot() {
    let tokens = Lexer::new("42 3.14 7.").tokenize().unwrap();
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::NumberLiteral);
    assert_eq!(tokens[2].value, "7");
    assert_eq!(tokens[3].kind, TokenKind::Dot);
}

#[test]
fn test_string_escapes() {
    let tokens = Lexer::new(r#"'it\'s' "say \"hi\"" 'a"b'"#).tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].value, "it's");
    assert_eq!(tokens[1].value, "say \"hi\"");
    assert_eq!(tokens[2].value, "a\"b");
}

#[test]
fn test_parameter_token() {
    let tokens = Lexer::new("@minAge @_x1").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Parameter);
    assert_eq!(tokens[0].value, "@minAge");
    assert_eq!(tokens[1].value, "@_x1");
}

#[test]
fn test_operators() {
    assert_eq!(
        kinds("= <> != > >= < <= || + - * / % ( ) [ ] , ."),
        vec![
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::NotEqual,
            TokenKind::GreaterThan,
            TokenKind::GreaterThanOrEqual,
            TokenKind::LessThan,
            TokenKind::LessThanOrEqual,
            TokenKind::Concat,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Divide,
            TokenKind::Modulo,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_line_and_column_tracking() {
    let tokens = Lexer::new("SELECT\n  name\nFROM users").tokenize().unwrap();
    let name = &tokens[1];
    assert_eq!((name.line, name.column, name.position), (2, 3, 9));
    let from = &tokens[2];
    assert_eq!((from.line, from.column), (3, 1));
    assert_eq!(name.to_string(), "Identifier:name at 2:3");
}

#[test]
fn test_token_equality_ignores_line_and_column() {
    let a = Token::new(TokenKind::Identifier, "x", 4, 1, 5);
    let b = Token::new(TokenKind::Identifier, "x", 4, 2, 1);
    let c = Token::new(TokenKind::Identifier, "x", 5, 1, 5);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_peek_and_reset() {
    let mut lexer = Lexer::new("SELECT name");
    let peeked = lexer.peek_token().unwrap();
    let next = lexer.next_token().unwrap();
    assert_eq!(peeked, next);
    assert_eq!(lexer.next_token().unwrap().value, "name");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);

    lexer.reset();
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Select);
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("SELECT 'abc").tokenize().unwrap_err();
    assert_eq!(err.message, "Unterminated string literal starting at position 7");
    assert_eq!((err.line, err.column), (1, 8));
}

#[test]
fn test_lone_bang_and_pipe() {
    let err = Lexer::new("a ! b").tokenize().unwrap_err();
    assert_eq!(err.message, "Unexpected character '!'");
    assert_eq!(err.position, 2);

    let err = Lexer::new("a | b").tokenize().unwrap_err();
    assert_eq!(err.message, "Unexpected character '|'");
}

#[test]
fn test_invalid_parameter_and_unknown_character() {
    let err = Lexer::new("x = @1").tokenize().unwrap_err();
    assert_eq!(err.message, "Invalid parameter name");
    assert_eq!(err.column, 5);

    let err = Lexer::new("SELECT #").tokenize().unwrap_err();
    assert_eq!(err.message, "Unexpected character '#'");
    assert_eq!(err.snippet(), "SELECT #\n       ^");
}
