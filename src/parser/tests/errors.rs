use crate::error::DinoError;
use crate::parser::parse;
use crate::parser::tokens::TokenKind;

fn syntax_error(query: &str) -> crate::error::ParseError {
    match parse(query) {
        Err(DinoError::Syntax(e)) => e,
        other => panic!("Expected syntax error for {:?}, got {:?}", query, other),
    }
}

#[test]
fn test_misspelled_keyword_reports_token() {
    let err = syntax_error("SELECT * FORM users");
    assert_eq!(err.token.value, "FORM");
    assert_eq!(err.token.kind, TokenKind::Identifier);
    assert_eq!(err.message, "Unexpected token 'FORM' after query end");
    assert_eq!(err.query, "SELECT * FORM users");
    assert_eq!(err.snippet(), "SELECT * FORM users\n         ^");
}

#[test]
fn test_empty_query() {
    assert!(matches!(parse(""), Err(DinoError::EmptyQuery)));
    assert!(matches!(parse("  \n\t"), Err(DinoError::EmptyQuery)));
}

#[test]
fn test_missing_select() {
    let err = syntax_error("UPDATE users");
    assert_eq!(
        err.message,
        "Expected SELECT. Expected Select but found 'UPDATE'"
    );
}

#[test]
fn test_missing_table_name() {
    let err = syntax_error("SELECT * FROM");
    assert_eq!(
        err.message,
        "Expected table name. Expected Identifier but found end of input"
    );
    assert_eq!(err.token.kind, TokenKind::EndOfInput);
}

#[test]
fn test_missing_select_items() {
    let err = syntax_error("SELECT FROM users");
    assert_eq!(err.message, "Unexpected token 'FROM'");
}

#[test]
fn test_join_requires_on() {
    let err = syntax_error("SELECT * FROM users u JOIN orders o WHERE o.total > 1");
    assert!(err.message.starts_with("Expected ON after join table"));
    assert_eq!(err.token.value, "WHERE");
}

#[test]
fn test_cross_join_rejects_on() {
    let err = syntax_error("SELECT * FROM users CROSS JOIN products ON 1 = 1");
    assert_eq!(err.token.value, "ON");
}

#[test]
fn test_limit_and_offset_integers() {
    assert_eq!(
        syntax_error("SELECT * FROM users LIMIT 'ten'").message,
        "Expected integer after LIMIT"
    );
    assert_eq!(
        syntax_error("SELECT * FROM users LIMIT 10.5").message,
        "Invalid integer value '10.5'"
    );
    assert_eq!(
        syntax_error("SELECT * FROM users LIMIT 1 OFFSET x").message,
        "Expected integer after OFFSET"
    );
}

#[test]
fn test_unclosed_parenthesis() {
    let err = syntax_error("SELECT * FROM users WHERE (age > 1");
    assert_eq!(err.message, "Expected ')'. Expected CloseParen but found end of input");
}

#[test]
fn test_is_requires_null() {
    let err = syntax_error("SELECT * FROM users WHERE email IS 'x'");
    assert!(err.message.starts_with("Expected NULL after IS"));
}

#[test]
fn test_case_requires_when() {
    let err = syntax_error("SELECT CASE status ELSE 1 END");
    assert_eq!(err.message, "CASE expression requires at least one WHEN clause");
}

#[test]
fn test_lex_error_aborts_parse() {
    match parse("SELECT * FROM users WHERE name = 'abc") {
        Err(DinoError::Lex(e)) => {
            assert_eq!(e.message, "Unterminated string literal starting at position 33");
        }
        other => panic!("Expected lex error, got {:?}", other),
    }
}
