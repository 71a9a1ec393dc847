mod errors;
mod expressions;
mod lexer;

use crate::ast::*;
use crate::parser::parse;

/// The WHERE condition of a query that is expected to parse.
pub(super) fn where_of(query: &str) -> Expr {
    parse(query)
        .unwrap()
        .where_clause
        .expect("query has a WHERE clause")
        .condition
}

pub(super) fn dec(n: i64) -> Expr {
    Expr::literal(rust_decimal::Decimal::from(n))
}
