//! Grammar rules, split by statement part.
//!
//! Each file adds an `impl Parser` block:
//! - `select`: the statement skeleton and select list
//! - `clauses`: FROM/JOIN, GROUP BY, ORDER BY, LIMIT/OFFSET
//! - `expressions`: precedence climbing from OR down to primaries
//! - `case_when`: CASE expressions

mod case_when;
mod clauses;
mod expressions;
mod select;
