//! # Dino — a SQL-like query language for typed records
//!
//! Dino parses a SQL-flavoured SELECT dialect into an AST and lowers its
//! WHERE and ORDER BY clauses into predicates and sort keys over any
//! [`record::Record`] described by a [`schema::Schema`].
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use dino::prelude::*;
//!
//! let query = dino::parse("SELECT * FROM users u WHERE u.Age > 18 AND u.Name LIKE 'J%'")?;
//! let predicate = compile_predicate(query.where_clause.as_ref().unwrap(), &schema, "User")?;
//! // => ((decimal(Age) > 18) AND starts_with(Name, 'J'))
//! println!("{}", predicate);
//!
//! // Back to text
//! let text = query.to_sql();
//! ```
//!
//! ## Pipeline
//!
//! | Stage      | Module         | Output                     |
//! |------------|----------------|----------------------------|
//! | Tokenize   | `parser::lexer`| `Vec<Token>`               |
//! | Parse      | `parser`       | `SelectQuery`              |
//! | Lower      | `lower`        | `Predicate`, `OrderKey`    |
//! | Execute    | `engine`       | `ResultSet` (in memory)    |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod lower;
pub mod parser;
pub mod record;
pub mod schema;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::DinoConfig;
    pub use crate::engine::{Catalog, DinoQuery, Plan, ResultSet};
    pub use crate::error::*;
    pub use crate::lower::{
        EntityCompiler, JoinCompiler, OrderKey, OrderPlan, Predicate, compile_join_order_key,
        compile_join_predicate, compile_order_key, compile_predicate,
    };
    pub use crate::parser::lexer::Lexer;
    pub use crate::parser::{Parameters, parse, parse_with_params};
    pub use crate::record::{Record, Row};
    pub use crate::schema::{ColumnDef, EntityDef, RelationDef, Schema};
    pub use crate::transpiler::ToSql;
}

/// Parse a Dino query into an AST.
///
/// # Example
///
/// ```
/// use dino::parse;
///
/// let query = parse("SELECT * FROM users WHERE age > 18").unwrap();
/// assert_eq!(query.from.unwrap().table.name, "users");
/// ```
pub fn parse(input: &str) -> error::DinoResult<ast::SelectQuery> {
    parser::parse(input)
}

/// Parse a Dino query, substituting bound `@name` parameters with literals.
pub fn parse_with_params(
    input: &str,
    params: &parser::Parameters,
) -> error::DinoResult<ast::SelectQuery> {
    parser::parse_with_params(input, params)
}
