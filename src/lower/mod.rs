//! Lowering of Dino expressions into executable predicates.
//!
//! A WHERE clause is checked against a [`Schema`], typed, coerced and turned
//! into a [`Predicate`] that runs against any [`Record`]. ORDER BY items
//! become [`OrderKey`]s the same way.
//!
//! ```ignore
//! let query = dino::parse("SELECT * FROM users WHERE Age > 18")?;
//! let predicate = compile_predicate(query.where_clause.as_ref().unwrap(), &schema, "User")?;
//! assert!(predicate.evaluate(&row)?);
//! ```

mod coerce;
mod entity;
mod eval;
mod join;
mod lowering;
pub mod node;

#[cfg(test)]
mod tests;

pub use entity::EntityCompiler;
pub use join::JoinCompiler;
pub use node::Lowered;

use crate::ast::{Expr, FromClause, SortOrder, Value, WhereClause};
use crate::error::{EvalError, LowerError};
use crate::record::Record;
use crate::schema::Schema;
use eval::{Env, eval};
use std::fmt;

/// A compiled boolean filter over one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    entity: String,
    body: Lowered,
}

impl Predicate {
    pub(crate) fn new(entity: &str, body: Lowered) -> Self {
        Self {
            entity: entity.to_string(),
            body,
        }
    }

    /// Name of the entity the predicate filters.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn body(&self) -> &Lowered {
        &self.body
    }

    /// True when the record satisfies the condition. NULL counts as false.
    pub fn evaluate(&self, record: &dyn Record) -> Result<bool, EvalError> {
        Ok(eval(&self.body, Env::new(record))? == Value::Bool(true))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)
    }
}

/// A compiled sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    body: Lowered,
}

impl OrderKey {
    pub(crate) fn new(body: Lowered) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Lowered {
        &self.body
    }

    pub fn extract(&self, record: &dyn Record) -> Result<Value, EvalError> {
        eval(&self.body, Env::new(record))
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)
    }
}

/// Compiled ORDER BY: the keys in order, plus the items that could not be
/// compiled and were left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPlan {
    pub keys: Vec<(OrderKey, SortOrder)>,
    pub dropped: Vec<(Expr, LowerError)>,
}

/// Compile a WHERE clause for a query over `entity` alone.
pub fn compile_predicate(
    where_clause: &WhereClause,
    schema: &Schema,
    entity: &str,
) -> Result<Predicate, LowerError> {
    EntityCompiler::new(schema, entity)?.compile_predicate(where_clause)
}

/// Compile a WHERE clause for a query whose FROM clause carries joins.
pub fn compile_join_predicate(
    from: &FromClause,
    where_clause: &WhereClause,
    schema: &Schema,
    entity: &str,
) -> Result<Predicate, LowerError> {
    JoinCompiler::new(schema, entity, from)?.compile_predicate(where_clause)
}

pub fn compile_order_key(expr: &Expr, schema: &Schema, entity: &str) -> Result<OrderKey, LowerError> {
    EntityCompiler::new(schema, entity)?.compile_order_key(expr)
}

/// Sort key in a join query; `None` when the key cannot be compiled.
pub fn compile_join_order_key(
    expr: &Expr,
    from: &FromClause,
    schema: &Schema,
    entity: &str,
) -> Option<OrderKey> {
    JoinCompiler::new(schema, entity, from)
        .ok()?
        .compile_order_key(expr)
}
