//! Compiler for queries over a single entity.

use super::lowering::{Lowerer, Scope, resolve_path};
use super::node::Lowered;
use super::{OrderKey, OrderPlan, Predicate};
use crate::ast::{Expr, OrderByClause, TableSource, WhereClause};
use crate::error::LowerError;
use crate::schema::{EntityDef, Schema};

/// Names resolve against the root entity's columns. A leading alias
/// segment (`u.Name`, `x.Name`, `user.Name`) is stripped; further dotted
/// segments navigate to-one relations.
pub(crate) struct EntityScope<'a> {
    schema: &'a Schema,
    entity: &'a EntityDef,
    aliases: Vec<String>,
}

impl Scope for EntityScope<'_> {
    fn resolve(&self, path: &[&str]) -> Result<Lowered, LowerError> {
        let full_name = path.join(".");
        let segments = match path {
            [first, rest @ ..] if !rest.is_empty() && self.is_alias(first) => rest,
            _ => path,
        };
        resolve_path(self.schema, self.entity, Vec::new(), segments, &full_name)
    }
}

impl EntityScope<'_> {
    fn is_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Compiles WHERE conditions and sort keys for one entity.
pub struct EntityCompiler<'a> {
    scope: EntityScope<'a>,
}

impl<'a> EntityCompiler<'a> {
    pub fn new(schema: &'a Schema, entity: &str) -> Result<Self, LowerError> {
        let def = schema
            .entity(entity)
            .ok_or_else(|| LowerError::EntityNotFound(entity.to_string()))?;
        Ok(Self {
            scope: EntityScope {
                schema,
                entity: def,
                aliases: vec![def.name.to_lowercase(), "x".to_string()],
            },
        })
    }

    /// Accept `alias.column` as a reference to the entity.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.scope.aliases.push(alias.into());
        self
    }

    /// Accept the table name and alias of a FROM source as qualifiers.
    pub fn with_table(self, table: &TableSource) -> Self {
        let this = self.with_alias(table.name.clone());
        match &table.alias {
            Some(alias) => this.with_alias(alias.clone()),
            None => this,
        }
    }

    pub fn entity(&self) -> &EntityDef {
        self.scope.entity
    }

    pub fn compile_predicate(&self, where_clause: &WhereClause) -> Result<Predicate, LowerError> {
        let body = where_clause.accept(&mut Lowerer::new(&self.scope))?;
        let predicate = Predicate::new(&self.scope.entity.name, body);
        tracing::debug!(entity = %predicate.entity(), predicate = %predicate, "compiled predicate");
        Ok(predicate)
    }

    /// Compile a scalar expression into a sort key.
    pub fn compile_order_key(&self, expr: &Expr) -> Result<OrderKey, LowerError> {
        let body = Lowerer::new(&self.scope).scalar(expr)?;
        Ok(OrderKey::new(body))
    }

    pub fn compile_order_by(&self, clause: &OrderByClause) -> Result<OrderPlan, LowerError> {
        let mut plan = OrderPlan::default();
        for item in &clause.items {
            plan.keys.push((self.compile_order_key(&item.expr)?, item.order));
        }
        Ok(plan)
    }
}
