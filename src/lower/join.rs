//! Compiler for queries with JOINs.
//!
//! Each joined table is matched to a relationship of the root entity. The
//! relationship, not the ON condition, decides how rows relate: a to-one
//! join reads the related record, a to-many join turns comparisons on its
//! columns into "some related record satisfies" tests.

use super::lowering::{Lowerer, Scope, resolve_path};
use super::node::{CollectionRef, Lowered, Node};
use super::{OrderKey, OrderPlan, Predicate};
use crate::ast::{Expr, FromClause, OrderByClause, WhereClause};
use crate::error::LowerError;
use crate::schema::{EntityDef, RelationDef, Schema};
use std::collections::HashMap;

#[derive(Clone, Copy)]
enum Binding<'a> {
    Root,
    Related(&'a RelationDef, &'a EntityDef),
}

/// Table names and aliases of the FROM clause, keyed in lowercase.
pub(crate) struct JoinScope<'a> {
    schema: &'a Schema,
    root: &'a EntityDef,
    bindings: HashMap<String, Binding<'a>>,
}

impl<'a> JoinScope<'a> {
    fn new(schema: &'a Schema, root: &'a EntityDef, from: &FromClause) -> Self {
        let mut bindings = HashMap::new();
        bind(&mut bindings, &from.table.name, from.table.alias.as_deref(), Binding::Root);

        for join in &from.joins {
            let table = &join.table;
            let Some(relation) = schema.relation_for_join(root, &table.name) else {
                tracing::debug!(entity = %root.name, table = %table.name, "no relationship for joined table");
                continue;
            };
            let Some(target) = schema.entity(&relation.target) else {
                tracing::debug!(relation = %relation.name, target = %relation.target, "relationship target is not defined");
                continue;
            };
            bind(
                &mut bindings,
                &table.name,
                table.alias.as_deref(),
                Binding::Related(relation, target),
            );
        }

        Self {
            schema,
            root,
            bindings,
        }
    }
}

fn bind<'a>(bindings: &mut HashMap<String, Binding<'a>>, table: &str, alias: Option<&str>, binding: Binding<'a>) {
    bindings.insert(table.to_lowercase(), binding);
    if let Some(alias) = alias {
        bindings.insert(alias.to_lowercase(), binding);
    }
}

impl Scope for JoinScope<'_> {
    fn resolve(&self, path: &[&str]) -> Result<Lowered, LowerError> {
        let full_name = path.join(".");
        let [qualifier, rest @ ..] = path else {
            return Err(LowerError::unsupported("Empty identifier"));
        };
        if rest.is_empty() {
            return resolve_path(self.schema, self.root, Vec::new(), path, &full_name);
        }

        let binding = self
            .bindings
            .get(&qualifier.to_lowercase())
            .ok_or_else(|| LowerError::AliasNotFound(qualifier.to_string()))?;

        match *binding {
            Binding::Root => resolve_path(self.schema, self.root, Vec::new(), rest, &full_name),
            Binding::Related(relation, target) if !relation.many => {
                resolve_path(self.schema, target, vec![relation.name.clone()], rest, &full_name)
            }
            Binding::Related(relation, target) => {
                let [column] = rest else {
                    return Err(LowerError::unsupported(format!(
                        "Navigation below collection '{}'",
                        relation.name
                    )));
                };
                let def = target.column(column).ok_or_else(|| LowerError::AttributeNotFound {
                    entity: target.name.clone(),
                    name: full_name.clone(),
                    suggestion: target.suggest_column(column),
                })?;
                Ok(Lowered::new(
                    def.kind,
                    Node::Collection(CollectionRef {
                        relation: vec![relation.name.clone()],
                        column: def.name.clone(),
                    }),
                ))
            }
        }
    }
}

/// Compiles WHERE conditions and sort keys for a root entity joined to
/// its relationships.
pub struct JoinCompiler<'a> {
    scope: JoinScope<'a>,
}

impl<'a> JoinCompiler<'a> {
    pub fn new(schema: &'a Schema, entity: &str, from: &FromClause) -> Result<Self, LowerError> {
        let root = schema
            .entity(entity)
            .ok_or_else(|| LowerError::EntityNotFound(entity.to_string()))?;
        Ok(Self {
            scope: JoinScope::new(schema, root, from),
        })
    }

    pub fn entity(&self) -> &EntityDef {
        self.scope.root
    }

    pub fn compile_predicate(&self, where_clause: &WhereClause) -> Result<Predicate, LowerError> {
        let body = where_clause.accept(&mut Lowerer::new(&self.scope))?;
        let predicate = Predicate::new(&self.scope.root.name, body);
        tracing::debug!(entity = %predicate.entity(), predicate = %predicate, "compiled join predicate");
        Ok(predicate)
    }

    /// Compile a sort key. Keys that do not lower to a single value per root
    /// record, such as a column of a to-many join, yield `None`.
    pub fn compile_order_key(&self, expr: &Expr) -> Option<OrderKey> {
        self.try_order_key(expr).ok()
    }

    /// Compile every ORDER BY item, keeping the ones that fail aside.
    pub fn compile_order_by(&self, clause: &OrderByClause) -> OrderPlan {
        let mut plan = OrderPlan::default();
        for item in &clause.items {
            match self.try_order_key(&item.expr) {
                Ok(key) => plan.keys.push((key, item.order)),
                Err(err) => {
                    tracing::debug!(error = %err, "dropping sort key");
                    plan.dropped.push((item.expr.clone(), err));
                }
            }
        }
        plan
    }

    fn try_order_key(&self, expr: &Expr) -> Result<OrderKey, LowerError> {
        Lowerer::new(&self.scope).scalar(expr).map(OrderKey::new)
    }
}
