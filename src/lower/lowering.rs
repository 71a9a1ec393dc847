//! The expression lowering visitor shared by both compilers.
//!
//! Name resolution is the only thing that differs between a single-entity
//! query and a query with joins, so it sits behind [`Scope`]. Everything else
//! (typing, coercion, operator and function translation) lives here.

use super::coerce::{adopt, unify, widen, widest};
use super::node::{Arithmetic, CollectionRef, Comparison, Existential, Lowered, Node, Source, TextTest};
use crate::ast::*;
use crate::error::LowerError;
use crate::schema::{EntityDef, Schema};

/// Resolves dotted names to fields of the entity being filtered.
pub(crate) trait Scope {
    /// Resolve `path` to a field, or to a [`Node::Collection`] marker for a
    /// column of a to-many relation.
    fn resolve(&self, path: &[&str]) -> Result<Lowered, LowerError>;
}

/// Resolve `segments` against `entity`: to-one relation hops, then a column.
///
/// `prefix` is the relation chain already walked from the root.
pub(crate) fn resolve_path(
    schema: &Schema,
    entity: &EntityDef,
    mut prefix: Vec<String>,
    segments: &[&str],
    full_name: &str,
) -> Result<Lowered, LowerError> {
    let Some((column, hops)) = segments.split_last() else {
        return Err(LowerError::unsupported("Empty identifier"));
    };

    let mut current = entity;
    for hop in hops {
        let relation = current.relation(hop).ok_or_else(|| LowerError::AttributeNotFound {
            entity: current.name.clone(),
            name: full_name.to_string(),
            suggestion: current.suggest_column(hop),
        })?;
        if relation.many {
            return Err(LowerError::unsupported(format!(
                "Navigation through collection '{}' without a JOIN",
                relation.name
            )));
        }
        current = schema
            .entity(&relation.target)
            .ok_or_else(|| LowerError::EntityNotFound(relation.target.clone()))?;
        prefix.push(relation.name.clone());
    }

    match current.column(column) {
        Some(def) => {
            let source = if prefix.is_empty() {
                Source::Root
            } else {
                Source::Related(prefix)
            };
            Ok(Lowered::field(source, def.name.clone(), def.kind))
        }
        None if current.relation(column).is_some() => Err(LowerError::NotAColumn {
            entity: current.name.clone(),
            name: full_name.to_string(),
        }),
        None => Err(LowerError::AttributeNotFound {
            entity: current.name.clone(),
            name: full_name.to_string(),
            suggestion: current.suggest_column(column),
        }),
    }
}

/// Lowers Dino expressions through a [`Scope`].
pub(crate) struct Lowerer<'s, S: Scope> {
    scope: &'s S,
}

impl<'s, S: Scope> Lowerer<'s, S> {
    pub fn new(scope: &'s S) -> Self {
        Self { scope }
    }

    /// Lower a WHERE condition; the result must be boolean.
    pub fn condition(&mut self, expr: &Expr) -> Result<Lowered, LowerError> {
        let lowered = self.scalar(expr)?;
        let lowered = adopt(lowered, ValueKind::Bool);
        if lowered.kind != ValueKind::Bool {
            return Err(LowerError::NotBoolean(lowered.kind));
        }
        Ok(lowered)
    }

    /// Lower an expression that must produce a single value.
    pub fn scalar(&mut self, expr: &Expr) -> Result<Lowered, LowerError> {
        let lowered = expr.accept(self)?;
        if let Some(collection) = lowered.as_collection() {
            return Err(LowerError::CollectionNotScalar(collection.to_string()));
        }
        Ok(lowered)
    }

    fn resolve(&self, path: &[&str]) -> Result<Lowered, LowerError> {
        if path.iter().any(|segment| segment.is_empty() || *segment == "*") {
            return Err(LowerError::unsupported(format!("'{}' as a value", path.join("."))));
        }
        self.scope.resolve(path)
    }

    fn logical(op: BinaryOperator, left: Lowered, right: Lowered) -> Result<Lowered, LowerError> {
        let left = adopt(left, ValueKind::Bool);
        let right = adopt(right, ValueKind::Bool);
        if left.kind != ValueKind::Bool || right.kind != ValueKind::Bool {
            return Err(LowerError::mismatch(op, left.kind, right.kind));
        }
        let node = match op {
            BinaryOperator::And => Node::And(left.boxed(), right.boxed()),
            _ => Node::Or(left.boxed(), right.boxed()),
        };
        Ok(Lowered::new(ValueKind::Bool, node))
    }

    /// Lower a comparison or LIKE over two scalar operands.
    fn compare(op: BinaryOperator, left: Lowered, right: Lowered) -> Result<Lowered, LowerError> {
        let Some(comparison) = Comparison::from_operator(op) else {
            return Self::like(left, right);
        };
        let (left, right) = unify(op.symbol(), left, right)?;
        if comparison.is_ordering() && left.kind != ValueKind::Untyped && !left.kind.is_ordered() {
            return Err(LowerError::mismatch(op, left.kind, right.kind));
        }
        Ok(Lowered::new(
            ValueKind::Bool,
            Node::Compare(comparison, left.boxed(), right.boxed()),
        ))
    }

    /// `%v%` is a substring test, `v%` a prefix test, `%v` a suffix test and
    /// a pattern without `%` an equality test. `_` is not a wildcard.
    fn like(target: Lowered, pattern: Lowered) -> Result<Lowered, LowerError> {
        let text = match pattern.as_constant() {
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                return Err(LowerError::mismatch(BinaryOperator::Like, target.kind, pattern.kind));
            }
            None => return Err(LowerError::DynamicLikePattern),
        };
        let target = adopt(target, ValueKind::String);
        if target.kind != ValueKind::String {
            return Err(LowerError::mismatch(BinaryOperator::Like, target.kind, ValueKind::String));
        }

        let test = match (text.starts_with('%'), text.ends_with('%')) {
            (true, true) => Some((TextTest::Contains, text.trim_matches('%'))),
            (true, false) => Some((TextTest::EndsWith, text.trim_start_matches('%'))),
            (false, true) => Some((TextTest::StartsWith, text.trim_end_matches('%'))),
            (false, false) => None,
        };
        let node = match test {
            Some((test, value)) => Node::Text(
                test,
                target.boxed(),
                Lowered::constant(Value::from(value)).boxed(),
            ),
            None => Node::Compare(
                Comparison::Eq,
                target.boxed(),
                Lowered::constant(Value::from(text.as_str())).boxed(),
            ),
        };
        Ok(Lowered::new(ValueKind::Bool, node))
    }

    fn arithmetic(op: BinaryOperator, left: Lowered, right: Lowered) -> Result<Lowered, LowerError> {
        let (lk, rk) = (left.kind, right.kind);
        let (left, right) = unify(op.symbol(), left, right)?;
        if !left.kind.is_numeric() {
            return Err(LowerError::mismatch(op, lk, rk));
        }
        let Some(arith) = Arithmetic::from_operator(op) else {
            return Err(LowerError::mismatch(op, lk, rk));
        };
        Ok(Lowered::new(
            left.kind,
            Node::Arithmetic(arith, left.boxed(), right.boxed()),
        ))
    }

    fn concat(left: Lowered, right: Lowered) -> Result<Lowered, LowerError> {
        let left = adopt(left, ValueKind::String);
        let right = adopt(right, ValueKind::String);
        if left.kind != ValueKind::String || right.kind != ValueKind::String {
            return Err(LowerError::mismatch(BinaryOperator::Concat, left.kind, right.kind));
        }
        Ok(Lowered::new(
            ValueKind::String,
            Node::Concat(left.boxed(), right.boxed()),
        ))
    }

    /// Rewrite `collection op other` into "some element satisfies op".
    /// Operand order is kept, so the element stands where the column stood.
    fn existential(
        op: BinaryOperator,
        collection: CollectionRef,
        kind: ValueKind,
        other: Lowered,
        collection_on_left: bool,
    ) -> Result<Lowered, LowerError> {
        if !(op.is_comparison() || op == BinaryOperator::Like) {
            return Err(LowerError::UnsupportedCollectionOperator(op.symbol().to_string()));
        }
        let element = Lowered::field(Source::Element, collection.column, kind);
        let predicate = if collection_on_left {
            Self::compare(op, element, other)?
        } else {
            Self::compare(op, other, element)?
        };
        Ok(Lowered::new(
            ValueKind::Bool,
            Node::Any(Existential {
                relation: collection.relation,
                predicate: predicate.boxed(),
            }),
        ))
    }

    fn string_arg(&mut self, function: &str, arg: &Expr) -> Result<Lowered, LowerError> {
        let lowered = adopt(self.scalar(arg)?, ValueKind::String);
        if lowered.kind != ValueKind::String {
            return Err(LowerError::TypeMismatch {
                op: function.to_string(),
                left: lowered.kind,
                right: ValueKind::String,
            });
        }
        Ok(lowered)
    }

    /// Unify the tested value and every list item to one kind.
    fn in_list(&mut self, target: Lowered, values: &[Expr]) -> Result<Lowered, LowerError> {
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            items.push(self.scalar(value)?);
        }

        let numeric = target.kind.is_numeric()
            && items
                .iter()
                .all(|i| i.kind.is_numeric() || i.is_untyped_null());
        let kind = if numeric {
            items
                .iter()
                .filter(|i| i.kind.is_numeric())
                .fold(target.kind, |acc, i| widest(acc, i.kind))
        } else {
            target.kind
        };

        let target = widen(target, kind)?;
        let items = items
            .into_iter()
            .map(|item| {
                let item_kind = item.kind;
                let item = adopt(item, kind);
                if item.kind == kind {
                    Ok(item)
                } else if item.as_constant().is_some() || numeric {
                    widen(item, kind).map_err(|_| LowerError::mismatch("IN", kind, item_kind))
                } else {
                    Err(LowerError::mismatch("IN", kind, item_kind))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Lowered::new(
            ValueKind::Bool,
            Node::InList(target.boxed(), items),
        ))
    }
}

fn not(expr: Lowered) -> Lowered {
    Lowered::new(ValueKind::Bool, Node::Not(expr.boxed()))
}

fn arity(node: &FunctionCall, expected: usize) -> Result<(), LowerError> {
    if node.args.len() == expected {
        Ok(())
    } else {
        Err(LowerError::ArgumentCount {
            function: node.name.clone(),
            expected,
            got: node.args.len(),
        })
    }
}

impl<S: Scope> Visitor for Lowerer<'_, S> {
    type Output = Result<Lowered, LowerError>;

    fn visit_query(&mut self, _node: &SelectQuery) -> Self::Output {
        Err(LowerError::unsupported("A nested SELECT"))
    }

    fn visit_from(&mut self, _node: &FromClause) -> Self::Output {
        Err(LowerError::unsupported("FROM inside an expression"))
    }

    fn visit_join(&mut self, _node: &JoinClause) -> Self::Output {
        Err(LowerError::unsupported("JOIN inside an expression"))
    }

    fn visit_where(&mut self, node: &WhereClause) -> Self::Output {
        self.condition(&node.condition)
    }

    fn visit_group_by(&mut self, _node: &GroupByClause) -> Self::Output {
        Err(LowerError::unsupported("GROUP BY"))
    }

    fn visit_order_by(&mut self, _node: &OrderByClause) -> Self::Output {
        Err(LowerError::unsupported("ORDER BY inside an expression"))
    }

    fn visit_binary(&mut self, node: &BinaryExpr) -> Self::Output {
        let left = node.left.accept(self)?;
        let right = node.right.accept(self)?;

        match (left.as_collection().cloned(), right.as_collection().cloned()) {
            (Some(collection), None) => {
                return Self::existential(node.op, collection, left.kind, right, true);
            }
            (None, Some(collection)) => {
                return Self::existential(node.op, collection, right.kind, left, false);
            }
            (Some(collection), Some(_)) => {
                return Err(LowerError::CollectionNotScalar(collection.to_string()));
            }
            (None, None) => {}
        }

        match node.op {
            BinaryOperator::And | BinaryOperator::Or => Self::logical(node.op, left, right),
            BinaryOperator::Concat => Self::concat(left, right),
            op if op.is_arithmetic() => Self::arithmetic(op, left, right),
            op => Self::compare(op, left, right),
        }
    }

    fn visit_unary(&mut self, node: &UnaryExpr) -> Self::Output {
        let operand = self.scalar(&node.operand)?;
        match node.op {
            UnaryOperator::Not => {
                let operand = adopt(operand, ValueKind::Bool);
                if operand.kind != ValueKind::Bool {
                    return Err(LowerError::mismatch("NOT", operand.kind, ValueKind::Bool));
                }
                Ok(not(operand))
            }
            UnaryOperator::Minus | UnaryOperator::Plus => {
                if !operand.kind.is_numeric() {
                    return Err(LowerError::mismatch(
                        if node.op == UnaryOperator::Minus { "-" } else { "+" },
                        operand.kind,
                        operand.kind,
                    ));
                }
                if node.op == UnaryOperator::Plus {
                    return Ok(operand);
                }
                let kind = operand.kind;
                Ok(Lowered::new(kind, Node::Negate(operand.boxed())))
            }
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => {
                let comparison = if node.op == UnaryOperator::IsNull {
                    Comparison::Eq
                } else {
                    Comparison::Ne
                };
                let null = Lowered::new(operand.kind, Node::Constant(Value::Null));
                Ok(Lowered::new(
                    ValueKind::Bool,
                    Node::Compare(comparison, operand.boxed(), null.boxed()),
                ))
            }
        }
    }

    fn visit_identifier(&mut self, node: &Identifier) -> Self::Output {
        let path: Vec<&str> = node.name.split('.').collect();
        self.resolve(&path)
    }

    fn visit_literal(&mut self, node: &Literal) -> Self::Output {
        Ok(Lowered::constant(node.value.clone()))
    }

    fn visit_parameter(&mut self, node: &Parameter) -> Self::Output {
        Err(LowerError::UnboundParameter(node.name.clone()))
    }

    fn visit_function_call(&mut self, node: &FunctionCall) -> Self::Output {
        let name = node.name.to_uppercase();
        match name.as_str() {
            "UPPER" | "TOUPPER" | "LOWER" | "TOLOWER" => {
                arity(node, 1)?;
                let arg = self.string_arg(&name, &node.args[0])?.boxed();
                let lowered = if name.contains("UPPER") {
                    Node::Upper(arg)
                } else {
                    Node::Lower(arg)
                };
                Ok(Lowered::new(ValueKind::String, lowered))
            }
            "LENGTH" | "LEN" => {
                arity(node, 1)?;
                let arg = self.string_arg(&name, &node.args[0])?;
                Ok(Lowered::new(ValueKind::Int, Node::Length(arg.boxed())))
            }
            "CONTAINS" | "STARTSWITH" | "ENDSWITH" => {
                arity(node, 2)?;
                let target = self.string_arg(&name, &node.args[0])?;
                let arg = self.string_arg(&name, &node.args[1])?;
                let test = match name.as_str() {
                    "CONTAINS" => TextTest::Contains,
                    "STARTSWITH" => TextTest::StartsWith,
                    _ => TextTest::EndsWith,
                };
                Ok(Lowered::new(
                    ValueKind::Bool,
                    Node::Text(test, target.boxed(), arg.boxed()),
                ))
            }
            _ => Err(LowerError::FunctionNotSupported(node.name.clone())),
        }
    }

    fn visit_member_access(&mut self, node: &MemberAccess) -> Self::Output {
        let Some(mut path) = node.object.name_path() else {
            return Err(LowerError::unsupported(format!(
                "Member access on {}",
                node.object.kind_name()
            )));
        };
        path.push(&node.member);
        self.resolve(&path)
    }

    fn visit_in(&mut self, node: &InExpr) -> Self::Output {
        if node.values.iter().any(|v| matches!(v, Expr::Subquery(_))) {
            return Err(LowerError::unsupported("IN with a subquery"));
        }
        let target = node.expr.accept(self)?;
        if target.as_collection().is_some() {
            return Err(LowerError::UnsupportedCollectionOperator("IN".to_string()));
        }
        let lowered = self.in_list(target, &node.values)?;
        Ok(if node.negated { not(lowered) } else { lowered })
    }

    fn visit_between(&mut self, node: &BetweenExpr) -> Self::Output {
        let value = node.expr.accept(self)?;
        if value.as_collection().is_some() {
            return Err(LowerError::UnsupportedCollectionOperator("BETWEEN".to_string()));
        }
        let low = self.scalar(&node.low)?;
        let high = self.scalar(&node.high)?;

        let lower_bound = Self::compare(BinaryOperator::GreaterThanOrEqual, value.clone(), low)?;
        let upper_bound = Self::compare(BinaryOperator::LessThanOrEqual, value, high)?;
        let range = Lowered::new(
            ValueKind::Bool,
            Node::And(lower_bound.boxed(), upper_bound.boxed()),
        );
        Ok(if node.negated { not(range) } else { range })
    }

    fn visit_case(&mut self, _node: &CaseExpr) -> Self::Output {
        Err(LowerError::unsupported("CASE expression"))
    }

    fn visit_exists(&mut self, _node: &ExistsExpr) -> Self::Output {
        Err(LowerError::unsupported("EXISTS"))
    }

    fn visit_subquery(&mut self, _node: &SubqueryExpr) -> Self::Output {
        Err(LowerError::unsupported("Subquery"))
    }
}
