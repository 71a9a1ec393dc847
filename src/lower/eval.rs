//! Evaluation of lowered expressions against a [`Record`].
//!
//! NULL handling: `=` and `<>` treat NULL as a value, so `NULL = NULL` holds.
//! Ordering comparisons and text tests with a NULL operand are false.
//! Arithmetic and string functions propagate NULL.

use super::coerce::convert_value;
use super::node::{Arithmetic, Comparison, Field, Lowered, Node, Source, TextTest};
use crate::ast::{Value, ValueKind};
use crate::error::EvalError;
use crate::record::Record;
use std::cmp::Ordering;

#[derive(Clone, Copy)]
pub(crate) struct Env<'r> {
    root: &'r dyn Record,
    element: Option<&'r dyn Record>,
}

impl<'r> Env<'r> {
    pub fn new(root: &'r dyn Record) -> Self {
        Self { root, element: None }
    }
}

pub(crate) fn eval(expr: &Lowered, env: Env<'_>) -> Result<Value, EvalError> {
    let value = match &expr.node {
        Node::Constant(value) => value.clone(),
        Node::Field(field) => read_field(field, env),
        Node::Convert(inner) => {
            let value = eval(inner, env)?;
            convert_value(&value, expr.kind).unwrap_or(Value::Null)
        }
        Node::Not(inner) => match eval(inner, env)? {
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Null,
        },
        Node::Negate(inner) => negate(eval(inner, env)?)?,
        Node::And(l, r) => {
            let left = eval(l, env)?;
            if left == Value::Bool(false) {
                return Ok(left);
            }
            match (left, eval(r, env)?) {
                (_, Value::Bool(false)) => Value::Bool(false),
                (Value::Bool(true), Value::Bool(true)) => Value::Bool(true),
                _ => Value::Null,
            }
        }
        Node::Or(l, r) => {
            let left = eval(l, env)?;
            if left == Value::Bool(true) {
                return Ok(left);
            }
            match (left, eval(r, env)?) {
                (_, Value::Bool(true)) => Value::Bool(true),
                (Value::Bool(false), Value::Bool(false)) => Value::Bool(false),
                _ => Value::Null,
            }
        }
        Node::Compare(op, l, r) => {
            let left = eval(l, env)?;
            let right = eval(r, env)?;
            Value::Bool(compare(*op, &left, &right))
        }
        Node::Arithmetic(op, l, r) => {
            let left = eval(l, env)?;
            let right = eval(r, env)?;
            arithmetic(*op, left, right)?
        }
        Node::Concat(l, r) => match (eval(l, env)?, eval(r, env)?) {
            (Value::String(a), Value::String(b)) => Value::String(a + &b),
            _ => Value::Null,
        },
        Node::Text(test, target, arg) => match (eval(target, env)?, eval(arg, env)?) {
            (Value::String(s), Value::String(p)) => Value::Bool(match test {
                TextTest::Contains => s.contains(p.as_str()),
                TextTest::StartsWith => s.starts_with(p.as_str()),
                TextTest::EndsWith => s.ends_with(p.as_str()),
            }),
            _ => Value::Bool(false),
        },
        Node::Upper(inner) => match eval(inner, env)? {
            Value::String(s) => Value::String(s.to_uppercase()),
            _ => Value::Null,
        },
        Node::Lower(inner) => match eval(inner, env)? {
            Value::String(s) => Value::String(s.to_lowercase()),
            _ => Value::Null,
        },
        Node::Length(inner) => match eval(inner, env)? {
            Value::String(s) => {
                let len = i32::try_from(s.chars().count()).map_err(|_| EvalError::Overflow(ValueKind::Int))?;
                Value::Int(len)
            }
            _ => Value::Null,
        },
        Node::InList(target, items) => {
            let value = eval(target, env)?;
            let mut found = false;
            for item in items {
                if compare(Comparison::Eq, &value, &eval(item, env)?) {
                    found = true;
                    break;
                }
            }
            Value::Bool(found)
        }
        Node::Any(any) => {
            let mut found = false;
            for element in collection(env.root, &any.relation) {
                let scoped = Env {
                    root: env.root,
                    element: Some(element),
                };
                if eval(&any.predicate, scoped)? == Value::Bool(true) {
                    found = true;
                    break;
                }
            }
            Value::Bool(found)
        }
        // Rewritten into `Any` before a predicate is built.
        Node::Collection(_) => Value::Null,
    };
    Ok(value)
}

fn read_field(field: &Field, env: Env<'_>) -> Value {
    let record = match &field.source {
        Source::Root => Some(env.root),
        Source::Related(path) => follow(env.root, path),
        Source::Element => env.element,
    };
    record.map_or(Value::Null, |r| r.field(&field.column))
}

/// Walk a chain of to-one relations.
fn follow<'r>(record: &'r dyn Record, path: &[String]) -> Option<&'r dyn Record> {
    let mut current = record;
    for relation in path {
        current = current.related(relation).into_iter().next()?;
    }
    Some(current)
}

/// Elements of the to-many relation at the end of `path`.
fn collection<'r>(record: &'r dyn Record, path: &[String]) -> Vec<&'r dyn Record> {
    let Some((last, hops)) = path.split_last() else {
        return Vec::new();
    };
    match follow(record, hops) {
        Some(owner) => owner.related(last),
        None => Vec::new(),
    }
}

fn compare(op: Comparison, left: &Value, right: &Value) -> bool {
    match op {
        Comparison::Eq => equals(left, right),
        Comparison::Ne => !equals(left, right),
        _ => match left.compare(right) {
            Some(ordering) => match op {
                Comparison::Gt => ordering == Ordering::Greater,
                Comparison::Ge => ordering != Ordering::Less,
                Comparison::Lt => ordering == Ordering::Less,
                Comparison::Le => ordering != Ordering::Greater,
                Comparison::Eq | Comparison::Ne => false,
            },
            None => false,
        },
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left.is_null(), right.is_null()) {
        (true, true) => true,
        (false, false) => left.compare(right) == Some(Ordering::Equal),
        _ => false,
    }
}

fn negate(value: Value) -> Result<Value, EvalError> {
    Ok(match value {
        Value::Int(n) => Value::Int(n.checked_neg().ok_or(EvalError::Overflow(ValueKind::Int))?),
        Value::Long(n) => Value::Long(n.checked_neg().ok_or(EvalError::Overflow(ValueKind::Long))?),
        Value::Float(n) => Value::Float(-n),
        Value::Double(n) => Value::Double(-n),
        Value::Decimal(n) => Value::Decimal(-n),
        _ => Value::Null,
    })
}

macro_rules! checked {
    ($op:expr, $a:expr, $b:expr, $zero:expr, $kind:expr) => {{
        if matches!($op, Arithmetic::Div | Arithmetic::Rem) && $b == $zero {
            return Err(EvalError::DivideByZero);
        }
        let result = match $op {
            Arithmetic::Add => $a.checked_add($b),
            Arithmetic::Sub => $a.checked_sub($b),
            Arithmetic::Mul => $a.checked_mul($b),
            Arithmetic::Div => $a.checked_div($b),
            Arithmetic::Rem => $a.checked_rem($b),
        };
        result.ok_or(EvalError::Overflow($kind))?
    }};
}

fn arithmetic(op: Arithmetic, left: Value, right: Value) -> Result<Value, EvalError> {
    Ok(match (left, right) {
        (Value::Int(a), Value::Int(b)) => Value::Int(checked!(op, a, b, 0, ValueKind::Int)),
        (Value::Long(a), Value::Long(b)) => Value::Long(checked!(op, a, b, 0, ValueKind::Long)),
        (Value::Decimal(a), Value::Decimal(b)) => Value::Decimal(checked!(
            op,
            a,
            b,
            rust_decimal::Decimal::ZERO,
            ValueKind::Decimal
        )),
        (Value::Float(a), Value::Float(b)) => Value::Float(float_op(op, a, b)),
        (Value::Double(a), Value::Double(b)) => Value::Double(float_op(op, a, b)),
        _ => Value::Null,
    })
}

fn float_op<T>(op: Arithmetic, a: T, b: T) -> T
where
    T: std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>
        + std::ops::Rem<Output = T>,
{
    match op {
        Arithmetic::Add => a + b,
        Arithmetic::Sub => a - b,
        Arithmetic::Mul => a * b,
        Arithmetic::Div => a / b,
        Arithmetic::Rem => a % b,
    }
}
