//! Kind coercion for lowered operands.
//!
//! Numeric operands widen along int < long < float < double < decimal.
//! Constants are converted eagerly; other operands get a [`Node::Convert`].
//! A string constant compared with a date-time converts to a date-time.

use super::node::{Lowered, Node};
use crate::ast::{Value, ValueKind};
use crate::error::LowerError;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// The wider of two numeric kinds.
pub fn widest(a: ValueKind, b: ValueKind) -> ValueKind {
    if a.numeric_rank() >= b.numeric_rank() { a } else { b }
}

/// Convert a value to `to`. Only widening conversions and string to
/// date-time are accepted; NULL converts to every kind.
pub fn convert_value(value: &Value, to: ValueKind) -> Result<Value, LowerError> {
    let converted = match (value, to) {
        (Value::Null, _) => Some(Value::Null),
        (v, to) if v.kind() == to => Some(v.clone()),

        (Value::Int(n), ValueKind::Long) => Some(Value::Long(i64::from(*n))),
        (Value::Int(n), ValueKind::Float) => Some(Value::Float(*n as f32)),
        (Value::Int(n), ValueKind::Double) => Some(Value::Double(f64::from(*n))),
        (Value::Int(n), ValueKind::Decimal) => Some(Value::Decimal(Decimal::from(*n))),
        (Value::Long(n), ValueKind::Float) => Some(Value::Float(*n as f32)),
        (Value::Long(n), ValueKind::Double) => Some(Value::Double(*n as f64)),
        (Value::Long(n), ValueKind::Decimal) => Some(Value::Decimal(Decimal::from(*n))),
        (Value::Float(n), ValueKind::Double) => Some(Value::Double(f64::from(*n))),
        (Value::Float(n), ValueKind::Decimal) => Decimal::from_f32(*n).map(Value::Decimal),
        (Value::Double(n), ValueKind::Decimal) => Decimal::from_f64(*n).map(Value::Decimal),

        (Value::String(s), ValueKind::DateTime) => Value::parse_datetime(s).map(Value::DateTime),
        _ => None,
    };

    converted.ok_or_else(|| LowerError::ConversionFailed {
        value: value.to_string(),
        from: value.kind(),
        to,
    })
}

/// Bring an operand to kind `to`.
pub fn widen(expr: Lowered, to: ValueKind) -> Result<Lowered, LowerError> {
    if expr.kind == to {
        return Ok(expr);
    }
    if let Node::Constant(value) = &expr.node {
        let value = convert_value(value, to)?;
        return Ok(Lowered::new(to, Node::Constant(value)));
    }
    if expr.kind.is_numeric() && to.is_numeric() && expr.kind.numeric_rank() < to.numeric_rank() {
        return Ok(Lowered::new(to, Node::Convert(expr.boxed())));
    }
    Err(LowerError::ConversionFailed {
        value: expr.to_string(),
        from: expr.kind,
        to,
    })
}

/// Give a NULL constant the kind `to`; other operands pass through.
pub fn adopt(expr: Lowered, to: ValueKind) -> Lowered {
    if expr.is_untyped_null() {
        Lowered::new(to, expr.node)
    } else {
        expr
    }
}

/// Bring both operands of `op` to a common kind.
pub fn unify(op: &str, left: Lowered, right: Lowered) -> Result<(Lowered, Lowered), LowerError> {
    if left.kind == right.kind {
        return Ok((left, right));
    }
    if left.is_untyped_null() {
        let kind = right.kind;
        return Ok((adopt(left, kind), right));
    }
    if right.is_untyped_null() {
        let kind = left.kind;
        return Ok((left, adopt(right, kind)));
    }

    let (lk, rk) = (left.kind, right.kind);
    if lk.is_numeric() && rk.is_numeric() {
        let to = widest(lk, rk);
        return Ok((widen(left, to)?, widen(right, to)?));
    }
    if right.as_constant().is_some() {
        let right = widen(right, lk).map_err(|_| LowerError::mismatch(op, lk, rk))?;
        return Ok((left, right));
    }
    if left.as_constant().is_some() {
        let left = widen(left, rk).map_err(|_| LowerError::mismatch(op, lk, rk))?;
        return Ok((left, right));
    }
    Err(LowerError::mismatch(op, lk, rk))
}
