//! Records that compiled predicates run against.
//!
//! Hosts implement [`Record`] for their own types. [`Row`] is a ready-made
//! dynamic record used by the in-memory catalog and the CLI.

use crate::ast::{Value, ValueKind};
use crate::error::{DinoError, DinoResult};
use crate::schema::{EntityDef, Schema};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Read access to one entity instance.
///
/// Column and relation names are passed exactly as declared in the schema.
pub trait Record {
    /// Value of a column; NULL when the record has no such value.
    fn field(&self, column: &str) -> Value;

    /// Related records. A to-one relation yields at most one record.
    fn related(&self, relation: &str) -> Vec<&dyn Record>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: BTreeMap<String, Value>,
    relations: BTreeMap<String, Vec<Row>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn with_related(mut self, relation: impl Into<String>, rows: Vec<Row>) -> Self {
        self.relations.insert(relation.into(), rows);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn rows(&self, relation: &str) -> &[Row] {
        self.relations.get(relation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build a row from a JSON object, typing each column by the schema.
    ///
    /// Keys match columns and relations case-insensitively and are stored
    /// under their declared names. Unknown keys are skipped.
    pub fn from_json(schema: &Schema, entity: &EntityDef, json: &serde_json::Value) -> DinoResult<Row> {
        let object = json.as_object().ok_or_else(|| {
            DinoError::invalid_data(format!("expected an object for '{}', found {}", entity.name, json))
        })?;

        let mut row = Row::new();
        for (key, value) in object {
            if let Some(column) = entity.column(key) {
                let context = format!("{}.{}", entity.name, column.name);
                row.set(column.name.clone(), json_to_value(value, column.kind, &context)?);
            } else if let Some(relation) = entity.relation(key) {
                let target = schema.entity(&relation.target).ok_or_else(|| {
                    DinoError::invalid_data(format!("unknown entity '{}'", relation.target))
                })?;
                let rows = match value {
                    serde_json::Value::Null => Vec::new(),
                    serde_json::Value::Array(items) if relation.many => items
                        .iter()
                        .map(|item| Row::from_json(schema, target, item))
                        .collect::<DinoResult<Vec<_>>>()?,
                    other if !relation.many => vec![Row::from_json(schema, target, other)?],
                    other => {
                        return Err(DinoError::invalid_data(format!(
                            "expected an array for '{}.{}', found {}",
                            entity.name, relation.name, other
                        )));
                    }
                };
                row.relations.insert(relation.name.clone(), rows);
            } else {
                tracing::debug!(entity = %entity.name, key = %key, "skipping unknown field");
            }
        }
        Ok(row)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (column, value) in &self.values {
            object.insert(column.clone(), value_to_json(value));
        }
        for (relation, rows) in &self.relations {
            let rows = rows.iter().map(Row::to_json).collect();
            object.insert(relation.clone(), serde_json::Value::Array(rows));
        }
        serde_json::Value::Object(object)
    }
}

impl Record for Row {
    fn field(&self, column: &str) -> Value {
        self.values.get(column).cloned().unwrap_or(Value::Null)
    }

    fn related(&self, relation: &str) -> Vec<&dyn Record> {
        self.rows(relation).iter().map(|r| r as &dyn Record).collect()
    }
}

/// Convert a JSON value into a value of the declared column kind.
pub fn json_to_value(json: &serde_json::Value, kind: ValueKind, context: &str) -> DinoResult<Value> {
    use serde_json::Value as Json;

    if json.is_null() {
        return Ok(Value::Null);
    }

    let value = match (kind, json) {
        (ValueKind::Bool, Json::Bool(b)) => Some(Value::Bool(*b)),
        (ValueKind::Int, Json::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int),
        (ValueKind::Long, Json::Number(n)) => n.as_i64().map(Value::Long),
        (ValueKind::Float, Json::Number(n)) => n.as_f64().map(|n| Value::Float(n as f32)),
        (ValueKind::Double, Json::Number(n)) => n.as_f64().map(Value::Double),
        (ValueKind::Decimal, Json::Number(n)) => parse_decimal(&n.to_string()).map(Value::Decimal),
        (ValueKind::Decimal, Json::String(s)) => parse_decimal(s).map(Value::Decimal),
        (ValueKind::String, Json::String(s)) => Some(Value::String(s.clone())),
        (ValueKind::DateTime, Json::String(s)) => Value::parse_datetime(s).map(Value::DateTime),
        _ => None,
    };

    value.ok_or_else(|| {
        DinoError::invalid_data(format!("expected {} for '{}', found {}", kind, context, json))
    })
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::Long(n) => Json::from(*n),
        Value::Float(n) => serde_json::Number::from_f64(f64::from(*n)).map_or(Json::Null, Json::Number),
        Value::Double(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
        Value::Decimal(n) => Json::String(n.to_string()),
        Value::String(s) => Json::String(s.clone()),
        Value::DateTime(_) => Json::String(value.render()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(
                EntityDef::new("User")
                    .with_table("users")
                    .with_column("Id", ValueKind::Int)
                    .with_column("Name", ValueKind::String)
                    .with_column("CreatedAt", ValueKind::DateTime)
                    .with_many("Orders", "Order"),
            )
            .with_entity(
                EntityDef::new("Order")
                    .with_column("Total", ValueKind::Decimal)
                    .with_one("User", "User"),
            )
    }

    #[test]
    fn test_row_from_json() {
        let schema = schema();
        let user = schema.entity("User").unwrap();
        let row = Row::from_json(
            &schema,
            user,
            &json!({
                "id": 1,
                "NAME": "John",
                "createdAt": "2024-01-15",
                "orders": [{ "total": 99.5 }, { "total": "12.25" }],
                "nickname": "ignored"
            }),
        )
        .unwrap();

        assert_eq!(row.field("Id"), Value::Int(1));
        assert_eq!(row.field("Name"), Value::from("John"));
        assert_eq!(row.field("Missing"), Value::Null);
        assert!(matches!(row.field("CreatedAt"), Value::DateTime(_)));

        let orders = row.related("Orders");
        assert_eq!(orders.len(), 2);
        assert_eq!(
            orders[1].field("Total"),
            Value::Decimal(Decimal::new(1225, 2))
        );
    }

    #[test]
    fn test_row_from_json_type_mismatch() {
        let schema = schema();
        let user = schema.entity("User").unwrap();
        let err = Row::from_json(&schema, user, &json!({ "Id": "one" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid data: expected int for 'User.Id', found \"one\""
        );
    }

    #[test]
    fn test_to_one_relation_from_object() {
        let schema = schema();
        let order = schema.entity("Order").unwrap();
        let row = Row::from_json(&schema, order, &json!({ "User": { "Name": "Jane" } })).unwrap();
        assert_eq!(row.related("User")[0].field("Name"), Value::from("Jane"));
    }

    #[test]
    fn test_row_to_json() {
        let row = Row::new()
            .with("Id", 7)
            .with("Price", Decimal::new(1999, 2))
            .with_related("Items", vec![Row::new().with("Qty", 2)]);
        assert_eq!(
            row.to_json(),
            json!({ "Id": 7, "Price": "19.99", "Items": [{ "Qty": 2 }] })
        );
    }
}
