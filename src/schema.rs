//! Schema descriptor supplied by the host.
//!
//! Describes entities, their typed columns and their relationships. The
//! compilers resolve every name against this descriptor; nothing is
//! discovered at runtime.
//!
//! ```toml
//! [[entities]]
//! name = "User"
//! table = "users"
//! columns = [{ name = "Id", kind = "int" }, { name = "Name", kind = "string" }]
//! relations = [{ name = "Orders", target = "Order", many = true }]
//! ```

use crate::ast::ValueKind;
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use strsim::levenshtein;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: Vec<EntityDef>,
    /// Allow plural/singular name matching when resolving tables and joins.
    #[serde(default = "default_conventions")]
    pub conventions: bool,
}

fn default_conventions() -> bool {
    true
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    /// Table name used in FROM; defaults to the entity name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    pub name: String,
    /// Name of the related entity.
    pub target: String,
    /// To-many when true, to-one otherwise.
    #[serde(default)]
    pub many: bool,
    /// Table name that selects this relation in a JOIN.
    #[serde(default)]
    pub table: Option<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            conventions: true,
        }
    }

    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_conventions(mut self, enabled: bool) -> Self {
        self.conventions = enabled;
        self
    }

    /// Look up an entity by name, ignoring case.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a FROM table name: declared table, then entity name, then
    /// (with conventions) a plural or singular form of either.
    pub fn entity_for_table(&self, table: &str) -> Option<&EntityDef> {
        let exact = self
            .entities
            .iter()
            .find(|e| e.table_name().eq_ignore_ascii_case(table))
            .or_else(|| self.entity(table));
        if exact.is_some() || !self.conventions {
            return exact;
        }
        self.entities
            .iter()
            .find(|e| same_by_convention(e.table_name(), table) || same_by_convention(&e.name, table))
    }

    /// Every name a FROM clause may use, for suggestions.
    pub fn table_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.table_name()).collect()
    }

    /// Find the relationship of `entity` that a JOIN on `table` refers to.
    ///
    /// Declared `table` and exact relation name win. With conventions on,
    /// `name == table + "s"`, `name == table` without trailing `s`, and the
    /// relation whose target entity answers to `table` are tried next.
    pub fn relation_for_join<'s>(&'s self, entity: &'s EntityDef, table: &str) -> Option<&'s RelationDef> {
        let declared = entity.relations.iter().find(|r| {
            r.table
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(table))
        });
        if let Some(relation) = declared.or_else(|| entity.relation(table)) {
            return Some(relation);
        }
        if !self.conventions {
            return None;
        }

        let plural = format!("{}s", table);
        let singular = table.trim_end_matches(['s', 'S']);
        let by_name = entity.relations.iter().find(|r| {
            r.name.eq_ignore_ascii_case(&plural) || r.name.eq_ignore_ascii_case(singular)
        });
        if by_name.is_some() {
            return by_name;
        }

        let target = self.entity_for_table(table)?;
        entity
            .relations
            .iter()
            .find(|r| r.target.eq_ignore_ascii_case(&target.name))
    }

    /// Check that every relation points at a defined entity.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for entity in &self.entities {
            for relation in &entity.relations {
                if self.entity(&relation.target).is_none() {
                    return Err(SchemaError::UnknownTarget {
                        entity: entity.name.clone(),
                        relation: relation.name.clone(),
                        target: relation.target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn same_by_convention(name: &str, table: &str) -> bool {
    let name = name.to_lowercase();
    let table = table.to_lowercase();
    name == format!("{}s", table) || table == format!("{}s", name)
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            kind,
        });
        self
    }

    /// Add a to-one relationship.
    pub fn with_one(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relations.push(RelationDef {
            name: name.into(),
            target: target.into(),
            many: false,
            table: None,
        });
        self
    }

    /// Add a to-many relationship.
    pub fn with_many(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relations.push(RelationDef {
            name: name.into(),
            target: target.into(),
            many: true,
            table: None,
        });
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Closest column name, for "did you mean" hints.
    pub fn suggest_column(&self, name: &str) -> Option<String> {
        did_you_mean(name, self.columns.iter().map(|c| c.name.as_str()))
    }
}

/// Find the best match with Levenshtein distance within threshold.
pub fn did_you_mean<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let input = input.to_lowercase();
    let mut best_match = None;
    let mut min_dist = usize::MAX;

    // Dynamic threshold based on length
    let threshold = match input.len() {
        0..=2 => 0,
        3..=5 => 2,
        _ => 3,
    };

    for cand in candidates {
        let dist = levenshtein(&input, &cand.to_lowercase());
        if dist <= threshold && dist < min_dist {
            min_dist = dist;
            best_match = Some(cand.to_string());
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> Schema {
        Schema::new()
            .with_entity(
                EntityDef::new("User")
                    .with_table("users")
                    .with_column("Id", ValueKind::Int)
                    .with_column("Name", ValueKind::String)
                    .with_many("Orders", "Order"),
            )
            .with_entity(
                EntityDef::new("Order")
                    .with_table("orders")
                    .with_column("TotalAmount", ValueKind::Decimal)
                    .with_one("User", "User")
                    .with_many("Items", "OrderItem"),
            )
            .with_entity(EntityDef::new("OrderItem").with_table("order_items"))
    }

    #[test]
    fn test_entity_lookup() {
        let schema = shop();
        assert_eq!(schema.entity_for_table("USERS").unwrap().name, "User");
        assert_eq!(schema.entity_for_table("user").unwrap().name, "User");
        assert!(schema.entity_for_table("widgets").is_none());
        assert_eq!(schema.entity("order").unwrap().table_name(), "orders");
    }

    #[test]
    fn test_entity_lookup_without_conventions() {
        let schema = shop().with_conventions(false);
        assert_eq!(schema.entity_for_table("user").unwrap().name, "User");
        assert!(schema.entity_for_table("OrderItems").is_none());
    }

    #[test]
    fn test_relation_for_join() {
        let schema = shop();
        let user = schema.entity("User").unwrap();
        assert_eq!(schema.relation_for_join(user, "orders").unwrap().name, "Orders");
        assert_eq!(schema.relation_for_join(user, "order").unwrap().name, "Orders");
        assert!(schema.relation_for_join(user, "products").is_none());

        let order = schema.entity("Order").unwrap();
        assert_eq!(schema.relation_for_join(order, "users").unwrap().name, "User");
        // resolved through the target entity's table name
        assert_eq!(schema.relation_for_join(order, "order_items").unwrap().name, "Items");
    }

    #[test]
    fn test_relation_declared_table_wins() {
        let mut customer = EntityDef::new("Customer").with_many("Purchases", "Order");
        customer.relations[0].table = Some("orders".to_string());
        let schema = shop().with_entity(customer).with_conventions(false);
        let customer = schema.entity("Customer").unwrap();
        assert_eq!(schema.relation_for_join(customer, "orders").unwrap().name, "Purchases");
    }

    #[test]
    fn test_column_suggestion() {
        let schema = shop();
        let user = schema.entity("User").unwrap();
        assert_eq!(user.column("name").unwrap().kind, ValueKind::String);
        assert_eq!(user.suggest_column("nmae"), Some("Name".to_string()));
        assert_eq!(user.suggest_column("zzzzzzzz"), None);
    }

    #[test]
    fn test_schema_from_toml() {
        let schema: Schema = toml::from_str(
            r#"
            conventions = false

            [[entities]]
            name = "Product"
            table = "products"
            columns = [
                { name = "Id", kind = "int" },
                { name = "Price", kind = "decimal" },
                { name = "CreatedAt", kind = "datetime" },
            ]
            "#,
        )
        .unwrap();
        assert!(!schema.conventions);
        let product = schema.entity("product").unwrap();
        assert_eq!(product.column("createdat").unwrap().kind, ValueKind::DateTime);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_target() {
        let schema = Schema::new().with_entity(EntityDef::new("A").with_one("b", "B"));
        let err = schema.validate().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTarget {
                entity: "A".to_string(),
                relation: "b".to_string(),
                target: "B".to_string(),
            }
        );
        assert_eq!(err.to_string(), "relation 'A.b' targets unknown entity 'B'");
    }
}
