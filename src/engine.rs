//! In-memory execution engine for Dino.
//!
//! A [`Catalog`] holds a schema and the rows of each entity, and runs
//! queries against them: table resolution, filtering with a compiled
//! predicate, sorting, DISTINCT and paging.

use crate::ast::{SelectQuery, SortOrder, Value};
use crate::error::{DinoError, DinoResult, LowerError};
use crate::lower::{EntityCompiler, JoinCompiler, OrderPlan, Predicate};
use crate::parser::{self, Parameters};
use crate::record::Row;
use crate::schema::{EntityDef, Schema, did_you_mean};
use crate::transpiler::ToSql;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Rows of every entity of a schema.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schema: Schema,
    tables: HashMap<String, Vec<Row>>,
}

impl Catalog {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            tables: HashMap::new(),
        }
    }

    /// Build a catalog from a JSON document `{ "<table>": [ {row}, ... ] }`.
    pub fn from_json(schema: Schema, json: &serde_json::Value) -> DinoResult<Self> {
        let mut catalog = Self::new(schema);
        catalog.load_json(json)?;
        Ok(catalog)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Add a row. `entity` is an entity or table name.
    pub fn insert(&mut self, entity: &str, row: Row) -> DinoResult<()> {
        let name = self.resolve_entity(entity)?.name.clone();
        self.tables.entry(name).or_default().push(row);
        Ok(())
    }

    /// Rows stored for an entity or table name.
    pub fn rows(&self, entity: &str) -> &[Row] {
        self.resolve_entity(entity)
            .ok()
            .and_then(|def| self.tables.get(&def.name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Load a JSON document of tables. Returns the number of rows added.
    pub fn load_json(&mut self, json: &serde_json::Value) -> DinoResult<usize> {
        let tables = json
            .as_object()
            .ok_or_else(|| DinoError::invalid_data("expected an object of tables"))?;

        let mut loaded = 0;
        for (table, rows) in tables {
            let entity = self.resolve_entity(table)?.clone();
            let items = rows.as_array().ok_or_else(|| {
                DinoError::invalid_data(format!("expected an array of rows for '{}'", table))
            })?;
            for item in items {
                let row = Row::from_json(&self.schema, &entity, item)?;
                self.tables.entry(entity.name.clone()).or_default().push(row);
                loaded += 1;
            }
            tracing::debug!(table = %table, entity = %entity.name, rows = items.len(), "loaded table");
        }
        Ok(loaded)
    }

    /// Start a query; bind parameters before fetching.
    ///
    /// ```rust,ignore
    /// let adults = catalog
    ///     .query("SELECT * FROM users WHERE Age >= @min")
    ///     .bind("min", 18)
    ///     .fetch_all()?;
    /// ```
    pub fn query(&self, text: &str) -> DinoQuery<'_> {
        DinoQuery {
            catalog: self,
            text: text.to_string(),
            params: Parameters::new(),
        }
    }

    pub fn execute(&self, text: &str) -> DinoResult<ResultSet> {
        self.run(&parser::parse(text)?)
    }

    pub fn execute_with_params(&self, text: &str, params: &Parameters) -> DinoResult<ResultSet> {
        self.run(&parser::parse_with_params(text, params)?)
    }

    /// Execute an already parsed query.
    pub fn run(&self, query: &SelectQuery) -> DinoResult<ResultSet> {
        let plan = self.plan(query)?;
        self.execute_plan(&plan)
    }

    /// Resolve the table and compile the filter and sort keys.
    ///
    /// Queries with joins go through [`JoinCompiler`]; a compile failure
    /// there is reported, never retried with the single-entity compiler.
    pub fn plan(&self, query: &SelectQuery) -> DinoResult<Plan> {
        let from = query.from.as_ref().ok_or(DinoError::MissingFrom)?;
        if query.group_by.is_some() {
            return Err(LowerError::unsupported("GROUP BY").into());
        }

        let entity = self.schema.entity_for_table(&from.table.name).ok_or_else(|| {
            DinoError::UnknownTable {
                table: from.table.name.clone(),
                suggestion: did_you_mean(&from.table.name, self.schema.table_names()),
            }
        })?;

        let (predicate, order) = if from.has_joins() {
            let compiler = JoinCompiler::new(&self.schema, &entity.name, from)?;
            let predicate = query
                .where_clause
                .as_ref()
                .map(|w| compiler.compile_predicate(w))
                .transpose()?;
            let order = query
                .order_by
                .as_ref()
                .map(|o| compiler.compile_order_by(o))
                .unwrap_or_default();
            (predicate, order)
        } else {
            let compiler = EntityCompiler::new(&self.schema, &entity.name)?.with_table(&from.table);
            let predicate = query
                .where_clause
                .as_ref()
                .map(|w| compiler.compile_predicate(w))
                .transpose()?;
            let order = query
                .order_by
                .as_ref()
                .map(|o| compiler.compile_order_by(o))
                .transpose()?
                .unwrap_or_default();
            (predicate, order)
        };

        for (expr, err) in &order.dropped {
            tracing::warn!(key = %expr.to_sql(), error = %err, "ORDER BY key dropped");
        }

        Ok(Plan {
            entity: entity.name.clone(),
            predicate,
            order,
            distinct: query.distinct,
            offset: query.offset,
            limit: query.limit,
        })
    }

    pub fn execute_plan(&self, plan: &Plan) -> DinoResult<ResultSet> {
        let stored = self
            .tables
            .get(&plan.entity)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut matched: Vec<&Row> = Vec::new();
        for row in stored {
            let keep = match &plan.predicate {
                Some(predicate) => predicate.evaluate(row)?,
                None => true,
            };
            if keep {
                matched.push(row);
            }
        }

        if !plan.order.keys.is_empty() {
            let mut keyed = Vec::with_capacity(matched.len());
            for row in matched {
                keyed.push((sort_keys(&plan.order, row)?, row));
            }
            // sort_by is stable, so equal keys keep insertion order
            keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &plan.order));
            matched = keyed.into_iter().map(|(_, row)| row).collect();
        }

        let mut rows: Vec<Row> = Vec::with_capacity(matched.len());
        for row in matched {
            if plan.distinct && rows.contains(row) {
                continue;
            }
            rows.push(row.clone());
        }

        let offset = plan.offset.map_or(0, |n| n as usize);
        let limit = plan.limit.map_or(usize::MAX, |n| n as usize);
        let rows: Vec<Row> = rows.into_iter().skip(offset).take(limit).collect();

        tracing::info!(entity = %plan.entity, scanned = stored.len(), returned = rows.len(), "query executed");

        Ok(ResultSet {
            entity: plan.entity.clone(),
            rows,
            dropped: plan
                .order
                .dropped
                .iter()
                .map(|(expr, _)| expr.to_sql())
                .collect(),
        })
    }

    fn resolve_entity(&self, name: &str) -> DinoResult<&EntityDef> {
        self.schema
            .entity(name)
            .or_else(|| self.schema.entity_for_table(name))
            .ok_or_else(|| DinoError::UnknownTable {
                table: name.to_string(),
                suggestion: did_you_mean(name, self.schema.table_names()),
            })
    }
}

fn sort_keys(order: &OrderPlan, row: &Row) -> DinoResult<Vec<Value>> {
    let mut keys = Vec::with_capacity(order.keys.len());
    for (key, _) in &order.keys {
        keys.push(key.extract(row)?);
    }
    Ok(keys)
}

fn compare_keys(a: &[Value], b: &[Value], order: &OrderPlan) -> Ordering {
    for ((x, y), (_, direction)) in a.iter().zip(b).zip(&order.keys) {
        let ordering = match direction {
            SortOrder::Ascending => x.sort_cmp(y),
            SortOrder::Descending => y.sort_cmp(x),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// A query with bound parameters, ready to run against a catalog.
pub struct DinoQuery<'c> {
    catalog: &'c Catalog,
    text: String,
    params: Parameters,
}

impl DinoQuery<'_> {
    /// Bind `@name`. The leading `@` is optional.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        let key = name.strip_prefix('@').unwrap_or(name);
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn parse(&self) -> DinoResult<SelectQuery> {
        parser::parse_with_params(&self.text, &self.params)
    }

    pub fn plan(&self) -> DinoResult<Plan> {
        self.catalog.plan(&self.parse()?)
    }

    pub fn fetch_all(&self) -> DinoResult<ResultSet> {
        self.catalog.run(&self.parse()?)
    }

    pub fn fetch_one(&self) -> DinoResult<Option<Row>> {
        Ok(self.fetch_all()?.rows.into_iter().next())
    }

    /// Number of rows the query returns, after DISTINCT and paging.
    pub fn count(&self) -> DinoResult<usize> {
        Ok(self.fetch_all()?.len())
    }

    /// True when the query returns at least one row.
    pub fn exists(&self) -> DinoResult<bool> {
        let mut plan = self.plan()?;
        plan.limit = Some(plan.limit.map_or(1, |n| n.min(1)));
        Ok(!self.catalog.execute_plan(&plan)?.is_empty())
    }
}

/// A compiled query.
#[derive(Debug, Clone)]
pub struct Plan {
    pub entity: String,
    pub predicate: Option<Predicate>,
    pub order: OrderPlan,
    pub distinct: bool,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "entity:   {}", self.entity)?;
        match &self.predicate {
            Some(predicate) => writeln!(f, "filter:   {}", predicate)?,
            None => writeln!(f, "filter:   (none)")?,
        }
        for (key, order) in &self.order.keys {
            writeln!(f, "order:    {} {}", key, order)?;
        }
        for (expr, err) in &self.order.dropped {
            writeln!(f, "dropped:  {} ({})", expr.to_sql(), err)?;
        }
        if self.distinct {
            writeln!(f, "distinct: true")?;
        }
        if let Some(n) = self.offset {
            writeln!(f, "offset:   {}", n)?;
        }
        if let Some(n) = self.limit {
            writeln!(f, "limit:    {}", n)?;
        }
        Ok(())
    }
}

/// Rows returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub entity: String,
    pub rows: Vec<Row>,
    /// ORDER BY keys that were left out, as query text.
    pub dropped: Vec<String>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(Row::to_json).collect())
    }
}
