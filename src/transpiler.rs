//! Re-serializer for the Dino AST.
//!
//! Turns a parsed query back into Dino text. Every binary expression is
//! parenthesized, so the output re-parses to the same tree regardless of
//! operator precedence.

use crate::ast::*;

/// Trait for converting AST nodes back to query text.
pub trait ToSql {
    fn to_sql(&self) -> String;
}

impl ToSql for SelectQuery {
    fn to_sql(&self) -> String {
        self.accept(&mut SqlWriter)
    }
}

impl ToSql for Expr {
    fn to_sql(&self) -> String {
        self.accept(&mut SqlWriter)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::String(s) => quote(s),
            Value::DateTime(dt) => quote(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            other => other.to_string(),
        }
    }
}

/// Single-quote a string, escaping embedded quotes with a backslash.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "\\'"))
}

/// [`Visitor`] that renders each node as Dino text.
pub struct SqlWriter;

impl SqlWriter {
    fn list(&mut self, exprs: &[Expr]) -> String {
        exprs
            .iter()
            .map(|e| e.accept(self))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn table(source: &TableSource) -> String {
        match &source.alias {
            Some(alias) => format!("{} AS {}", source.name, alias),
            None => source.name.clone(),
        }
    }
}

impl Visitor for SqlWriter {
    type Output = String;

    fn visit_query(&mut self, node: &SelectQuery) -> String {
        let mut sql = String::from("SELECT ");
        if node.distinct {
            sql.push_str("DISTINCT ");
        }

        let items: Vec<String> = node
            .items
            .iter()
            .map(|item| match &item.alias {
                Some(alias) => format!("{} AS {}", item.expr.accept(self), alias),
                None => item.expr.accept(self),
            })
            .collect();
        sql.push_str(&items.join(", "));

        if let Some(from) = &node.from {
            sql.push(' ');
            sql.push_str(&from.accept(self));
        }
        if let Some(where_clause) = &node.where_clause {
            sql.push(' ');
            sql.push_str(&where_clause.accept(self));
        }
        if let Some(group_by) = &node.group_by {
            sql.push(' ');
            sql.push_str(&group_by.accept(self));
        }
        if let Some(order_by) = &node.order_by {
            sql.push(' ');
            sql.push_str(&order_by.accept(self));
        }
        if let Some(n) = node.limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(n) = node.offset {
            sql.push_str(&format!(" OFFSET {}", n));
        }
        sql
    }

    fn visit_from(&mut self, node: &FromClause) -> String {
        let mut sql = format!("FROM {}", Self::table(&node.table));
        for join in &node.joins {
            sql.push(' ');
            sql.push_str(&join.accept(self));
        }
        sql
    }

    fn visit_join(&mut self, node: &JoinClause) -> String {
        let mut sql = format!("{} JOIN {}", node.kind, Self::table(&node.table));
        if let Some(on) = &node.on {
            sql.push_str(" ON ");
            sql.push_str(&on.accept(self));
        }
        sql
    }

    fn visit_where(&mut self, node: &WhereClause) -> String {
        format!("WHERE {}", node.condition.accept(self))
    }

    fn visit_group_by(&mut self, node: &GroupByClause) -> String {
        let mut sql = format!("GROUP BY {}", self.list(&node.exprs));
        if let Some(having) = &node.having {
            sql.push_str(" HAVING ");
            sql.push_str(&having.accept(self));
        }
        sql
    }

    fn visit_order_by(&mut self, node: &OrderByClause) -> String {
        let items: Vec<String> = node
            .items
            .iter()
            .map(|item| format!("{} {}", item.expr.accept(self), item.order))
            .collect();
        format!("ORDER BY {}", items.join(", "))
    }

    fn visit_binary(&mut self, node: &BinaryExpr) -> String {
        format!(
            "({} {} {})",
            node.left.accept(self),
            node.op,
            node.right.accept(self)
        )
    }

    fn visit_unary(&mut self, node: &UnaryExpr) -> String {
        let operand = node.operand.accept(self);
        match node.op {
            // `NOT EXISTS` would read back as a negated EXISTS node
            UnaryOperator::Not if matches!(*node.operand, Expr::Exists(_)) => {
                format!("(NOT ({}))", operand)
            }
            UnaryOperator::Not => format!("(NOT {})", operand),
            UnaryOperator::Minus => format!("(-{})", operand),
            UnaryOperator::Plus => format!("(+{})", operand),
            UnaryOperator::IsNull => format!("({} IS NULL)", operand),
            UnaryOperator::IsNotNull => format!("({} IS NOT NULL)", operand),
        }
    }

    fn visit_identifier(&mut self, node: &Identifier) -> String {
        node.name.clone()
    }

    fn visit_literal(&mut self, node: &Literal) -> String {
        node.value.to_sql()
    }

    fn visit_parameter(&mut self, node: &Parameter) -> String {
        node.name.clone()
    }

    fn visit_function_call(&mut self, node: &FunctionCall) -> String {
        format!("{}({})", node.name, self.list(&node.args))
    }

    fn visit_member_access(&mut self, node: &MemberAccess) -> String {
        format!("{}.{}", node.object.accept(self), node.member)
    }

    fn visit_in(&mut self, node: &InExpr) -> String {
        let values = match node.values.as_slice() {
            [Expr::Subquery(sub)] => sub.query.accept(self),
            values => self.list(values),
        };
        let not = if node.negated { "NOT " } else { "" };
        format!("({} {}IN ({}))", node.expr.accept(self), not, values)
    }

    fn visit_between(&mut self, node: &BetweenExpr) -> String {
        let not = if node.negated { "NOT " } else { "" };
        format!(
            "({} {}BETWEEN {} AND {})",
            node.expr.accept(self),
            not,
            node.low.accept(self),
            node.high.accept(self)
        )
    }

    fn visit_case(&mut self, node: &CaseExpr) -> String {
        let mut sql = String::from("CASE");
        if let Some(operand) = &node.operand {
            sql.push(' ');
            sql.push_str(&operand.accept(self));
        }
        for when in &node.whens {
            sql.push_str(&format!(
                " WHEN {} THEN {}",
                when.condition.accept(self),
                when.result.accept(self)
            ));
        }
        if let Some(else_result) = &node.else_result {
            sql.push_str(" ELSE ");
            sql.push_str(&else_result.accept(self));
        }
        sql.push_str(" END");
        sql
    }

    fn visit_exists(&mut self, node: &ExistsExpr) -> String {
        let not = if node.negated { "NOT " } else { "" };
        format!("{}EXISTS ({})", not, node.subquery.accept(self))
    }

    fn visit_subquery(&mut self, node: &SubqueryExpr) -> String {
        format!("({})", node.query.accept(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(query: &str) -> String {
        parse(query).unwrap().to_sql()
    }

    #[test]
    fn test_select_to_sql() {
        assert_eq!(
            roundtrip("select name n from users u where age > 18 order by name limit 5"),
            "SELECT name AS n FROM users AS u WHERE (age > 18) ORDER BY name ASC LIMIT 5"
        );
    }

    #[test]
    fn test_joins_to_sql() {
        assert_eq!(
            roundtrip("SELECT * FROM users u LEFT OUTER JOIN orders o ON u.id = o.user_id CROSS JOIN p"),
            "SELECT * FROM users AS u LEFT JOIN orders AS o ON (u.id = o.user_id) CROSS JOIN p"
        );
    }

    #[test]
    fn test_predicates_to_sql() {
        assert_eq!(
            roundtrip(
                "SELECT * FROM t WHERE a NOT IN (1, 2) AND b BETWEEN 1 AND 2 \
                 OR c IS NOT NULL AND NOT d LIKE 'x%'"
            ),
            "SELECT * FROM t WHERE (((a NOT IN (1, 2)) AND (b BETWEEN 1 AND 2)) \
             OR ((c IS NOT NULL) AND (NOT (d LIKE 'x%'))))"
        );
    }

    #[test]
    fn test_not_around_exists_keeps_parentheses() {
        assert_eq!(
            roundtrip("SELECT * FROM t WHERE NOT (EXISTS (SELECT * FROM u))"),
            "SELECT * FROM t WHERE (NOT (EXISTS (SELECT * FROM u)))"
        );
        assert_eq!(
            roundtrip("SELECT * FROM t WHERE NOT EXISTS (SELECT * FROM u)"),
            "SELECT * FROM t WHERE NOT EXISTS (SELECT * FROM u)"
        );
    }

    #[test]
    fn test_sign_is_parenthesized() {
        assert_eq!(roundtrip("SELECT (-a).b, -price, +1 FROM t"), "SELECT (-a).b, (-price), (+1) FROM t");
    }

    #[test]
    fn test_string_quotes_escaped() {
        let expr = Expr::literal("it's");
        assert_eq!(expr.to_sql(), r"'it\'s'");
    }

    #[test]
    fn test_case_and_exists_to_sql() {
        assert_eq!(
            roundtrip(
                "SELECT CASE WHEN x > 1 THEN 'big' ELSE 'small' END FROM t \
                 WHERE NOT EXISTS (SELECT * FROM u)"
            ),
            "SELECT CASE WHEN (x > 1) THEN 'big' ELSE 'small' END FROM t \
             WHERE NOT EXISTS (SELECT * FROM u)"
        );
    }
}
