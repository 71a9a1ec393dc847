//! Double-dispatch traversal over the AST.
//!
//! [`Visit`] walks a tree for side effects; every method defaults to the
//! matching `walk_*` function, so an implementation overrides only the nodes
//! it cares about. [`Visitor`] computes a value per node and must handle every
//! node kind.

use super::*;

/// Side-effecting traversal.
pub trait Visit {
    fn visit_query(&mut self, node: &SelectQuery) {
        walk_query(self, node);
    }

    fn visit_from(&mut self, node: &FromClause) {
        walk_from(self, node);
    }

    fn visit_join(&mut self, node: &JoinClause) {
        walk_join(self, node);
    }

    fn visit_where(&mut self, node: &WhereClause) {
        self.visit_expr(&node.condition);
    }

    fn visit_group_by(&mut self, node: &GroupByClause) {
        walk_group_by(self, node);
    }

    fn visit_order_by(&mut self, node: &OrderByClause) {
        for item in &node.items {
            self.visit_expr(&item.expr);
        }
    }

    fn visit_expr(&mut self, node: &Expr) {
        node.walk(self);
    }

    fn visit_binary(&mut self, node: &BinaryExpr) {
        self.visit_expr(&node.left);
        self.visit_expr(&node.right);
    }

    fn visit_unary(&mut self, node: &UnaryExpr) {
        self.visit_expr(&node.operand);
    }

    fn visit_identifier(&mut self, _node: &Identifier) {}

    fn visit_literal(&mut self, _node: &Literal) {}

    fn visit_parameter(&mut self, _node: &Parameter) {}

    fn visit_function_call(&mut self, node: &FunctionCall) {
        for arg in &node.args {
            self.visit_expr(arg);
        }
    }

    fn visit_member_access(&mut self, node: &MemberAccess) {
        self.visit_expr(&node.object);
    }

    fn visit_in(&mut self, node: &InExpr) {
        self.visit_expr(&node.expr);
        for value in &node.values {
            self.visit_expr(value);
        }
    }

    fn visit_between(&mut self, node: &BetweenExpr) {
        self.visit_expr(&node.expr);
        self.visit_expr(&node.low);
        self.visit_expr(&node.high);
    }

    fn visit_case(&mut self, node: &CaseExpr) {
        walk_case(self, node);
    }

    fn visit_exists(&mut self, node: &ExistsExpr) {
        self.visit_query(&node.subquery);
    }

    fn visit_subquery(&mut self, node: &SubqueryExpr) {
        self.visit_query(&node.query);
    }
}

pub fn walk_query<V: Visit + ?Sized>(visitor: &mut V, node: &SelectQuery) {
    for item in &node.items {
        visitor.visit_expr(&item.expr);
    }
    if let Some(from) = &node.from {
        visitor.visit_from(from);
    }
    if let Some(where_clause) = &node.where_clause {
        visitor.visit_where(where_clause);
    }
    if let Some(group_by) = &node.group_by {
        visitor.visit_group_by(group_by);
    }
    if let Some(order_by) = &node.order_by {
        visitor.visit_order_by(order_by);
    }
}

pub fn walk_from<V: Visit + ?Sized>(visitor: &mut V, node: &FromClause) {
    for join in &node.joins {
        visitor.visit_join(join);
    }
}

pub fn walk_join<V: Visit + ?Sized>(visitor: &mut V, node: &JoinClause) {
    if let Some(on) = &node.on {
        visitor.visit_expr(on);
    }
}

pub fn walk_group_by<V: Visit + ?Sized>(visitor: &mut V, node: &GroupByClause) {
    for expr in &node.exprs {
        visitor.visit_expr(expr);
    }
    if let Some(having) = &node.having {
        visitor.visit_expr(having);
    }
}

pub fn walk_case<V: Visit + ?Sized>(visitor: &mut V, node: &CaseExpr) {
    if let Some(operand) = &node.operand {
        visitor.visit_expr(operand);
    }
    for when in &node.whens {
        visitor.visit_expr(&when.condition);
        visitor.visit_expr(&when.result);
    }
    if let Some(else_result) = &node.else_result {
        visitor.visit_expr(else_result);
    }
}

/// Value-producing traversal. One method per node kind, no defaults.
pub trait Visitor {
    type Output;

    fn visit_query(&mut self, node: &SelectQuery) -> Self::Output;
    fn visit_from(&mut self, node: &FromClause) -> Self::Output;
    fn visit_join(&mut self, node: &JoinClause) -> Self::Output;
    fn visit_where(&mut self, node: &WhereClause) -> Self::Output;
    fn visit_group_by(&mut self, node: &GroupByClause) -> Self::Output;
    fn visit_order_by(&mut self, node: &OrderByClause) -> Self::Output;

    fn visit_binary(&mut self, node: &BinaryExpr) -> Self::Output;
    fn visit_unary(&mut self, node: &UnaryExpr) -> Self::Output;
    fn visit_identifier(&mut self, node: &Identifier) -> Self::Output;
    fn visit_literal(&mut self, node: &Literal) -> Self::Output;
    fn visit_parameter(&mut self, node: &Parameter) -> Self::Output;
    fn visit_function_call(&mut self, node: &FunctionCall) -> Self::Output;
    fn visit_member_access(&mut self, node: &MemberAccess) -> Self::Output;
    fn visit_in(&mut self, node: &InExpr) -> Self::Output;
    fn visit_between(&mut self, node: &BetweenExpr) -> Self::Output;
    fn visit_case(&mut self, node: &CaseExpr) -> Self::Output;
    fn visit_exists(&mut self, node: &ExistsExpr) -> Self::Output;
    fn visit_subquery(&mut self, node: &SubqueryExpr) -> Self::Output;
}

impl Expr {
    /// Dispatch to the [`Visitor`] method for this node's kind.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Binary(node) => visitor.visit_binary(node),
            Expr::Unary(node) => visitor.visit_unary(node),
            Expr::Identifier(node) => visitor.visit_identifier(node),
            Expr::Literal(node) => visitor.visit_literal(node),
            Expr::Parameter(node) => visitor.visit_parameter(node),
            Expr::FunctionCall(node) => visitor.visit_function_call(node),
            Expr::MemberAccess(node) => visitor.visit_member_access(node),
            Expr::In(node) => visitor.visit_in(node),
            Expr::Between(node) => visitor.visit_between(node),
            Expr::Case(node) => visitor.visit_case(node),
            Expr::Exists(node) => visitor.visit_exists(node),
            Expr::Subquery(node) => visitor.visit_subquery(node),
        }
    }

    /// Dispatch to the [`Visit`] method for this node's kind.
    pub fn walk<V: Visit + ?Sized>(&self, visitor: &mut V) {
        match self {
            Expr::Binary(node) => visitor.visit_binary(node),
            Expr::Unary(node) => visitor.visit_unary(node),
            Expr::Identifier(node) => visitor.visit_identifier(node),
            Expr::Literal(node) => visitor.visit_literal(node),
            Expr::Parameter(node) => visitor.visit_parameter(node),
            Expr::FunctionCall(node) => visitor.visit_function_call(node),
            Expr::MemberAccess(node) => visitor.visit_member_access(node),
            Expr::In(node) => visitor.visit_in(node),
            Expr::Between(node) => visitor.visit_between(node),
            Expr::Case(node) => visitor.visit_case(node),
            Expr::Exists(node) => visitor.visit_exists(node),
            Expr::Subquery(node) => visitor.visit_subquery(node),
        }
    }
}

impl SelectQuery {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_query(self)
    }

    /// Names (with `@`) of parameters left unbound, in order of appearance.
    pub fn parameters(&self) -> Vec<String> {
        let mut collector = ParameterCollector::default();
        collector.visit_query(self);
        collector.names
    }
}

impl FromClause {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_from(self)
    }
}

impl JoinClause {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_join(self)
    }
}

impl WhereClause {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_where(self)
    }
}

impl GroupByClause {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_group_by(self)
    }
}

impl OrderByClause {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_order_by(self)
    }
}

#[derive(Default)]
struct ParameterCollector {
    names: Vec<String>,
}

impl Visit for ParameterCollector {
    fn visit_parameter(&mut self, node: &Parameter) {
        if !self.names.contains(&node.name) {
            self.names.push(node.name.clone());
        }
    }
}
