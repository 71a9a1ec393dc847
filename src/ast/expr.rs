use super::{BinaryOperator, SelectQuery, UnaryOperator, Value, ValueKind};
use serde::{Deserialize, Serialize};

/// Line/column of the token that starts a node.
///
/// Spans never take part in structural equality: two trees that differ only
/// in where they were written compare equal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl PartialEq for Span {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    /// A bare name, a dotted `alias.column`, or `*`.
    Identifier(Identifier),
    Literal(Literal),
    /// An `@name` that was not substituted at parse time.
    Parameter(Parameter),
    FunctionCall(FunctionCall),
    MemberAccess(MemberAccess),
    In(InExpr),
    Between(BetweenExpr),
    Case(CaseExpr),
    Exists(ExistsExpr),
    Subquery(SubqueryExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
    pub kind: ValueKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Includes the leading `@`.
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAccess {
    pub object: Box<Expr>,
    pub member: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InExpr {
    pub expr: Box<Expr>,
    /// Either a list of scalar expressions or a single [`Expr::Subquery`].
    pub values: Vec<Expr>,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetweenExpr {
    pub expr: Box<Expr>,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseExpr {
    /// Subject of a simple `CASE x WHEN ...`; `None` for a searched CASE.
    pub operand: Option<Box<Expr>>,
    pub whens: Vec<WhenClause>,
    pub else_result: Option<Box<Expr>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistsExpr {
    pub subquery: Box<SelectQuery>,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubqueryExpr {
    pub query: Box<SelectQuery>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Identifier(e) => e.span,
            Expr::Literal(e) => e.span,
            Expr::Parameter(e) => e.span,
            Expr::FunctionCall(e) => e.span,
            Expr::MemberAccess(e) => e.span,
            Expr::In(e) => e.span,
            Expr::Between(e) => e.span,
            Expr::Case(e) => e.span,
            Expr::Exists(e) => e.span,
            Expr::Subquery(e) => e.span,
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        let span = left.span();
        Expr::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        })
    }

    pub fn unary(op: UnaryOperator, operand: Expr, span: Span) -> Expr {
        Expr::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Identifier(Identifier {
            name: name.into(),
            span: Span::default(),
        })
    }

    /// A literal tagged with its value's own kind.
    pub fn literal(value: impl Into<Value>) -> Expr {
        let value = value.into();
        Expr::Literal(Literal {
            kind: value.kind(),
            value,
            span: Span::default(),
        })
    }

    /// A dotted name as segments: `u.name` and `MemberAccess(u, name)` both
    /// give `["u", "name"]`. `None` when the chain does not bottom out in an
    /// identifier.
    pub fn name_path(&self) -> Option<Vec<&str>> {
        match self {
            Expr::Identifier(id) => Some(id.name.split('.').collect()),
            Expr::MemberAccess(m) => {
                let mut path = m.object.name_path()?;
                path.push(&m.member);
                Some(path)
            }
            _ => None,
        }
    }

    /// Short node-kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Binary(_) => "binary expression",
            Expr::Unary(_) => "unary expression",
            Expr::Identifier(_) => "identifier",
            Expr::Literal(_) => "literal",
            Expr::Parameter(_) => "parameter",
            Expr::FunctionCall(_) => "function call",
            Expr::MemberAccess(_) => "member access",
            Expr::In(_) => "IN expression",
            Expr::Between(_) => "BETWEEN expression",
            Expr::Case(_) => "CASE expression",
            Expr::Exists(_) => "EXISTS expression",
            Expr::Subquery(_) => "subquery",
        }
    }
}
