use crate::ast::{BinaryOperator, Value, ValueKind};
use std::fmt;

/// A lowered expression: a node plus the static kind it evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowered {
    pub kind: ValueKind,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant(Value),
    Field(Field),
    /// Numeric widening of the inner expression to the outer kind.
    Convert(Box<Lowered>),
    Not(Box<Lowered>),
    Negate(Box<Lowered>),
    And(Box<Lowered>, Box<Lowered>),
    Or(Box<Lowered>, Box<Lowered>),
    Compare(Comparison, Box<Lowered>, Box<Lowered>),
    Arithmetic(Arithmetic, Box<Lowered>, Box<Lowered>),
    Concat(Box<Lowered>, Box<Lowered>),
    Text(TextTest, Box<Lowered>, Box<Lowered>),
    Upper(Box<Lowered>),
    Lower(Box<Lowered>),
    Length(Box<Lowered>),
    InList(Box<Lowered>, Vec<Lowered>),
    /// True when some element of a related collection satisfies the predicate.
    Any(Existential),
    /// A column of a to-many relation. Only valid as a comparison operand;
    /// the join compiler rewrites it into [`Node::Any`].
    Collection(CollectionRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub source: Source,
    pub column: String,
}

/// Where a field is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Root,
    /// Through a chain of to-one relations of the root.
    Related(Vec<String>),
    /// The element bound by the enclosing [`Node::Any`].
    Element,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Existential {
    /// Relation chain from the root; the last relation is the to-many one.
    pub relation: Vec<String>,
    pub predicate: Box<Lowered>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRef {
    pub relation: Vec<String>,
    pub column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn from_operator(op: BinaryOperator) -> Option<Self> {
        match op {
            BinaryOperator::Equal => Some(Comparison::Eq),
            BinaryOperator::NotEqual => Some(Comparison::Ne),
            BinaryOperator::GreaterThan => Some(Comparison::Gt),
            BinaryOperator::GreaterThanOrEqual => Some(Comparison::Ge),
            BinaryOperator::LessThan => Some(Comparison::Lt),
            BinaryOperator::LessThanOrEqual => Some(Comparison::Le),
            _ => None,
        }
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparison::Eq | Comparison::Ne)
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Arithmetic {
    pub fn from_operator(op: BinaryOperator) -> Option<Self> {
        match op {
            BinaryOperator::Add => Some(Arithmetic::Add),
            BinaryOperator::Subtract => Some(Arithmetic::Sub),
            BinaryOperator::Multiply => Some(Arithmetic::Mul),
            BinaryOperator::Divide => Some(Arithmetic::Div),
            BinaryOperator::Modulo => Some(Arithmetic::Rem),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Arithmetic::Add => "+",
            Arithmetic::Sub => "-",
            Arithmetic::Mul => "*",
            Arithmetic::Div => "/",
            Arithmetic::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTest {
    Contains,
    StartsWith,
    EndsWith,
}

impl Lowered {
    pub fn new(kind: ValueKind, node: Node) -> Self {
        Self { kind, node }
    }

    pub fn constant(value: Value) -> Self {
        Self {
            kind: value.kind(),
            node: Node::Constant(value),
        }
    }

    pub fn field(source: Source, column: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            kind,
            node: Node::Field(Field {
                source,
                column: column.into(),
            }),
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match &self.node {
            Node::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// A NULL constant with no kind yet.
    pub fn is_untyped_null(&self) -> bool {
        self.kind == ValueKind::Untyped && matches!(self.node, Node::Constant(Value::Null))
    }

    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match &self.node {
            Node::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn boxed(self) -> Box<Lowered> {
        Box::new(self)
    }
}

impl fmt::Display for Lowered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Constant(value) => write!(f, "{}", value),
            Node::Field(field) => write!(f, "{}", field),
            Node::Convert(inner) => write!(f, "{}({})", self.kind, inner),
            Node::Not(inner) => write!(f, "NOT {}", inner),
            Node::Negate(inner) => write!(f, "-{}", inner),
            Node::And(l, r) => write!(f, "({} AND {})", l, r),
            Node::Or(l, r) => write!(f, "({} OR {})", l, r),
            Node::Compare(op, l, r) => write!(f, "({} {} {})", l, op.symbol(), r),
            Node::Arithmetic(op, l, r) => write!(f, "({} {} {})", l, op.symbol(), r),
            Node::Concat(l, r) => write!(f, "({} || {})", l, r),
            Node::Text(test, target, arg) => {
                let name = match test {
                    TextTest::Contains => "contains",
                    TextTest::StartsWith => "starts_with",
                    TextTest::EndsWith => "ends_with",
                };
                write!(f, "{}({}, {})", name, target, arg)
            }
            Node::Upper(inner) => write!(f, "upper({})", inner),
            Node::Lower(inner) => write!(f, "lower({})", inner),
            Node::Length(inner) => write!(f, "length({})", inner),
            Node::InList(expr, items) => {
                let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "({} IN ({}))", expr, items.join(", "))
            }
            Node::Any(any) => write!(
                f,
                "any({}, item => {})",
                any.relation.join("."),
                any.predicate
            ),
            Node::Collection(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Root => write!(f, "{}", self.column),
            Source::Related(path) => write!(f, "{}.{}", path.join("."), self.column),
            Source::Element => write!(f, "item.{}", self.column),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[].{}", self.relation.join("."), self.column)
    }
}
