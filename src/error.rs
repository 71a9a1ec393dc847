//! Error types for Dino.
//!
//! The three compile-time failure kinds (lexing, parsing, lowering) stay
//! distinct types. [`DinoError`] wraps them for callers that drive the
//! whole pipeline, next to the failures of the reference host.

use crate::ast::ValueKind;
use crate::parser::tokens::Token;
use thiserror::Error;

/// A tokenizer failure with position context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lex error at line {line}, column {column}: {message}")]
pub struct LexError {
    pub message: String,
    /// Absolute character offset into `input`.
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub input: String,
}

impl LexError {
    pub fn new(
        message: impl Into<String>,
        position: usize,
        line: usize,
        column: usize,
        input: &str,
    ) -> Self {
        Self {
            message: message.into(),
            position,
            line,
            column,
            input: input.to_string(),
        }
    }

    /// Render the offending source line with a caret under the error column.
    pub fn snippet(&self) -> String {
        render_snippet(&self.input, self.line, self.column)
    }
}

/// A grammar failure: the token the parser choked on plus the query text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub token: Token,
    pub query: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, token: Token, query: &str) -> Self {
        Self {
            message: message.into(),
            token,
            query: query.to_string(),
        }
    }

    pub fn snippet(&self) -> String {
        render_snippet(&self.query, self.token.line, self.token.column)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Syntax error at line {}, column {}: {}",
            self.token.line, self.token.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

fn render_snippet(input: &str, line: usize, column: usize) -> String {
    let text = input.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let pad = " ".repeat(column.saturating_sub(1));
    format!("{}\n{}^", text, pad)
}

/// Failures raised while lowering an AST into a predicate or sort key.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LowerError {
    #[error("Entity '{0}' is not defined in the schema")]
    EntityNotFound(String),

    #[error("Attribute '{name}' not found on entity '{entity}'.{}", did_you_mean(.suggestion))]
    AttributeNotFound {
        entity: String,
        name: String,
        suggestion: Option<String>,
    },

    #[error("Table or alias '{0}' not found in query")]
    AliasNotFound(String),

    #[error("'{name}' is a relationship of '{entity}', not a column")]
    NotAColumn { entity: String, name: String },

    #[error("{0} is not supported")]
    Unsupported(String),

    #[error("Function '{0}' is not supported")]
    FunctionNotSupported(String),

    #[error("Function '{function}' expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Operator {0} is not supported for collection properties")]
    UnsupportedCollectionOperator(String),

    #[error("Collection column '{0}' can only be used as a comparison operand")]
    CollectionNotScalar(String),

    #[error("Operator {op} cannot be applied to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: ValueKind,
        right: ValueKind,
    },

    #[error("Cannot convert {value} from {from} to {to}")]
    ConversionFailed {
        value: String,
        from: ValueKind,
        to: ValueKind,
    },

    #[error("Dynamic LIKE patterns are not supported")]
    DynamicLikePattern,

    #[error("Parameter '{0}' has no value; parameters are substituted during parsing")]
    UnboundParameter(String),

    #[error("Condition must be boolean, found {0}")]
    NotBoolean(ValueKind),
}

impl LowerError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    pub fn mismatch(op: impl ToString, left: ValueKind, right: ValueKind) -> Self {
        Self::TypeMismatch {
            op: op.to_string(),
            left,
            right,
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" Did you mean '{}'?", s),
        None => String::new(),
    }
}

/// Failures raised while evaluating a compiled predicate or sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivideByZero,

    #[error("Arithmetic overflow in {0}")]
    Overflow(ValueKind),
}

/// Inconsistencies in a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("relation '{entity}.{relation}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },
}

/// The main error type for Dino operations.
#[derive(Debug, Error)]
pub enum DinoError {
    /// The query text was empty or whitespace only.
    #[error("Query cannot be null or empty")]
    EmptyQuery,

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("Lowering error: {0}")]
    Lower(#[from] LowerError),

    #[error("Execution error: {0}")]
    Eval(#[from] EvalError),

    #[error("Query must have a FROM clause")]
    MissingFrom,

    #[error("Table '{table}' not found.{}", did_you_mean(.suggestion))]
    UnknownTable {
        table: String,
        suggestion: Option<String>,
    },

    /// Input data did not match the schema.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DinoError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Caret diagnostic for errors that carry a source position.
    pub fn snippet(&self) -> Option<String> {
        match self {
            DinoError::Lex(e) => Some(e.snippet()),
            DinoError::Syntax(e) => Some(e.snippet()),
            _ => None,
        }
    }
}

/// Result type alias for Dino operations.
pub type DinoResult<T> = Result<T, DinoError>;
