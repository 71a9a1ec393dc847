//! Token kinds and the keyword table.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // -----------------------------------------------------------------------
    // Statement keywords
    // -----------------------------------------------------------------------
    Select,
    From,
    Where,
    With,
    Join,
    Left,
    Right,
    Inner,
    Outer,
    Full,
    Cross,
    On,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    Limit,
    Offset,
    Distinct,
    As,
    Union,
    All,
    Intersect,
    Except,
    Case,
    When,
    Then,
    Else,
    End,
    Exists,
    Any,
    Some,
    Cast,
    Convert,
    Top,
    Into,
    Over,
    Partition,
    Row,
    Rows,
    Range,
    Preceding,
    Following,
    Current,
    Unbounded,

    // -----------------------------------------------------------------------
    // Logical and predicate keywords
    // -----------------------------------------------------------------------
    And,
    Or,
    Not,
    In,
    Like,
    Between,
    Is,
    Null,

    // -----------------------------------------------------------------------
    // Aggregate and window function names
    // -----------------------------------------------------------------------
    Count,
    Sum,
    Avg,
    Min,
    Max,
    StdDev,
    Variance,
    First,
    Last,
    StringAgg,
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
    Ntile,
    Lag,
    Lead,
    FirstValue,
    LastValue,

    // -----------------------------------------------------------------------
    // Host hints (tokenized, never parsed)
    // -----------------------------------------------------------------------
    Include,
    ThenInclude,
    AsNoTracking,
    AsTracking,
    AsSplitQuery,
    AsNoTrackingWithIdentityResolution,

    // -----------------------------------------------------------------------
    // Literals and names
    // -----------------------------------------------------------------------
    Identifier,
    /// `@name`; the token value keeps the `@`.
    Parameter,
    NumberLiteral,
    StringLiteral,
    /// `TRUE` / `FALSE`, value upper-cased.
    BooleanLiteral,

    // -----------------------------------------------------------------------
    // Operators and punctuation
    // -----------------------------------------------------------------------
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Plus,
    Minus,
    Star,
    Divide,
    Modulo,
    Concat,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Dot,

    EndOfInput,
}

impl TokenKind {
    /// Aggregate and window names that may start a function call.
    pub fn is_function_name(self) -> bool {
        matches!(
            self,
            TokenKind::Count
                | TokenKind::Sum
                | TokenKind::Avg
                | TokenKind::Min
                | TokenKind::Max
                | TokenKind::StdDev
                | TokenKind::Variance
                | TokenKind::First
                | TokenKind::Last
                | TokenKind::StringAgg
                | TokenKind::RowNumber
                | TokenKind::Rank
                | TokenKind::DenseRank
                | TokenKind::PercentRank
                | TokenKind::CumeDist
                | TokenKind::Ntile
                | TokenKind::Lag
                | TokenKind::Lead
                | TokenKind::FirstValue
                | TokenKind::LastValue
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Look up a reserved word. The caller passes the word upper-cased.
pub fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "SELECT" => TokenKind::Select,
        "FROM" => TokenKind::From,
        "WHERE" => TokenKind::Where,
        "WITH" => TokenKind::With,
        "JOIN" => TokenKind::Join,
        "LEFT" => TokenKind::Left,
        "RIGHT" => TokenKind::Right,
        "INNER" => TokenKind::Inner,
        "OUTER" => TokenKind::Outer,
        "FULL" => TokenKind::Full,
        "CROSS" => TokenKind::Cross,
        "ON" => TokenKind::On,
        "GROUP" => TokenKind::Group,
        "BY" => TokenKind::By,
        "HAVING" => TokenKind::Having,
        "ORDER" => TokenKind::Order,
        "ASC" => TokenKind::Asc,
        "DESC" => TokenKind::Desc,
        "LIMIT" => TokenKind::Limit,
        "OFFSET" => TokenKind::Offset,
        "DISTINCT" => TokenKind::Distinct,
        "AS" => TokenKind::As,
        "UNION" => TokenKind::Union,
        "ALL" => TokenKind::All,
        "INTERSECT" => TokenKind::Intersect,
        "EXCEPT" => TokenKind::Except,
        "CASE" => TokenKind::Case,
        "WHEN" => TokenKind::When,
        "THEN" => TokenKind::Then,
        "ELSE" => TokenKind::Else,
        "END" => TokenKind::End,
        "EXISTS" => TokenKind::Exists,
        "ANY" => TokenKind::Any,
        "SOME" => TokenKind::Some,
        "CAST" => TokenKind::Cast,
        "CONVERT" => TokenKind::Convert,
        "TOP" => TokenKind::Top,
        "INTO" => TokenKind::Into,
        "OVER" => TokenKind::Over,
        "PARTITION" => TokenKind::Partition,
        "ROW" => TokenKind::Row,
        "ROWS" => TokenKind::Rows,
        "RANGE" => TokenKind::Range,
        "PRECEDING" => TokenKind::Preceding,
        "FOLLOWING" => TokenKind::Following,
        "CURRENT" => TokenKind::Current,
        "UNBOUNDED" => TokenKind::Unbounded,
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        "IN" => TokenKind::In,
        "LIKE" => TokenKind::Like,
        "BETWEEN" => TokenKind::Between,
        "IS" => TokenKind::Is,
        "NULL" => TokenKind::Null,
        "TRUE" | "FALSE" => TokenKind::BooleanLiteral,
        "COUNT" => TokenKind::Count,
        "SUM" => TokenKind::Sum,
        "AVG" => TokenKind::Avg,
        "MIN" => TokenKind::Min,
        "MAX" => TokenKind::Max,
        "STDDEV" => TokenKind::StdDev,
        "VARIANCE" => TokenKind::Variance,
        "FIRST" => TokenKind::First,
        "LAST" => TokenKind::Last,
        "STRING_AGG" => TokenKind::StringAgg,
        "ROW_NUMBER" => TokenKind::RowNumber,
        "RANK" => TokenKind::Rank,
        "DENSE_RANK" => TokenKind::DenseRank,
        "PERCENT_RANK" => TokenKind::PercentRank,
        "CUME_DIST" => TokenKind::CumeDist,
        "NTILE" => TokenKind::Ntile,
        "LAG" => TokenKind::Lag,
        "LEAD" => TokenKind::Lead,
        "FIRST_VALUE" => TokenKind::FirstValue,
        "LAST_VALUE" => TokenKind::LastValue,
        "INCLUDE" => TokenKind::Include,
        "THENINCLUDE" => TokenKind::ThenInclude,
        "ASNOTRACKING" => TokenKind::AsNoTracking,
        "ASTRACKING" => TokenKind::AsTracking,
        "ASSPLITQUERY" => TokenKind::AsSplitQuery,
        "ASNOTRACKINGWITHIDENTITYRESOLUTION" => TokenKind::AsNoTrackingWithIdentityResolution,
        _ => return None,
    };
    Some(kind)
}

/// A lexed token with its source position.
///
/// Equality and hashing use kind, value and offset only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Absolute character offset of the first character.
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
            line,
            column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// The value as shown in diagnostics.
    pub fn describe(&self) -> String {
        if self.kind == TokenKind::EndOfInput {
            "end of input".to_string()
        } else {
            format!("'{}'", self.value)
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value && self.position == other.position
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.value.hash(state);
        self.position.hash(state);
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} at {}:{}", self.kind, self.value, self.line, self.column)
    }
}
