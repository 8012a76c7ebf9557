//! Typed query AST
//!
//! The parser builds this representation once, at validation time; the
//! evaluator, transformer, and projector then match on structure instead
//! of re-inspecting JSON keys per record. Malformed trees are
//! unrepresentable here: every variant carries exactly the shape its
//! operator allows.

/// Measure comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureOp {
    Lt,
    Gt,
    Eq,
}

impl MeasureOp {
    /// Returns the wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureOp::Lt => "LT",
            MeasureOp::Gt => "GT",
            MeasureOp::Eq => "EQ",
        }
    }
}

/// A wildcard pattern for IS comparison, resolved at parse time.
///
/// Interior asterisks were already rejected during validation, so the
/// stored strings are asterisk-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `*` or `**`: matches every value
    Any,
    /// `*text*`
    Contains(String),
    /// `text*`
    Prefix(String),
    /// `*text`
    Suffix(String),
    /// No wildcards
    Exact(String),
}

impl Pattern {
    /// Resolves a validated input string into its pattern form
    pub fn from_input(input: &str) -> Self {
        if input == "*" || input == "**" {
            Pattern::Any
        } else if input.starts_with('*') && input.ends_with('*') {
            Pattern::Contains(input[1..input.len() - 1].to_string())
        } else if input.starts_with('*') {
            Pattern::Suffix(input[1..].to_string())
        } else if input.ends_with('*') {
            Pattern::Prefix(input[..input.len() - 1].to_string())
        } else {
            Pattern::Exact(input.to_string())
        }
    }

    /// True if `value` matches this pattern
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Contains(s) => value.contains(s.as_str()),
            Pattern::Prefix(s) => value.starts_with(s.as_str()),
            Pattern::Suffix(s) => value.ends_with(s.as_str()),
            Pattern::Exact(s) => value == s,
        }
    }
}

/// A WHERE filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `{}`: matches every record
    All,
    /// All children must match (list is non-empty by construction)
    And(Vec<Filter>),
    /// At least one child must match (list is non-empty by construction)
    Or(Vec<Filter>),
    /// Child must not match
    Not(Box<Filter>),
    /// Numeric comparison on a measure field (field is unqualified)
    Measure {
        op: MeasureOp,
        field: String,
        value: f64,
    },
    /// Wildcard comparison on a string field (field is unqualified)
    Is { field: String, pattern: Pattern },
}

/// Sort direction for keyed ORDER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// ORDER specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Single output column, ascending
    Single(String),
    /// Cascading multi-key comparator; Down reverses the sorted sequence
    Keyed { dir: Direction, keys: Vec<String> },
}

/// Aggregation tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl ApplyToken {
    /// Parses a wire token
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "SUM" => Some(ApplyToken::Sum),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    /// Returns the wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Avg => "AVG",
            ApplyToken::Sum => "SUM",
            ApplyToken::Count => "COUNT",
        }
    }
}

/// One GROUP key: the qualified output column and the record field it
/// reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    pub output: String,
    pub field: String,
}

/// One APPLY rule: apply-key, token, and the unqualified record field the
/// aggregate reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRule {
    pub output: String,
    pub token: ApplyToken,
    pub field: String,
}

/// TRANSFORMATIONS block
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub group: Vec<GroupKey>,
    pub apply: Vec<ApplyRule>,
}

/// A fully validated query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The single dataset id this query is bound to
    pub dataset_id: String,
    /// WHERE tree (`Filter::All` for the empty object)
    pub filter: Filter,
    /// Output columns, in declaration order, by their wire names
    pub columns: Vec<String>,
    /// Optional ORDER specification
    pub order: Option<OrderSpec>,
    /// Optional grouping/aggregation
    pub transform: Option<Transform>,
}
