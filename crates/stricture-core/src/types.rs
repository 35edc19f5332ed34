//! Validator node kinds and the required/nullable variant algebra

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::schema::NodeId;

/// Smallest integer that survives a round trip through an IEEE double.
/// Used as the "no lower bound" sentinel.
pub const MIN_SAFE_INTEGER: i64 = -9_007_199_254_740_991;

/// Largest integer that survives a round trip through an IEEE double.
/// Used as the "no upper bound" sentinel.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// The four standard variants every node can take.
///
/// `required` and `nullable` are independent axes: `Optional` accepts an
/// absent value, `Nullable` accepts `null`, `OptionalNullable` accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Required,
    Optional,
    Nullable,
    OptionalNullable,
}

impl Variant {
    pub fn from_flags(required: bool, nullable: bool) -> Self {
        match (required, nullable) {
            (true, false) => Variant::Required,
            (false, false) => Variant::Optional,
            (true, true) => Variant::Nullable,
            (false, true) => Variant::OptionalNullable,
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, Variant::Required | Variant::Nullable)
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, Variant::Nullable | Variant::OptionalNullable)
    }
}

/// Join optional lower/upper bound text into the range phrase used by
/// failure messages. Returns `None` when neither side is bounded.
pub fn range_phrase(lower: Option<String>, upper: Option<String>) -> Option<String> {
    match (lower, upper) {
        (Some(lo), Some(hi)) => Some(format!("between {} and {}", lo, hi)),
        (Some(lo), None) => Some(format!("at least {}", lo)),
        (None, Some(hi)) => Some(format!("at most {}", hi)),
        (None, None) => None,
    }
}

/// Inclusive integer range. The safe-integer sentinels mean "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl Default for IntRange {
    fn default() -> Self {
        Self {
            min: MIN_SAFE_INTEGER,
            max: MAX_SAFE_INTEGER,
        }
    }
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn lower(&self) -> Option<i64> {
        (self.min > MIN_SAFE_INTEGER).then_some(self.min)
    }

    pub fn upper(&self) -> Option<i64> {
        (self.max < MAX_SAFE_INTEGER).then_some(self.max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower().is_none() && self.upper().is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min as f64 && value <= self.max as f64
    }

    pub fn phrase(&self) -> Option<String> {
        range_phrase(
            self.lower().map(|v| v.to_string()),
            self.upper().map(|v| v.to_string()),
        )
    }
}

/// Inclusive floating point range. The safe-integer sentinels mean "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl Default for FloatRange {
    fn default() -> Self {
        Self {
            min: MIN_SAFE_INTEGER as f64,
            max: MAX_SAFE_INTEGER as f64,
        }
    }
}

impl FloatRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn lower(&self) -> Option<f64> {
        (self.min > MIN_SAFE_INTEGER as f64).then_some(self.min)
    }

    pub fn upper(&self) -> Option<f64> {
        (self.max < MAX_SAFE_INTEGER as f64).then_some(self.max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower().is_none() && self.upper().is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn phrase(&self) -> Option<String> {
        range_phrase(
            self.lower().map(|v| v.to_string()),
            self.upper().map(|v| v.to_string()),
        )
    }
}

/// Inclusive length bounds for strings, arrays, buffers and record keys.
/// A minimum of zero and the max-safe-integer sentinel mean "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: u64,
    pub max: u64,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            min: 0,
            max: MAX_SAFE_INTEGER as u64,
        }
    }
}

impl LengthBounds {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: u64) -> Self {
        Self {
            min,
            ..Self::default()
        }
    }

    pub fn at_most(max: u64) -> Self {
        Self { min: 0, max }
    }

    pub fn lower(&self) -> Option<u64> {
        (self.min > 0).then_some(self.min)
    }

    pub fn upper(&self) -> Option<u64> {
        (self.max < MAX_SAFE_INTEGER as u64).then_some(self.max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower().is_none() && self.upper().is_none()
    }

    pub fn contains(&self, len: usize) -> bool {
        let len = len as u64;
        len >= self.min && len <= self.max
    }

    pub fn phrase(&self) -> Option<String> {
        range_phrase(
            self.lower().map(|v| v.to_string()),
            self.upper().map(|v| v.to_string()),
        )
    }
}

/// Accepted timestamp notations for the datetime leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTimeFormat {
    /// Strict RFC 3339 (`2024-02-29T10:00:00Z`)
    #[default]
    Rfc3339,
    /// RFC 3339, RFC 2822 or `YYYY-MM-DD HH:MM:SS`
    Lenient,
}

/// A compiled regular expression that remembers its source
#[derive(Clone)]
pub struct Pattern {
    regex: regex::Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, CoreError> {
        regex::Regex::new(source)
            .map(|regex| Self { regex })
            .map_err(|err| CoreError::InvalidPattern {
                pattern: source.to_string(),
                reason: err.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern(/{}/)", self.as_str())
    }
}

/// Scalar validators with no children
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    String { length: LengthBounds },
    Integer { range: IntRange },
    Float { range: FloatRange },
    Boolean,
    Null,
    Undefined,
    /// Calendar date written as `YYYY-MM-DD`
    Date,
    DateTime { format: DateTimeFormat },
    ExactString { expected: String },
    Regex { pattern: Pattern },
    Unknown,
    /// Binary blob, carried in JSON as an array of bytes
    Buffer { length: LengthBounds },
}

impl Leaf {
    /// Short lowercase name used in messages and configuration errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Leaf::String { .. } => "string",
            Leaf::Integer { .. } => "integer",
            Leaf::Float { .. } => "float",
            Leaf::Boolean => "boolean",
            Leaf::Null => "null",
            Leaf::Undefined => "undefined",
            Leaf::Date => "date",
            Leaf::DateTime { .. } => "datetime",
            Leaf::ExactString { .. } => "exact string",
            Leaf::Regex { .. } => "regex",
            Leaf::Unknown => "unknown",
            Leaf::Buffer { .. } => "buffer",
        }
    }

    /// Leaves whose own shape check decides what `null` means, instead of
    /// the generic presence gate.
    pub fn inspects_null(&self) -> bool {
        matches!(self, Leaf::Null | Leaf::Undefined | Leaf::Unknown)
    }
}

/// A named child of an object node, kept in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub node: NodeId,
}

/// Closed set of node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf(Leaf),
    Object { fields: Vec<ObjectField> },
    Array { item: NodeId, length: LengthBounds },
    Tuple { items: Vec<NodeId> },
    Record { value: NodeId, keys: LengthBounds },
    Union { alternatives: Vec<NodeId> },
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Leaf(leaf) => leaf.kind_name(),
            NodeKind::Object { .. } => "object",
            NodeKind::Array { .. } => "array",
            NodeKind::Tuple { .. } => "tuple",
            NodeKind::Record { .. } => "record",
            NodeKind::Union { .. } => "union",
        }
    }

    /// Child ids in walk order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Leaf(_) => Vec::new(),
            NodeKind::Object { fields } => fields.iter().map(|f| f.node).collect(),
            NodeKind::Array { item, .. } => vec![*item],
            NodeKind::Tuple { items } => items.clone(),
            NodeKind::Record { value, .. } => vec![*value],
            NodeKind::Union { alternatives } => alternatives.clone(),
        }
    }
}

/// A validator node: a kind plus its presence flags and naming metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub required: bool,
    pub nullable: bool,
    /// Declared type name, used by nominal emission
    pub name: Option<String>,
    /// Variant name override when this node is a tagged-union member
    pub rename: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        let required = !matches!(kind, NodeKind::Leaf(Leaf::Undefined));
        Self {
            kind,
            required,
            nullable: false,
            name: None,
            rename: None,
        }
    }

    pub fn leaf(leaf: Leaf) -> Self {
        Self::new(NodeKind::Leaf(leaf))
    }

    pub fn variant(&self) -> Variant {
        Variant::from_flags(self.required, self.nullable)
    }

    /// Same node, different presence flags
    pub fn with_variant(&self, variant: Variant) -> Self {
        Self {
            required: variant.is_required(),
            nullable: variant.is_nullable(),
            ..self.clone()
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Field lookup for object nodes
    pub fn field(&self, name: &str) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Object { fields } => fields.iter().find(|f| f.name == name).map(|f| f.node),
            _ => None,
        }
    }
}
