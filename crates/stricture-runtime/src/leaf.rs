//! Leaf predicates and their failure templates.
//!
//! Every leaf check reports at most one violation, classified as either a
//! wrong-type violation (the value has the wrong shape) or a constraint
//! violation (right shape, outside the declared bounds). Each class maps to
//! exactly one template per leaf.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use stricture_core::{DateTimeFormat, FloatRange, IntRange, Leaf, LengthBounds, Pattern};

use crate::errors::FailureKind;
use crate::template::{self, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    WrongType,
    Constraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub class: Class,
    /// Observed length for counted templates
    pub found: Option<usize>,
}

impl Violation {
    fn wrong_type() -> Option<Self> {
        Some(Self {
            class: Class::WrongType,
            found: None,
        })
    }

    fn constraint(found: Option<usize>) -> Option<Self> {
        Some(Self {
            class: Class::Constraint,
            found,
        })
    }
}

/// Check a present value against a leaf
pub fn check(leaf: &Leaf, value: &Value) -> Option<Violation> {
    match leaf {
        Leaf::String { length } => check_string(value, length),
        Leaf::Integer { range } => check_integer(value, range),
        Leaf::Float { range } => check_float(value, range),
        Leaf::Boolean => check_boolean(value),
        Leaf::Null => check_null(value),
        Leaf::Undefined => check_undefined(value),
        Leaf::Date => check_date(value),
        Leaf::DateTime { format } => check_datetime(value, *format),
        Leaf::ExactString { expected } => check_exact(value, expected),
        Leaf::Regex { pattern } => check_regex(value, pattern),
        Leaf::Unknown => None,
        Leaf::Buffer { length } => check_buffer(value, length),
    }
}

pub fn check_string(value: &Value, length: &LengthBounds) -> Option<Violation> {
    let Value::String(s) = value else {
        return Violation::wrong_type();
    };
    if length.is_unbounded() {
        return None;
    }
    let count = s.chars().count();
    if length.contains(count) {
        None
    } else {
        Violation::constraint(Some(count))
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

pub fn check_integer(value: &Value, range: &IntRange) -> Option<Violation> {
    let Value::Number(n) = value else {
        return Violation::wrong_type();
    };
    if !is_integral(n) {
        return Violation::wrong_type();
    }
    match n.as_f64() {
        Some(f) if range.contains(f) => None,
        _ => Violation::constraint(None),
    }
}

pub fn check_float(value: &Value, range: &FloatRange) -> Option<Violation> {
    match value.as_f64() {
        Some(f) if value.is_number() => {
            if range.contains(f) {
                None
            } else {
                Violation::constraint(None)
            }
        }
        _ => Violation::wrong_type(),
    }
}

pub fn check_boolean(value: &Value) -> Option<Violation> {
    if value.is_boolean() {
        None
    } else {
        Violation::wrong_type()
    }
}

pub fn check_null(value: &Value) -> Option<Violation> {
    if value.is_null() {
        None
    } else {
        Violation::wrong_type()
    }
}

/// Any present value, `null` included, is not undefined
pub fn check_undefined(_value: &Value) -> Option<Violation> {
    Violation::wrong_type()
}

pub fn check_date(value: &Value) -> Option<Violation> {
    match value.as_str() {
        Some(s) if s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => None,
        _ => Violation::wrong_type(),
    }
}

fn is_recognized_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

pub fn check_datetime(value: &Value, format: DateTimeFormat) -> Option<Violation> {
    let Some(s) = value.as_str() else {
        return Violation::wrong_type();
    };
    let ok = match format {
        DateTimeFormat::Rfc3339 => DateTime::parse_from_rfc3339(s).is_ok(),
        DateTimeFormat::Lenient => is_recognized_timestamp(s),
    };
    if ok {
        None
    } else {
        Violation::wrong_type()
    }
}

pub fn check_exact(value: &Value, expected: &str) -> Option<Violation> {
    if value.as_str() == Some(expected) {
        None
    } else {
        Violation::wrong_type()
    }
}

pub fn check_regex(value: &Value, pattern: &Pattern) -> Option<Violation> {
    match value.as_str() {
        None => Violation::wrong_type(),
        Some(s) if pattern.is_match(s) => None,
        Some(_) => Violation::constraint(None),
    }
}

pub fn check_buffer(value: &Value, length: &LengthBounds) -> Option<Violation> {
    let Value::Array(bytes) = value else {
        return Violation::wrong_type();
    };
    let all_bytes = bytes
        .iter()
        .all(|b| b.as_u64().is_some_and(|b| b <= u8::MAX as u64));
    if !all_bytes {
        return Violation::wrong_type();
    }
    if length.contains(bytes.len()) {
        None
    } else {
        Violation::constraint(Some(bytes.len()))
    }
}

/// Template for a violation class. `None` when the leaf can never report
/// that class (an unknown leaf never fails, a boolean has no constraint).
pub fn template(leaf: &Leaf, class: Class) -> Option<Template> {
    match class {
        Class::WrongType => wrong_type(leaf),
        Class::Constraint => constraint(leaf),
    }
}

pub fn wrong_type(leaf: &Leaf) -> Option<Template> {
    let (kind, message) = match leaf {
        Leaf::String { .. } | Leaf::Regex { .. } => (FailureKind::NotString, "Must be a string".to_string()),
        Leaf::Integer { .. } => (FailureKind::NotInteger, "Must be an integer".to_string()),
        Leaf::Float { .. } => (FailureKind::NotFloat, "Must be a float".to_string()),
        Leaf::Boolean => (FailureKind::NotBoolean, "Must be a boolean".to_string()),
        Leaf::Null => (FailureKind::NotNull, "Must be null".to_string()),
        Leaf::Undefined => (FailureKind::NotUndefined, "Must be undefined".to_string()),
        Leaf::Date => (FailureKind::NotDate, "Must be a date (YYYY-MM-DD)".to_string()),
        Leaf::DateTime {
            format: DateTimeFormat::Rfc3339,
        } => (
            FailureKind::NotRfc3339,
            "Must be an RFC 3339 timestamp".to_string(),
        ),
        Leaf::DateTime {
            format: DateTimeFormat::Lenient,
        } => (
            FailureKind::NotRecognizedTimestamp,
            "Must be a recognized timestamp".to_string(),
        ),
        Leaf::ExactString { expected } => (
            FailureKind::NotExactMatch,
            format!("Must strictly equal \"{}\"", expected),
        ),
        Leaf::Buffer { .. } => (FailureKind::NotBuffer, "Must be a byte buffer".to_string()),
        Leaf::Unknown => return None,
    };
    Some(Template::new(kind, message))
}

pub fn constraint(leaf: &Leaf) -> Option<Template> {
    match leaf {
        Leaf::String { length } => Some(template::length(length, "characters")),
        Leaf::Buffer { length } => Some(template::length(length, "bytes")),
        Leaf::Integer { range } => Some(Template::new(
            FailureKind::OutOfRange,
            match range.phrase() {
                Some(phrase) => format!("Must be an integer {}", phrase),
                None => "Must be a safe integer".to_string(),
            },
        )),
        Leaf::Float { range } => Some(Template::new(
            FailureKind::OutOfRange,
            match range.phrase() {
                Some(phrase) => format!("Must be a float {}", phrase),
                None => "Must be a float within the safe integer range".to_string(),
            },
        )),
        Leaf::Regex { pattern } => Some(Template::new(
            FailureKind::DoesNotMatchPattern,
            format!("Must match pattern /{}/", pattern.as_str()),
        )),
        _ => None,
    }
}
