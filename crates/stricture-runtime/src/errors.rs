//! Validation failure types.
//!
//! Failures are data: a validation call returns them in order, it never
//! raises them. [`CastError`] is the only error type, used when a caller asks
//! for a typed value and the input does not validate.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Closed failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Required,
    NotString,
    NotInteger,
    NotFloat,
    NotBoolean,
    NotNull,
    NotUndefined,
    NotDate,
    NotArray,
    NotObject,
    NotBuffer,
    WrongLength,
    OutOfRange,
    NotExactMatch,
    DoesNotMatchPattern,
    NotRfc3339,
    NotRecognizedTimestamp,
    CompositeMismatch,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Required => "required",
            FailureKind::NotString => "not_string",
            FailureKind::NotInteger => "not_integer",
            FailureKind::NotFloat => "not_float",
            FailureKind::NotBoolean => "not_boolean",
            FailureKind::NotNull => "not_null",
            FailureKind::NotUndefined => "not_undefined",
            FailureKind::NotDate => "not_date",
            FailureKind::NotArray => "not_array",
            FailureKind::NotObject => "not_object",
            FailureKind::NotBuffer => "not_buffer",
            FailureKind::WrongLength => "wrong_length",
            FailureKind::OutOfRange => "out_of_range",
            FailureKind::NotExactMatch => "not_exact_match",
            FailureKind::DoesNotMatchPattern => "does_not_match_pattern",
            FailureKind::NotRfc3339 => "not_rfc3339",
            FailureKind::NotRecognizedTimestamp => "not_recognized_timestamp",
            FailureKind::CompositeMismatch => "composite_mismatch",
        }
    }

    /// The wrong-type family: the value had the wrong shape altogether
    pub fn is_wrong_type(self) -> bool {
        matches!(
            self,
            FailureKind::NotString
                | FailureKind::NotInteger
                | FailureKind::NotFloat
                | FailureKind::NotBoolean
                | FailureKind::NotNull
                | FailureKind::NotUndefined
                | FailureKind::NotDate
                | FailureKind::NotArray
                | FailureKind::NotObject
                | FailureKind::NotBuffer
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure with its location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub kind: FailureKind,

    /// Human-readable message, e.g. `Must contain between 2 and 10 items (found 1)`
    pub message: String,

    /// The offending value. `None` when the value was absent.
    pub value: Option<Value>,

    /// Field-access path to the value.
    ///
    /// Examples:
    /// - `""` - the root value
    /// - `"position['longitude']"` - nested field
    /// - `"positions[1]['accuracy']"` - array element field
    pub path: String,
}

impl ValidationFailure {
    pub fn new(
        kind: FailureKind,
        message: impl Into<String>,
        value: Option<Value>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            value,
            path: path.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        write!(f, " [{}]", self.kind)
    }
}

impl std::error::Error for ValidationFailure {}

/// An ordered collection of failures, used as the aggregate error of `cast`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationFailures {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn first(&self) -> Option<&ValidationFailure> {
        self.failures.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationFailure> {
        self.failures.iter()
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => write!(f, "No validation failures"),
            [only] => write!(f, "Validation failed: {}", only),
            failures => {
                writeln!(f, "{} validation failures:", failures.len())?;
                for (i, failure) in failures.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationFailures {}

impl From<Vec<ValidationFailure>> for ValidationFailures {
    fn from(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }
}

impl IntoIterator for ValidationFailures {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationFailures {
    type Item = &'a ValidationFailure;
    type IntoIter = std::slice::Iter<'a, ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

#[derive(Error, Debug)]
pub enum CastError {
    #[error("{0}")]
    Invalid(ValidationFailures),

    #[error("Validated value could not be deserialized: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl CastError {
    /// The failures behind an `Invalid` cast, if any
    pub fn failures(&self) -> Option<&ValidationFailures> {
        match self {
            CastError::Invalid(failures) => Some(failures),
            CastError::Deserialize(_) => None,
        }
    }
}
