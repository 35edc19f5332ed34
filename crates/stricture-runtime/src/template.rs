//! Pre-resolved failure constructors.
//!
//! A template fixes a failure's kind and message ahead of time. The
//! interpreter builds them on demand; the compiler collects every distinct one
//! it references into the program's declarations table.

use serde_json::Value;
use stricture_core::LengthBounds;

use crate::errors::{FailureKind, ValidationFailure};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template {
    pub kind: FailureKind,
    pub message: String,
    /// Append the observed count, `(found N)`, when rendering
    pub counts: bool,
}

impl Template {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            counts: false,
        }
    }

    pub fn counted(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            counts: true,
        }
    }

    pub fn render(&self, found: Option<usize>) -> String {
        match found {
            Some(n) if self.counts => format!("{} (found {})", self.message, n),
            _ => self.message.clone(),
        }
    }

    pub fn instantiate(
        &self,
        value: Option<&Value>,
        found: Option<usize>,
        path: String,
    ) -> ValidationFailure {
        ValidationFailure {
            kind: self.kind,
            message: self.render(found),
            value: value.cloned(),
            path,
        }
    }
}

pub fn required() -> Template {
    Template::new(FailureKind::Required, "Is required")
}

pub fn not_object() -> Template {
    Template::new(FailureKind::NotObject, "Must be an object")
}

pub fn not_array() -> Template {
    Template::new(FailureKind::NotArray, "Must be an array")
}

/// WrongLength template for a bounded collection. `unit` names what is being
/// counted: items, keys, characters or bytes.
pub fn length(bounds: &LengthBounds, unit: &str) -> Template {
    let phrase = if bounds.min == bounds.max {
        Some(format!("exactly {}", bounds.min))
    } else {
        bounds.phrase()
    };
    let message = match phrase {
        Some(phrase) => format!("Must contain {} {}", phrase, unit),
        None => format!("Must contain a valid number of {}", unit),
    };
    Template::counted(FailureKind::WrongLength, message)
}

/// Tuple arity mismatch, reported as a composite failure with the found count
pub fn tuple_arity(arity: usize) -> Template {
    let unit = if arity == 1 { "item" } else { "items" };
    Template::counted(
        FailureKind::CompositeMismatch,
        format!("Must contain exactly {} {}", arity, unit),
    )
}

pub fn union_mismatch(alternatives: usize) -> Template {
    Template::new(
        FailureKind::CompositeMismatch,
        format!("Must match one of {} alternatives", alternatives),
    )
}
