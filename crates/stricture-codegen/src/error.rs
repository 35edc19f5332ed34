//! Configuration-time errors raised by the emitters

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Unsupported target language: {0} (expected \"typescript\" or \"rust\")")]
    UnsupportedTarget(String),

    #[error("Missing type name for {kind} at {location}: nominal emission needs a declared name")]
    MissingName { kind: &'static str, location: String },

    #[error("Type kind {kind} at {location} has no nominal representation")]
    NoNominalRepresentation { kind: &'static str, location: String },

    #[error(
        "Union at {location} has no shared discriminant field: nominal union members must be \
         objects tagged with distinct exact-match strings"
    )]
    UntaggedUnion { location: String },

    #[error(
        "Exact-match string {value:?} at {location} has no standalone nominal representation: \
         use it as an object field or a union discriminant"
    )]
    StandaloneExactString { value: String, location: String },

    #[error("Optional exact-match string at {location} has no nominal representation")]
    OptionalExactString { location: String },

    #[error("Conflicting definitions for type {name}: a different body is already registered")]
    ConflictingDefinition { name: String },

    #[error(
        "Union member at {location} would be declared as struct {name}, the name of its own \
         union: give the member a different name or a variant rename"
    )]
    MemberNamedAfterUnion { name: String, location: String },

    #[error("Rust {kind} {name} at {location} would be generated for both {first:?} and {second:?}")]
    DuplicateIdentifier {
        kind: &'static str,
        name: String,
        first: String,
        second: String,
        location: String,
    },

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Where an emitter currently is, rendered like `vehicles[].home[1]`
#[derive(Debug, Clone, Default)]
pub(crate) struct Location {
    rendered: String,
}

impl Location {
    /// Current length, to be handed back to [`Location::truncate`]
    pub fn mark(&self) -> usize {
        self.rendered.len()
    }

    pub fn truncate(&mut self, mark: usize) {
        self.rendered.truncate(mark);
    }

    pub fn field(&mut self, name: &str) {
        if !self.rendered.is_empty() {
            self.rendered.push('.');
        }
        self.rendered.push_str(name);
    }

    pub fn items(&mut self) {
        self.rendered.push_str("[]");
    }

    pub fn index(&mut self, index: usize) {
        self.rendered.push_str(&format!("[{}]", index));
    }

    pub fn values(&mut self) {
        self.rendered.push_str("{}");
    }

    pub fn alternative(&mut self, index: usize) {
        self.rendered.push_str(&format!("|{}", index));
    }

    pub fn render(&self) -> String {
        if self.rendered.is_empty() {
            "<root>".to_string()
        } else {
            self.rendered.clone()
        }
    }
}
