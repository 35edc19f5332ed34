//! Core validator model for stricture
//!
//! A schema is an arena of validator nodes addressed by [`NodeId`]. Composite
//! nodes hold child ids, never the children themselves, so the interpreter,
//! the compiling optimizer and the type emitters can all walk the same tree
//! cheaply and as often as they like.

pub mod document;
pub mod error;
pub mod naming;
pub mod schema;
pub mod types;

pub use document::{SchemaDef, TypeDef};
pub use error::CoreError;
pub use schema::{NodeId, Schema, SchemaBuilder};
pub use types::{
    DateTimeFormat, FloatRange, IntRange, Leaf, LengthBounds, Node, NodeKind, ObjectField,
    Pattern, Variant, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER,
};
