//! stricture: runtime data validation
//!
//! Build a schema from validator nodes, check untyped JSON against it, and
//! emit matching TypeScript or Rust types.
//!
//! ```rust
//! use serde_json::json;
//! use stricture::{export, ExportOptions, FloatRange, SchemaBuilder, Validator};
//!
//! let mut b = SchemaBuilder::new();
//! let longitude = b.float_range(FloatRange::new(-180.0, 180.0));
//! let position = b.object([("longitude", longitude)]);
//! let root = b.object([("position", position)]);
//! let validator = Validator::new(b.finish(root).unwrap());
//!
//! let failures = validator.validate(&json!({"position": {"longitude": -181}}));
//! assert_eq!(failures[0].path, "position['longitude']");
//!
//! let types = export(validator.schema(), &ExportOptions::types("typescript")).unwrap();
//! assert_eq!(types, "{\n  position: {\n    longitude: number;\n  };\n}");
//! ```

pub mod check;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

pub use stricture_codegen::{
    export, Codegen, CodegenError, ConstructorCodegen, ExportOptions, Language, RegistryMode,
    RustCodegen, TypeRegistry, TypeScriptCodegen,
};
pub use stricture_core::{
    naming, CoreError, DateTimeFormat, FloatRange, IntRange, Leaf, LengthBounds, Node, NodeId,
    NodeKind, Schema, SchemaBuilder, SchemaDef, TypeDef, Variant,
};
pub use stricture_runtime::{
    CastError, Compilation, FailureKind, UnionFailureMode, ValidateOptions, ValidationFailure,
    ValidationFailures, Validator, ValidatorOptions,
};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Read a schema document, YAML for `.yaml`/`.yml` and JSON otherwise
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    let document = if is_yaml(path) {
        SchemaDef::from_yaml_str(&text)
    } else {
        SchemaDef::from_json_str(&text)
    }
    .with_context(|| format!("Failed to parse schema {}", path.display()))?;

    document
        .build()
        .with_context(|| format!("Invalid schema {}", path.display()))
}

/// Read an input value, YAML for `.yaml`/`.yml` and JSON otherwise
pub fn load_value(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input {}", path.display()))?;
    let value = if is_yaml(path) {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse YAML input {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON input {}", path.display()))?
    };
    Ok(value)
}
