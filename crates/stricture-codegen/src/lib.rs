//! Type emission for stricture schemas
//!
//! Walks the same node arena the validators use and renders it as:
//! - **TypeScript** (structural, the default): inline type expressions
//! - **Rust** (nominal): serde structs and tagged enums, deduplicated through
//!   a [`TypeRegistry`]
//! - **Constructor text**: the schema in authoring form
//!
//! [`export`] picks one of these from [`ExportOptions`].

pub mod constructor;
pub mod error;
pub mod registry;
pub mod rust;
pub mod typescript;

use std::fmt;
use std::str::FromStr;

use stricture_core::{NodeId, Schema};
use tracing::debug;

pub use constructor::ConstructorCodegen;
pub use error::CodegenError;
pub use registry::{RegistryMode, TypeRegistry};
pub use rust::RustCodegen;
pub use typescript::TypeScriptCodegen;

/// Common trait for all emitters
pub trait Codegen {
    /// Reference to the type of `id`. Named declarations produced on the way
    /// are recorded in `registry`.
    fn emit(
        &mut self,
        schema: &Schema,
        id: NodeId,
        registry: &mut TypeRegistry,
    ) -> Result<String, CodegenError>;

    /// Output for the whole schema
    fn generate(&mut self, schema: &Schema, registry: &mut TypeRegistry) -> Result<String, CodegenError>;
}

/// Type emission target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    TypeScript,
    Rust,
}

impl FromStr for Language {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Language::TypeScript),
            "rust" | "rs" => Ok(Language::Rust),
            _ => Err(CodegenError::UnsupportedTarget(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::TypeScript => write!(f, "typescript"),
            Language::Rust => write!(f, "rust"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Emit type declarations instead of constructor text
    pub types: bool,
    /// Target identifier, TypeScript when absent
    pub language: Option<String>,
    /// Name for the root type, overriding its declared name
    pub root_name: Option<String>,
    pub registry_mode: RegistryMode,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type declarations for `language`
    pub fn types(language: impl Into<String>) -> Self {
        Self {
            types: true,
            language: Some(language.into()),
            ..Self::default()
        }
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    pub fn with_registry_mode(mut self, mode: RegistryMode) -> Self {
        self.registry_mode = mode;
        self
    }

    /// The selected target; an unknown identifier is an error even when
    /// constructor text is requested
    pub fn target(&self) -> Result<Language, CodegenError> {
        self.language
            .as_deref()
            .map(str::parse::<Language>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Render `schema` as selected by `options`, with a fresh registry
pub fn export(schema: &Schema, options: &ExportOptions) -> Result<String, CodegenError> {
    let language = options.target()?;
    let mut registry = TypeRegistry::with_mode(options.registry_mode);

    if !options.types {
        return ConstructorCodegen::new().generate(schema, &mut registry);
    }

    debug!(%language, nodes = schema.len(), "emitting types");
    let output = match language {
        Language::TypeScript => {
            let mut codegen = TypeScriptCodegen::new();
            if let Some(name) = &options.root_name {
                codegen = codegen.with_root_name(name);
            }
            codegen.generate(schema, &mut registry)?
        }
        Language::Rust => {
            let mut codegen = RustCodegen::new();
            if let Some(name) = &options.root_name {
                codegen = codegen.with_root_name(name);
            }
            codegen.generate(schema, &mut registry)?
        }
    };
    debug!(declarations = registry.len(), "emitted types");
    Ok(output)
}
