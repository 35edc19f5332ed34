//! Per-pass definition registry.
//!
//! Maps a declared type name to its declaration text. The registry is owned
//! by the caller and passed into every emission call, so two passes never
//! share state by accident.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::CodegenError;

/// What to do when a name is registered a second time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryMode {
    /// Keep the first declaration, never look at later bodies
    #[default]
    FirstWriterWins,
    /// Re-render every hit and reject a body that differs from the first
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    definitions: IndexMap<String, String>,
    mode: RegistryMode,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: RegistryMode) -> Self {
        Self {
            definitions: IndexMap::new(),
            mode,
        }
    }

    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Whether emitting `name` can stop at a bare reference. False in strict
    /// mode, where every hit is rendered again for comparison.
    pub fn resolves(&self, name: &str) -> bool {
        let hit = self.mode == RegistryMode::FirstWriterWins && self.contains(name);
        if hit {
            trace!(type_name = name, "registry hit, emitting reference");
        }
        hit
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.definitions.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Declaration names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Record `declaration` under `name`.
    ///
    /// Returns `false` when the name was already taken and the new body was
    /// dropped. In strict mode a different body is an error instead.
    pub fn insert(
        &mut self,
        name: &str,
        declaration: impl Into<String>,
    ) -> Result<bool, CodegenError> {
        let declaration = declaration.into();
        if let Some(existing) = self.definitions.get(name) {
            if self.mode == RegistryMode::Strict && *existing != declaration {
                return Err(CodegenError::ConflictingDefinition {
                    name: name.to_string(),
                });
            }
            trace!(type_name = name, "declaration already registered");
            return Ok(false);
        }

        debug!(type_name = name, "registered declaration");
        self.definitions.insert(name.to_string(), declaration);
        Ok(true)
    }

    /// Every declaration, in registration order, separated by blank lines
    pub fn render(&self) -> String {
        self.definitions
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() -> Result<(), CodegenError> {
        let mut registry = TypeRegistry::new();
        assert!(registry.insert("Position", "struct A\n")?);
        assert!(!registry.insert("Position", "struct B\n")?);
        assert_eq!(registry.get("Position"), Some("struct A\n"));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolves("Position"));
        Ok(())
    }

    #[test]
    fn test_strict_mode_rejects_different_bodies() -> Result<(), CodegenError> {
        let mut registry = TypeRegistry::with_mode(RegistryMode::Strict);
        registry.insert("Position", "struct A\n")?;
        assert!(!registry.resolves("Position"));
        assert!(!registry.insert("Position", "struct A\n")?);

        let err = registry.insert("Position", "struct B\n").unwrap_err();
        assert!(matches!(err, CodegenError::ConflictingDefinition { ref name } if name == "Position"));
        Ok(())
    }

    #[test]
    fn test_render_keeps_registration_order() -> Result<(), CodegenError> {
        let mut registry = TypeRegistry::new();
        registry.insert("B", "b\n")?;
        registry.insert("A", "a\n")?;
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(registry.render(), "b\n\na\n");
        Ok(())
    }
}
