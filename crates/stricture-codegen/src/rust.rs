//! Nominal emitter: Rust structs and tagged enums
//!
//! Generates serde-ready declarations from a schema:
//! - Named objects and tagged-union members become structs
//! - Unions of objects sharing an exact-match discriminant become
//!   `#[serde(tag = "...")]` enums, one newtype variant per member
//! - Optional or nullable positions wrap the bare type in `Option<..>`
//!
//! Declarations land in the [`TypeRegistry`]; [`Codegen::emit`] returns the
//! reference to use in their place.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use stricture_core::naming::{to_pascal_case, to_rust_field_name};
use stricture_core::{IntRange, Leaf, NodeId, NodeKind, ObjectField, Schema};

use crate::error::Location;
use crate::{Codegen, CodegenError, TypeRegistry};

const DERIVES: &str = "Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize";

/// Rust code generator
pub struct RustCodegen {
    root_name: Option<String>,
    indent_size: usize,
    location: Location,
}

impl RustCodegen {
    pub fn new() -> Self {
        Self {
            root_name: None,
            indent_size: 4,
            location: Location::default(),
        }
    }

    /// Name for the root, taking precedence over its declared name. A root
    /// that is not itself declared gets a `pub type` alias under this name.
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.indent_size)
    }

    fn declared_name(&self, schema: &Schema, id: NodeId) -> Option<String> {
        if id == schema.root() {
            if let Some(name) = &self.root_name {
                return Some(name.clone());
            }
        }
        schema.node(id).name.clone()
    }

    /// Run `emit` one step deeper in the location trail
    fn nested<T>(
        &mut self,
        step: impl FnOnce(&mut Location),
        emit: impl FnOnce(&mut Self) -> Result<T, CodegenError>,
    ) -> Result<T, CodegenError> {
        let mark = self.location.mark();
        step(&mut self.location);
        let result = emit(self);
        self.location.truncate(mark);
        result
    }

    /// Bare type wrapped in `Option` when the position may be absent or null
    fn type_of(
        &mut self,
        schema: &Schema,
        id: NodeId,
        registry: &mut TypeRegistry,
    ) -> Result<String, CodegenError> {
        let node = schema.node(id);
        let bare = self.bare(schema, id, registry)?;
        if !node.required || node.nullable {
            Ok(format!("Option<{}>", bare))
        } else {
            Ok(bare)
        }
    }

    fn bare(
        &mut self,
        schema: &Schema,
        id: NodeId,
        registry: &mut TypeRegistry,
    ) -> Result<String, CodegenError> {
        match &schema.node(id).kind {
            NodeKind::Leaf(leaf) => self.leaf(leaf),

            NodeKind::Object { fields } => {
                let name = self
                    .declared_name(schema, id)
                    .ok_or_else(|| self.missing_name("object"))?;
                self.declare_struct(schema, &name, fields, None, registry)?;
                Ok(name)
            }

            NodeKind::Array { item, .. } => {
                let item = self.nested(|l| l.items(), |this| this.type_of(schema, *item, registry))?;
                Ok(format!("Vec<{}>", item))
            }

            NodeKind::Tuple { items } => {
                let mut types = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    types.push(self.nested(
                        |l| l.index(index),
                        |this| this.type_of(schema, *item, registry),
                    )?);
                }
                Ok(match types.as_slice() {
                    [single] => format!("({},)", single),
                    _ => format!("({})", types.join(", ")),
                })
            }

            NodeKind::Record { value, .. } => {
                let value = self.nested(|l| l.values(), |this| this.type_of(schema, *value, registry))?;
                Ok(format!("std::collections::HashMap<String, {}>", value))
            }

            NodeKind::Union { alternatives } => {
                let name = self
                    .declared_name(schema, id)
                    .ok_or_else(|| self.missing_name("union"))?;
                self.declare_enum(schema, &name, alternatives, registry)?;
                Ok(name)
            }
        }
    }

    fn leaf(&self, leaf: &Leaf) -> Result<String, CodegenError> {
        let ty = match leaf {
            Leaf::String { .. } | Leaf::Date | Leaf::DateTime { .. } | Leaf::Regex { .. } => {
                "String".to_string()
            }
            Leaf::Integer { range } => integer_type(range).to_string(),
            Leaf::Float { .. } => "f64".to_string(),
            Leaf::Boolean => "bool".to_string(),
            Leaf::Null | Leaf::Undefined => "()".to_string(),
            Leaf::Unknown => "serde_json::Value".to_string(),
            Leaf::Buffer { .. } => {
                return Err(CodegenError::NoNominalRepresentation {
                    kind: leaf.kind_name(),
                    location: self.location.render(),
                })
            }
            Leaf::ExactString { expected } => {
                return Err(CodegenError::StandaloneExactString {
                    value: expected.clone(),
                    location: self.location.render(),
                })
            }
        };
        Ok(ty)
    }

    fn missing_name(&self, kind: &'static str) -> CodegenError {
        CodegenError::MissingName {
            kind,
            location: self.location.render(),
        }
    }

    /// Register `pub struct <name>`, leaving out the `discriminant` field
    fn declare_struct(
        &mut self,
        schema: &Schema,
        name: &str,
        fields: &[ObjectField],
        discriminant: Option<&str>,
        registry: &mut TypeRegistry,
    ) -> Result<(), CodegenError> {
        if registry.resolves(name) {
            return Ok(());
        }

        let fields: Vec<&ObjectField> = fields
            .iter()
            .filter(|field| Some(field.name.as_str()) != discriminant)
            .collect();
        let mut seen: HashMap<String, &str> = HashMap::new();
        for field in &fields {
            let rust_name = to_rust_field_name(&field.name);
            if let Some(first) = seen.insert(rust_name.clone(), &field.name) {
                return Err(CodegenError::DuplicateIdentifier {
                    kind: "field",
                    name: rust_name,
                    first: first.to_string(),
                    second: field.name.clone(),
                    location: self.location.render(),
                });
            }
        }

        let mut body = String::new();
        for field in fields {
            self.nested(
                |l| l.field(&field.name),
                |this| this.struct_field(schema, field, registry, &mut body),
            )?;
        }

        let mut output = String::new();
        writeln!(output, "#[derive({})]", DERIVES)?;
        if body.is_empty() {
            writeln!(output, "pub struct {} {{}}", name)?;
        } else {
            writeln!(output, "pub struct {} {{", name)?;
            output.push_str(&body);
            writeln!(output, "}}")?;
        }
        registry.insert(name, output)?;
        Ok(())
    }

    fn struct_field(
        &mut self,
        schema: &Schema,
        field: &ObjectField,
        registry: &mut TypeRegistry,
        output: &mut String,
    ) -> Result<(), CodegenError> {
        let node = schema.node(field.node);
        let field_type = match &node.kind {
            // Exact-match fields carry a fixed value, a plain String holds it
            NodeKind::Leaf(Leaf::ExactString { .. }) if !node.required => {
                return Err(CodegenError::OptionalExactString {
                    location: self.location.render(),
                })
            }
            NodeKind::Leaf(Leaf::ExactString { .. }) if node.nullable => {
                "Option<String>".to_string()
            }
            NodeKind::Leaf(Leaf::ExactString { .. }) => "String".to_string(),
            _ => self.type_of(schema, field.node, registry)?,
        };

        let indent = self.indent(1);
        let rust_name = to_rust_field_name(&field.name);
        if rust_name.trim_start_matches("r#") != field.name {
            writeln!(output, "{}#[serde(rename = {:?})]", indent, field.name)?;
        }
        if !node.required {
            writeln!(
                output,
                "{}#[serde(skip_serializing_if = \"Option::is_none\")]",
                indent
            )?;
        }
        writeln!(output, "{}pub {}: {},", indent, rust_name, field_type)?;
        Ok(())
    }

    /// Register a tagged enum for a union of discriminated objects
    fn declare_enum(
        &mut self,
        schema: &Schema,
        name: &str,
        alternatives: &[NodeId],
        registry: &mut TypeRegistry,
    ) -> Result<(), CodegenError> {
        if registry.resolves(name) {
            return Ok(());
        }

        let (tag, literals) =
            discriminant(schema, alternatives).ok_or_else(|| CodegenError::UntaggedUnion {
                location: self.location.render(),
            })?;

        let indent = self.indent(1);
        let mut variants = String::new();
        let mut seen: HashMap<String, &str> = HashMap::new();
        for (index, (alternative, literal)) in alternatives.iter().zip(&literals).enumerate() {
            let member = schema.node(*alternative);
            let NodeKind::Object { fields } = &member.kind else {
                return Err(CodegenError::UntaggedUnion {
                    location: self.location.render(),
                });
            };
            let variant = member
                .rename
                .clone()
                .unwrap_or_else(|| to_pascal_case(literal));
            if let Some(first) = seen.insert(variant.clone(), literal) {
                return Err(CodegenError::DuplicateIdentifier {
                    kind: "variant",
                    name: variant,
                    first: first.to_string(),
                    second: literal.to_string(),
                    location: self.location.render(),
                });
            }
            let struct_name = member.name.clone().unwrap_or_else(|| variant.clone());
            if struct_name == name {
                let mut location = self.location.clone();
                location.alternative(index);
                return Err(CodegenError::MemberNamedAfterUnion {
                    name: struct_name,
                    location: location.render(),
                });
            }

            self.nested(
                |l| l.alternative(index),
                |this| this.declare_struct(schema, &struct_name, fields, Some(tag), registry),
            )?;
            writeln!(variants, "{}#[serde(rename = {:?})]", indent, literal)?;
            writeln!(variants, "{}{}({}),", indent, variant, struct_name)?;
        }

        let mut output = String::new();
        writeln!(output, "#[derive({})]", DERIVES)?;
        writeln!(output, "#[serde(tag = {:?})]", tag)?;
        writeln!(output, "pub enum {} {{", name)?;
        output.push_str(&variants);
        writeln!(output, "}}")?;
        registry.insert(name, output)?;
        Ok(())
    }
}

impl Default for RustCodegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen for RustCodegen {
    fn emit(
        &mut self,
        schema: &Schema,
        id: NodeId,
        registry: &mut TypeRegistry,
    ) -> Result<String, CodegenError> {
        self.location = Location::default();
        self.type_of(schema, id, registry)
    }

    fn generate(&mut self, schema: &Schema, registry: &mut TypeRegistry) -> Result<String, CodegenError> {
        let reference = self.emit(schema, schema.root(), registry)?;

        match self.root_name.clone() {
            Some(name) if !registry.contains(&name) => {
                registry.insert(&name, format!("pub type {} = {};\n", name, reference))?;
            }
            Some(_) => {}
            None if registry.is_empty() => {
                return Err(CodegenError::MissingName {
                    kind: schema.root_node().kind.kind_name(),
                    location: Location::default().render(),
                });
            }
            None => {}
        }
        Ok(registry.render())
    }
}

/// Smallest conventional integer type holding the whole range
fn integer_type(range: &IntRange) -> &'static str {
    if range.min >= 0 {
        if range.max <= i64::from(u32::MAX) {
            "u32"
        } else {
            "u64"
        }
    } else if range.min >= i64::from(i32::MIN) && range.max <= i64::from(i32::MAX) {
        "i32"
    } else {
        "i64"
    }
}

/// Shared discriminant of a union: a field every alternative declares as a
/// required exact-match string, with a distinct literal per alternative.
/// Candidates are tried in the first alternative's field order.
fn discriminant<'s>(schema: &'s Schema, alternatives: &[NodeId]) -> Option<(&'s str, Vec<&'s str>)> {
    let first = schema.node(*alternatives.first()?);
    let NodeKind::Object { fields } = &first.kind else {
        return None;
    };

    fields.iter().find_map(|candidate| {
        let tag = candidate.name.as_str();
        let literals = alternatives
            .iter()
            .map(|alt| literal(schema, *alt, tag))
            .collect::<Option<Vec<_>>>()?;
        let mut seen = HashSet::new();
        let distinct = literals.iter().all(|value| seen.insert(*value));
        distinct.then_some((tag, literals))
    })
}

fn literal<'s>(schema: &'s Schema, id: NodeId, field: &str) -> Option<&'s str> {
    let field = schema.node(schema.node(id).field(field)?);
    if !field.required || field.nullable {
        return None;
    }
    match &field.kind {
        NodeKind::Leaf(Leaf::ExactString { expected }) => Some(expected.as_str()),
        _ => None,
    }
}
