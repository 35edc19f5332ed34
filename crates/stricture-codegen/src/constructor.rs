//! Constructor text: the schema printed back in authoring form.
//!
//! Calls mirror the [`stricture_core::SchemaBuilder`] methods. Options are
//! printed only when they differ from the defaults, so an unbounded string
//! is just `string()`.

use std::fmt::{Display, Write};

use stricture_core::naming::is_plain_identifier;
use stricture_core::{DateTimeFormat, Leaf, NodeId, NodeKind, Schema, Variant};

use crate::{Codegen, CodegenError, TypeRegistry};

pub struct ConstructorCodegen {
    indent_size: usize,
}

impl ConstructorCodegen {
    pub fn new() -> Self {
        Self { indent_size: 2 }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.indent_size)
    }

    pub fn render(&self, schema: &Schema, id: NodeId, level: usize) -> Result<String, CodegenError> {
        let node = schema.node(id);
        let mut text = match &node.kind {
            NodeKind::Leaf(leaf) => leaf_call(leaf),

            NodeKind::Object { fields } if fields.is_empty() => "object({})".to_string(),
            NodeKind::Object { fields } => {
                let mut output = String::from("object({\n");
                for field in fields {
                    let key = if is_plain_identifier(&field.name) {
                        field.name.clone()
                    } else {
                        format!("{:?}", field.name)
                    };
                    writeln!(
                        output,
                        "{}{}: {},",
                        self.indent(level + 1),
                        key,
                        self.render(schema, field.node, level + 1)?
                    )?;
                }
                write!(output, "{}}})", self.indent(level))?;
                output
            }

            NodeKind::Array { item, length } => call(
                "array",
                Some(self.render(schema, *item, level)?),
                &[("min", length.lower()), ("max", length.upper())],
            ),

            NodeKind::Tuple { items } => {
                format!("tuple([{}])", self.render_all(schema, items, level)?.join(", "))
            }

            NodeKind::Record { value, keys } => call(
                "record",
                Some(self.render(schema, *value, level)?),
                &[("min", keys.lower()), ("max", keys.upper())],
            ),

            NodeKind::Union { alternatives } => {
                format!("union([{}])", self.render_all(schema, alternatives, level)?.join(", "))
            }
        };

        // undefined() is optional out of the box
        let default_required = !matches!(node.kind, NodeKind::Leaf(Leaf::Undefined));
        if node.variant() != Variant::from_flags(default_required, false) {
            text = format!("{}({})", wrapper(node.variant()), text);
        }
        if let Some(name) = &node.name {
            write!(text, ".named({:?})", name)?;
        }
        if let Some(rename) = &node.rename {
            write!(text, ".rename({:?})", rename)?;
        }
        Ok(text)
    }

    fn render_all(&self, schema: &Schema, ids: &[NodeId], level: usize) -> Result<Vec<String>, CodegenError> {
        ids.iter().map(|id| self.render(schema, *id, level)).collect()
    }
}

impl Default for ConstructorCodegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen for ConstructorCodegen {
    fn emit(
        &mut self,
        schema: &Schema,
        id: NodeId,
        _registry: &mut TypeRegistry,
    ) -> Result<String, CodegenError> {
        self.render(schema, id, 0)
    }

    fn generate(&mut self, schema: &Schema, registry: &mut TypeRegistry) -> Result<String, CodegenError> {
        self.emit(schema, schema.root(), registry)
    }
}

fn wrapper(variant: Variant) -> &'static str {
    match variant {
        Variant::Required => "required",
        Variant::Optional => "optional",
        Variant::Nullable => "nullable",
        Variant::OptionalNullable => "optional_nullable",
    }
}

/// `name(arg, { key: value })`, dropping the options block when empty
fn call<T: Display>(name: &str, arg: Option<String>, options: &[(&str, Option<T>)]) -> String {
    let options: Vec<String> = options
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|value| format!("{}: {}", key, value)))
        .collect();

    let mut args: Vec<String> = arg.into_iter().collect();
    if !options.is_empty() {
        args.push(format!("{{ {} }}", options.join(", ")));
    }
    format!("{}({})", name, args.join(", "))
}

fn leaf_call(leaf: &Leaf) -> String {
    match leaf {
        Leaf::String { length } => call(
            "string",
            None,
            &[("min_length", length.lower()), ("max_length", length.upper())],
        ),
        Leaf::Integer { range } => call("integer", None, &[("min", range.lower()), ("max", range.upper())]),
        Leaf::Float { range } => call("float", None, &[("min", range.lower()), ("max", range.upper())]),
        Leaf::Boolean => "boolean()".to_string(),
        Leaf::Null => "null()".to_string(),
        Leaf::Undefined => "undefined()".to_string(),
        Leaf::Date => "date()".to_string(),
        Leaf::DateTime {
            format: DateTimeFormat::Rfc3339,
        } => "datetime()".to_string(),
        Leaf::DateTime {
            format: DateTimeFormat::Lenient,
        } => "timestamp()".to_string(),
        Leaf::ExactString { expected } => format!("exact({:?})", expected),
        Leaf::Regex { pattern } => format!("regex({:?})", pattern.as_str()),
        Leaf::Unknown => "unknown()".to_string(),
        Leaf::Buffer { length } => call(
            "buffer",
            None,
            &[("min_length", length.lower()), ("max_length", length.upper())],
        ),
    }
}
