//! Structural emitter: inline TypeScript type expressions

use std::fmt::Write;

use stricture_core::naming::is_plain_identifier;
use stricture_core::{Leaf, LengthBounds, NodeId, NodeKind, Schema};

use crate::{Codegen, CodegenError, TypeRegistry};

/// Arrays with a lower bound up to this size are spelled out as tuples
const MAX_UNROLLED_ITEMS: u64 = 8;

pub struct TypeScriptCodegen {
    root_name: Option<String>,
    indent_size: usize,
}

impl TypeScriptCodegen {
    pub fn new() -> Self {
        Self {
            root_name: None,
            indent_size: 2,
        }
    }

    /// Export the root as `export type <name> = ...`, overriding any declared name
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.indent_size)
    }

    /// Type expression for `id` including its `undefined`/`null` alternatives
    pub fn expression(&self, schema: &Schema, id: NodeId, level: usize) -> Result<String, CodegenError> {
        let node = schema.node(id);
        let mut expr = self.bare(schema, &node.kind, level)?;
        if !node.required && expr != "undefined" {
            expr.push_str(" | undefined");
        }
        if node.nullable && expr != "null" {
            expr.push_str(" | null");
        }
        Ok(expr)
    }

    fn bare(&self, schema: &Schema, kind: &NodeKind, level: usize) -> Result<String, CodegenError> {
        let expr = match kind {
            NodeKind::Leaf(leaf) => leaf_keyword(leaf),

            NodeKind::Object { fields } if fields.is_empty() => "{}".to_string(),
            NodeKind::Object { fields } => {
                let mut output = String::from("{\n");
                for field in fields {
                    let key = if is_plain_identifier(&field.name) {
                        field.name.clone()
                    } else {
                        quote(&field.name)
                    };
                    writeln!(
                        output,
                        "{}{}: {};",
                        self.indent(level + 1),
                        key,
                        self.expression(schema, field.node, level + 1)?
                    )?;
                }
                write!(output, "{}}}", self.indent(level))?;
                output
            }

            NodeKind::Array { item, length } => {
                let item = self.expression(schema, *item, level)?;
                bounded_array(&item, length)
            }

            NodeKind::Tuple { items } => {
                let items = items
                    .iter()
                    .map(|item| self.expression(schema, *item, level))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("[{}]", items.join(", "))
            }

            NodeKind::Record { value, .. } => {
                format!("Record<string, {}>", self.expression(schema, *value, level)?)
            }

            NodeKind::Union { alternatives } => alternatives
                .iter()
                .map(|alt| self.expression(schema, *alt, level))
                .collect::<Result<Vec<_>, _>>()?
                .join(" | "),
        };
        Ok(expr)
    }
}

impl Default for TypeScriptCodegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen for TypeScriptCodegen {
    fn emit(
        &mut self,
        schema: &Schema,
        id: NodeId,
        _registry: &mut TypeRegistry,
    ) -> Result<String, CodegenError> {
        self.expression(schema, id, 0)
    }

    /// `export type Name = ...;` when the root has a name, the bare
    /// expression otherwise
    fn generate(&mut self, schema: &Schema, registry: &mut TypeRegistry) -> Result<String, CodegenError> {
        let name = self
            .root_name
            .clone()
            .or_else(|| schema.root_node().name.clone());

        let Some(name) = name else {
            return self.emit(schema, schema.root(), registry);
        };
        if !registry.resolves(&name) {
            let expr = self.emit(schema, schema.root(), registry)?;
            registry.insert(&name, format!("export type {} = {};\n", name, expr))?;
        }
        Ok(registry.render())
    }
}

fn leaf_keyword(leaf: &Leaf) -> String {
    match leaf {
        Leaf::String { .. } | Leaf::Date | Leaf::DateTime { .. } | Leaf::Regex { .. } => {
            "string".to_string()
        }
        Leaf::Integer { .. } | Leaf::Float { .. } => "number".to_string(),
        Leaf::Boolean => "boolean".to_string(),
        Leaf::Null => "null".to_string(),
        Leaf::Undefined => "undefined".to_string(),
        Leaf::Unknown => "unknown".to_string(),
        Leaf::Buffer { .. } => "Buffer".to_string(),
        Leaf::ExactString { expected } => quote(expected),
    }
}

/// Single-quoted string literal
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\'' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// `Array<T>`, or a tuple form when the length bounds pin down a small prefix
fn bounded_array(item: &str, length: &LengthBounds) -> String {
    if length.min > MAX_UNROLLED_ITEMS {
        return format!("Array<{}>", item);
    }
    let prefix = vec![item; length.min as usize];
    if length.upper() == Some(length.min) {
        format!("[{}]", prefix.join(", "))
    } else if length.min > 0 {
        format!("[{}, ...Array<{}>]", prefix.join(", "), item)
    } else {
        format!("Array<{}>", item)
    }
}
