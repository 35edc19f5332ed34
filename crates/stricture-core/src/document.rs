//! Serializable schema documents.
//!
//! A [`SchemaDef`] is the tree form of a schema as it appears in JSON or YAML
//! files. [`SchemaDef::build`] lowers it into the [`Schema`] arena.
//!
//! ```yaml
//! kind: object
//! name: GpsReading
//! fields:
//!   latitude: { kind: float, minimum: -90, maximum: 90 }
//!   label: { kind: string, optional: true }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::schema::{NodeId, Schema, SchemaBuilder};
use crate::types::{
    DateTimeFormat, FloatRange, IntRange, Leaf, LengthBounds, Node, NodeKind, ObjectField,
    Pattern, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER,
};

fn is_false(value: &bool) -> bool {
    !*value
}

/// One node of a schema document: a kind plus presence flags and naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(flatten)]
    pub ty: TypeDef,

    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u64>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    Boolean,
    Null,
    Undefined,
    Date,
    DateTime {
        #[serde(default)]
        format: DateTimeFormat,
    },
    Exact {
        value: String,
    },
    Regex {
        pattern: String,
    },
    Unknown,
    Buffer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u64>,
    },
    Object {
        #[serde(default)]
        fields: IndexMap<String, SchemaDef>,
    },
    Array {
        items: Box<SchemaDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<u64>,
    },
    Tuple {
        items: Vec<SchemaDef>,
    },
    Record {
        values: Box<SchemaDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_keys: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_keys: Option<u64>,
    },
    Union {
        any_of: Vec<SchemaDef>,
    },
}

impl From<TypeDef> for SchemaDef {
    fn from(ty: TypeDef) -> Self {
        SchemaDef {
            ty,
            optional: false,
            nullable: false,
            name: None,
            rename: None,
        }
    }
}

fn length(min: Option<u64>, max: Option<u64>) -> LengthBounds {
    let defaults = LengthBounds::default();
    LengthBounds::new(min.unwrap_or(defaults.min), max.unwrap_or(defaults.max))
}

impl SchemaDef {
    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, CoreError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn to_json_string(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lower the document into a finished [`Schema`]
    pub fn build(&self) -> Result<Schema, CoreError> {
        let mut builder = SchemaBuilder::new();
        let root = self.lower(&mut builder)?;
        debug!(%root, "lowered schema document");
        builder.finish(root)
    }

    fn lower(&self, builder: &mut SchemaBuilder) -> Result<NodeId, CoreError> {
        let kind = match &self.ty {
            TypeDef::String {
                min_length,
                max_length,
            } => NodeKind::Leaf(Leaf::String {
                length: length(*min_length, *max_length),
            }),
            TypeDef::Integer { minimum, maximum } => NodeKind::Leaf(Leaf::Integer {
                range: IntRange::new(
                    minimum.unwrap_or(MIN_SAFE_INTEGER),
                    maximum.unwrap_or(MAX_SAFE_INTEGER),
                ),
            }),
            TypeDef::Float { minimum, maximum } => NodeKind::Leaf(Leaf::Float {
                range: FloatRange::new(
                    minimum.unwrap_or(MIN_SAFE_INTEGER as f64),
                    maximum.unwrap_or(MAX_SAFE_INTEGER as f64),
                ),
            }),
            TypeDef::Boolean => NodeKind::Leaf(Leaf::Boolean),
            TypeDef::Null => NodeKind::Leaf(Leaf::Null),
            TypeDef::Undefined => NodeKind::Leaf(Leaf::Undefined),
            TypeDef::Date => NodeKind::Leaf(Leaf::Date),
            TypeDef::DateTime { format } => NodeKind::Leaf(Leaf::DateTime { format: *format }),
            TypeDef::Exact { value } => NodeKind::Leaf(Leaf::ExactString {
                expected: value.clone(),
            }),
            TypeDef::Regex { pattern } => NodeKind::Leaf(Leaf::Regex {
                pattern: Pattern::new(pattern)?,
            }),
            TypeDef::Unknown => NodeKind::Leaf(Leaf::Unknown),
            TypeDef::Buffer {
                min_length,
                max_length,
            } => NodeKind::Leaf(Leaf::Buffer {
                length: length(*min_length, *max_length),
            }),
            TypeDef::Object { fields } => {
                let mut lowered = Vec::with_capacity(fields.len());
                for (name, def) in fields {
                    lowered.push(ObjectField {
                        name: name.clone(),
                        node: def.lower(builder)?,
                    });
                }
                NodeKind::Object { fields: lowered }
            }
            TypeDef::Array {
                items,
                min_items,
                max_items,
            } => NodeKind::Array {
                item: items.lower(builder)?,
                length: length(*min_items, *max_items),
            },
            TypeDef::Tuple { items } => NodeKind::Tuple {
                items: items
                    .iter()
                    .map(|item| item.lower(builder))
                    .collect::<Result<_, _>>()?,
            },
            TypeDef::Record {
                values,
                min_keys,
                max_keys,
            } => NodeKind::Record {
                value: values.lower(builder)?,
                keys: length(*min_keys, *max_keys),
            },
            TypeDef::Union { any_of } => NodeKind::Union {
                alternatives: any_of
                    .iter()
                    .map(|alt| alt.lower(builder))
                    .collect::<Result<_, _>>()?,
            },
        };

        let mut node = Node::new(kind);
        node.required = node.required && !self.optional;
        node.nullable = self.nullable;
        node.name = self.name.clone();
        node.rename = self.rename.clone();
        Ok(builder.push(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_document_builds() -> Result<(), Box<dyn std::error::Error>> {
        let def = SchemaDef::from_json_str(
            r#"{
                "kind": "object",
                "name": "Position",
                "fields": {
                    "latitude": { "kind": "float", "minimum": -90, "maximum": 90 },
                    "longitude": { "kind": "float", "minimum": -180, "maximum": 180 },
                    "label": { "kind": "string", "optional": true, "nullable": true }
                }
            }"#,
        )?;
        let schema = def.build()?;
        let root = schema.root_node();
        assert_eq!(root.name.as_deref(), Some("Position"));

        let label = root.field("label").ok_or("missing label")?;
        assert!(!schema.node(label).required);
        assert!(schema.node(label).nullable);

        let latitude = root.field("latitude").ok_or("missing latitude")?;
        assert_eq!(
            schema.node(latitude).kind,
            NodeKind::Leaf(Leaf::Float {
                range: FloatRange::new(-90.0, 90.0)
            })
        );
        Ok(())
    }

    #[test]
    fn test_yaml_document_keeps_field_order() -> Result<(), Box<dyn std::error::Error>> {
        let def = SchemaDef::from_yaml_str(
            r#"
kind: object
fields:
  zeta: { kind: boolean }
  alpha: { kind: integer, minimum: 0 }
  mid:
    kind: array
    items: { kind: date }
    min_items: 1
"#,
        )?;
        let schema = def.build()?;
        let names: Vec<_> = match &schema.root_node().kind {
            NodeKind::Object { fields } => fields.iter().map(|f| f.name.clone()).collect(),
            other => return Err(format!("expected object, got {:?}", other).into()),
        };
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        Ok(())
    }

    #[test]
    fn test_datetime_format_defaults_to_rfc3339() -> Result<(), Box<dyn std::error::Error>> {
        let strict = SchemaDef::from_json_str(r#"{ "kind": "date_time" }"#)?;
        assert_eq!(
            strict.ty,
            TypeDef::DateTime {
                format: DateTimeFormat::Rfc3339
            }
        );
        let lenient =
            SchemaDef::from_json_str(r#"{ "kind": "date_time", "format": "lenient" }"#)?;
        assert_eq!(
            lenient.ty,
            TypeDef::DateTime {
                format: DateTimeFormat::Lenient
            }
        );
        Ok(())
    }

    #[test]
    fn test_optional_undefined_stays_optional() -> Result<(), Box<dyn std::error::Error>> {
        let schema = SchemaDef::from(TypeDef::Undefined).build()?;
        assert!(!schema.root_node().required);
        Ok(())
    }

    #[test]
    fn test_bad_documents() {
        assert!(matches!(
            SchemaDef::from_json_str(r#"{ "kind": "regex", "pattern": "([" }"#)
                .and_then(|d| d.build()),
            Err(CoreError::InvalidPattern { .. })
        ));
        assert!(matches!(
            SchemaDef::from_json_str(r#"{ "kind": "quaternion" }"#),
            Err(CoreError::Document(_))
        ));
        assert!(matches!(
            SchemaDef::from_json_str(r#"{ "kind": "union", "any_of": [] }"#)
                .and_then(|d| d.build()),
            Err(CoreError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_serialization_skips_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let def = SchemaDef {
            optional: true,
            ..SchemaDef::from(TypeDef::Boolean)
        };
        let json: serde_json::Value = serde_json::from_str(&def.to_json_string()?)?;
        assert_eq!(
            json,
            serde_json::json!({ "kind": "boolean", "optional": true })
        );
        Ok(())
    }
}
