//! Node arena and the builder used to author schemas

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::error::CoreError;
use crate::types::{
    DateTimeFormat, FloatRange, IntRange, Leaf, LengthBounds, Node, NodeKind, ObjectField,
    Pattern, Variant,
};

/// Index of a node inside a [`Schema`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// An immutable validator tree stored as an arena.
///
/// Children always have smaller ids than their parents, so the arena is a
/// DAG by construction: sub-nodes may be shared, never cyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Schema {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node lookup.
    ///
    /// Ids handed out by the builder that produced this schema are always
    /// valid; an id from another builder panics.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builder for [`Schema`] arenas.
///
/// Leaf and composite constructors return the new node's id. Variant helpers
/// (`optional`, `nullable`, ...) copy an existing node with different
/// presence flags, so "required X" and "optional X" share everything but the
/// presence check.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<Node>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn leaf(&mut self, leaf: Leaf) -> NodeId {
        self.push(Node::leaf(leaf))
    }

    // --- Leaves ---

    pub fn string(&mut self) -> NodeId {
        self.string_len(LengthBounds::default())
    }

    pub fn string_len(&mut self, length: LengthBounds) -> NodeId {
        self.leaf(Leaf::String { length })
    }

    pub fn integer(&mut self) -> NodeId {
        self.integer_range(IntRange::default())
    }

    pub fn integer_range(&mut self, range: IntRange) -> NodeId {
        self.leaf(Leaf::Integer { range })
    }

    pub fn float(&mut self) -> NodeId {
        self.float_range(FloatRange::default())
    }

    pub fn float_range(&mut self, range: FloatRange) -> NodeId {
        self.leaf(Leaf::Float { range })
    }

    pub fn boolean(&mut self) -> NodeId {
        self.leaf(Leaf::Boolean)
    }

    pub fn null(&mut self) -> NodeId {
        self.leaf(Leaf::Null)
    }

    pub fn undefined(&mut self) -> NodeId {
        self.leaf(Leaf::Undefined)
    }

    pub fn date(&mut self) -> NodeId {
        self.leaf(Leaf::Date)
    }

    pub fn datetime(&mut self) -> NodeId {
        self.leaf(Leaf::DateTime {
            format: DateTimeFormat::Rfc3339,
        })
    }

    pub fn timestamp(&mut self) -> NodeId {
        self.leaf(Leaf::DateTime {
            format: DateTimeFormat::Lenient,
        })
    }

    pub fn exact(&mut self, expected: impl Into<String>) -> NodeId {
        self.leaf(Leaf::ExactString {
            expected: expected.into(),
        })
    }

    pub fn regex(&mut self, source: &str) -> Result<NodeId, CoreError> {
        let pattern = Pattern::new(source)?;
        Ok(self.leaf(Leaf::Regex { pattern }))
    }

    pub fn unknown(&mut self) -> NodeId {
        self.leaf(Leaf::Unknown)
    }

    pub fn buffer(&mut self) -> NodeId {
        self.buffer_len(LengthBounds::default())
    }

    pub fn buffer_len(&mut self, length: LengthBounds) -> NodeId {
        self.leaf(Leaf::Buffer { length })
    }

    // --- Composites ---

    pub fn object<I, S>(&mut self, fields: I) -> NodeId
    where
        I: IntoIterator<Item = (S, NodeId)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, node)| ObjectField {
                name: name.into(),
                node,
            })
            .collect();
        self.push(Node::new(NodeKind::Object { fields }))
    }

    pub fn array(&mut self, item: NodeId) -> NodeId {
        self.array_len(item, LengthBounds::default())
    }

    pub fn array_len(&mut self, item: NodeId, length: LengthBounds) -> NodeId {
        self.push(Node::new(NodeKind::Array { item, length }))
    }

    pub fn tuple(&mut self, items: impl IntoIterator<Item = NodeId>) -> NodeId {
        let items = items.into_iter().collect();
        self.push(Node::new(NodeKind::Tuple { items }))
    }

    pub fn record(&mut self, value: NodeId) -> NodeId {
        self.record_len(value, LengthBounds::default())
    }

    pub fn record_len(&mut self, value: NodeId, keys: LengthBounds) -> NodeId {
        self.push(Node::new(NodeKind::Record { value, keys }))
    }

    pub fn union(&mut self, alternatives: impl IntoIterator<Item = NodeId>) -> NodeId {
        let alternatives = alternatives.into_iter().collect();
        self.push(Node::new(NodeKind::Union { alternatives }))
    }

    // --- Variants ---

    /// Copy `id` with the given presence flags. Unknown ids are caught by
    /// [`SchemaBuilder::finish`].
    pub fn variant(&mut self, id: NodeId, variant: Variant) -> NodeId {
        match self.nodes.get(id.index()) {
            Some(node) => {
                let copy = node.with_variant(variant);
                self.push(copy)
            }
            None => id,
        }
    }

    pub fn required(&mut self, id: NodeId) -> NodeId {
        self.variant(id, Variant::Required)
    }

    pub fn optional(&mut self, id: NodeId) -> NodeId {
        self.variant(id, Variant::Optional)
    }

    pub fn nullable(&mut self, id: NodeId) -> NodeId {
        self.variant(id, Variant::Nullable)
    }

    pub fn optional_nullable(&mut self, id: NodeId) -> NodeId {
        self.variant(id, Variant::OptionalNullable)
    }

    // --- Naming metadata ---

    /// Attach a declared type name to an object or union node
    pub fn named(&mut self, id: NodeId, name: impl Into<String>) -> NodeId {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.name = Some(name.into());
        }
        id
    }

    /// Override the variant name used when this node is a tagged-union member
    pub fn renamed(&mut self, id: NodeId, rename: impl Into<String>) -> NodeId {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.rename = Some(rename.into());
        }
        id
    }

    /// Check the arena and freeze it with `root` as entry point
    pub fn finish(self, root: NodeId) -> Result<Schema, CoreError> {
        if root.index() >= self.nodes.len() {
            return Err(CoreError::UnknownNode(root));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            let id = NodeId(idx as u32);
            for child in node.kind.children() {
                if child.index() >= self.nodes.len() {
                    return Err(CoreError::UnknownNode(child));
                }
                if child.index() >= idx {
                    return Err(CoreError::InvalidSchema(format!(
                        "{} refers to {} which was declared after it",
                        id, child
                    )));
                }
            }
            check_node(id, node)?;
        }

        debug!(nodes = self.nodes.len(), %root, "schema finished");
        Ok(Schema {
            nodes: self.nodes,
            root,
        })
    }
}

fn check_node(id: NodeId, node: &Node) -> Result<(), CoreError> {
    let invalid = |reason: String| CoreError::InvalidBounds { node: id, reason };

    match &node.kind {
        NodeKind::Leaf(Leaf::String { length })
        | NodeKind::Leaf(Leaf::Buffer { length })
        | NodeKind::Array { length, .. }
        | NodeKind::Record { keys: length, .. } => {
            if length.min > length.max {
                return Err(invalid(format!(
                    "minimum length {} exceeds maximum {}",
                    length.min, length.max
                )));
            }
        }
        NodeKind::Leaf(Leaf::Integer { range }) => {
            if range.min > range.max {
                return Err(invalid(format!(
                    "minimum {} exceeds maximum {}",
                    range.min, range.max
                )));
            }
        }
        NodeKind::Leaf(Leaf::Float { range }) => {
            if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
                return Err(invalid(format!(
                    "minimum {} exceeds maximum {}",
                    range.min, range.max
                )));
            }
        }
        NodeKind::Object { fields } => {
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(CoreError::InvalidSchema(format!(
                        "{} declares field '{}' twice",
                        id, field.name
                    )));
                }
            }
        }
        NodeKind::Union { alternatives } => {
            if alternatives.is_empty() {
                return Err(CoreError::InvalidSchema(format!(
                    "{} is a union without alternatives",
                    id
                )));
            }
        }
        NodeKind::Leaf(_) | NodeKind::Tuple { .. } => {}
    }

    Ok(())
}
