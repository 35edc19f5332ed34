//! The presence gate and the recursive interpreter.
//!
//! The interpreter is the reference semantics: the compiled routine must
//! produce exactly the failures this walk produces, in the same order.

use serde_json::Value;
use stricture_core::{Leaf, NodeId, NodeKind, Schema};

use crate::errors::ValidationFailure;
use crate::leaf;
use crate::path::{self, Segment};
use crate::template::{self, Template};

/// What a union reports when none of its alternatives matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnionFailureMode {
    /// One CompositeMismatch failure at the union's path
    #[default]
    Synthesized,
    /// Every alternative's failures, in alternative order
    All,
}

/// Per-call validation options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Context name prefixed to every failure path
    pub path: String,
    /// Stop at the first failure
    pub early_fail: bool,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn early_fail(mut self) -> Self {
        self.early_fail = true;
        self
    }
}

/// Outcome of the presence gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Run the node's shape checks
    Check,
    /// Accept without further checks
    Skip,
    /// Report Required and stop
    Missing,
}

/// Decide whether a value reaches a node's shape checks.
///
/// Absent values are Required when the node is required and accepted
/// otherwise. `null` is accepted by nullable nodes. Leaves that describe null
/// themselves (`null`, `undefined`, `unknown`) and unions with such an
/// alternative get to inspect it. Anything else treats it like an absent value.
pub fn presence(required: bool, nullable: bool, null_is_value: bool, value: Option<&Value>) -> Presence {
    match value {
        None if required => Presence::Missing,
        None => Presence::Skip,
        Some(Value::Null) if nullable => Presence::Skip,
        Some(Value::Null) if null_is_value => Presence::Check,
        Some(Value::Null) if required => Presence::Missing,
        Some(Value::Null) => Presence::Skip,
        Some(_) => Presence::Check,
    }
}

/// Whether `null` reaches the node's own checks instead of the generic gate.
/// A union lets it through when one of its alternatives would accept it.
pub(crate) fn null_is_value(schema: &Schema, id: NodeId) -> bool {
    match &schema.node(id).kind {
        NodeKind::Leaf(leaf) => leaf.inspects_null(),
        NodeKind::Union { alternatives } => alternatives
            .iter()
            .any(|alt| schema.node(*alt).nullable || null_is_value(schema, *alt)),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    Halted,
}

/// Recursive reference interpreter over a schema arena
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'s> {
    schema: &'s Schema,
    union_failures: UnionFailureMode,
}

impl<'s> Interpreter<'s> {
    pub fn new(schema: &'s Schema, union_failures: UnionFailureMode) -> Self {
        Self {
            schema,
            union_failures,
        }
    }

    pub fn run(&self, value: Option<&Value>, options: &ValidateOptions) -> Vec<ValidationFailure> {
        let mut out = Vec::new();
        self.node(
            self.schema.root(),
            value,
            &options.path,
            &mut out,
            options.early_fail,
        );
        out
    }

    fn raise(
        &self,
        template: &Template,
        value: Option<&Value>,
        found: Option<usize>,
        path: &str,
        out: &mut Vec<ValidationFailure>,
        halt: bool,
    ) -> Outcome {
        out.push(template.instantiate(value, found, path.to_string()));
        if halt {
            Outcome::Halted
        } else {
            Outcome::Continue
        }
    }

    fn node(
        &self,
        id: NodeId,
        value: Option<&Value>,
        path: &str,
        out: &mut Vec<ValidationFailure>,
        halt: bool,
    ) -> Outcome {
        let node = self.schema.node(id);
        let value = match presence(
            node.required,
            node.nullable,
            null_is_value(self.schema, id),
            value,
        ) {
            Presence::Missing => {
                return self.raise(&template::required(), value, None, path, out, halt);
            }
            Presence::Skip => return Outcome::Continue,
            Presence::Check => match value {
                Some(value) => value,
                None => return Outcome::Continue,
            },
        };

        match &node.kind {
            NodeKind::Leaf(leaf) => self.leaf(leaf, value, path, out, halt),

            NodeKind::Object { fields } => {
                let Value::Object(map) = value else {
                    return self.raise(&template::not_object(), Some(value), None, path, out, halt);
                };
                for field in fields {
                    let child = path::join(path, Segment::Key(&field.name));
                    if self.node(field.node, map.get(&field.name), &child, out, halt) == Outcome::Halted {
                        return Outcome::Halted;
                    }
                }
                Outcome::Continue
            }

            NodeKind::Array { item, length } => {
                let Value::Array(items) = value else {
                    return self.raise(&template::not_array(), Some(value), None, path, out, halt);
                };
                if !length.contains(items.len()) {
                    let t = template::length(length, "items");
                    return self.raise(&t, Some(value), Some(items.len()), path, out, halt);
                }
                for (index, element) in items.iter().enumerate() {
                    let child = path::join(path, Segment::Index(index));
                    if self.node(*item, Some(element), &child, out, halt) == Outcome::Halted {
                        return Outcome::Halted;
                    }
                }
                Outcome::Continue
            }

            NodeKind::Tuple { items } => {
                let Value::Array(elements) = value else {
                    return self.raise(&template::not_array(), Some(value), None, path, out, halt);
                };
                if elements.len() != items.len() {
                    let t = template::tuple_arity(items.len());
                    return self.raise(&t, Some(value), Some(elements.len()), path, out, halt);
                }
                for (index, (item, element)) in items.iter().zip(elements).enumerate() {
                    let child = path::join(path, Segment::Index(index));
                    if self.node(*item, Some(element), &child, out, halt) == Outcome::Halted {
                        return Outcome::Halted;
                    }
                }
                Outcome::Continue
            }

            NodeKind::Record { value: item, keys } => {
                let Value::Object(map) = value else {
                    return self.raise(&template::not_object(), Some(value), None, path, out, halt);
                };
                if !keys.contains(map.len()) {
                    let t = template::length(keys, "keys");
                    return self.raise(&t, Some(value), Some(map.len()), path, out, halt);
                }
                for (key, element) in map {
                    let child = path::join(path, Segment::Key(key));
                    if self.node(*item, Some(element), &child, out, halt) == Outcome::Halted {
                        return Outcome::Halted;
                    }
                }
                Outcome::Continue
            }

            NodeKind::Union { alternatives } => {
                self.union(alternatives, value, path, out, halt)
            }
        }
    }

    fn leaf(
        &self,
        leaf: &Leaf,
        value: &Value,
        path: &str,
        out: &mut Vec<ValidationFailure>,
        halt: bool,
    ) -> Outcome {
        let Some(violation) = leaf::check(leaf, value) else {
            return Outcome::Continue;
        };
        match leaf::template(leaf, violation.class) {
            Some(t) => self.raise(&t, Some(value), violation.found, path, out, halt),
            None => Outcome::Continue,
        }
    }

    fn union(
        &self,
        alternatives: &[NodeId],
        value: &Value,
        path: &str,
        out: &mut Vec<ValidationFailure>,
        halt: bool,
    ) -> Outcome {
        let mark = out.len();
        let synthesized = self.union_failures == UnionFailureMode::Synthesized;
        // Only pass/fail matters for a synthesized report
        let alt_halt = halt || synthesized;

        for alternative in alternatives {
            let alt_mark = out.len();
            self.node(*alternative, Some(value), path, out, alt_halt);
            if out.len() == alt_mark {
                out.truncate(mark);
                return Outcome::Continue;
            }
        }

        if synthesized {
            out.truncate(mark);
            let t = template::union_mismatch(alternatives.len());
            return self.raise(&t, Some(value), None, path, out, halt);
        }

        if halt {
            out.truncate(mark + 1);
            Outcome::Halted
        } else {
            Outcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use serde_json::json;
    use stricture_core::{FloatRange, LengthBounds, SchemaBuilder};

    fn kinds(failures: &[ValidationFailure]) -> Vec<FailureKind> {
        failures.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_presence_gate() {
        use Presence::*;
        let null = json!(null);
        let one = json!(1);

        assert_eq!(presence(true, false, false, None), Missing);
        assert_eq!(presence(false, false, false, None), Skip);
        assert_eq!(presence(true, true, false, None), Missing);
        assert_eq!(presence(false, true, false, None), Skip);

        assert_eq!(presence(true, false, false, Some(&null)), Missing);
        assert_eq!(presence(false, false, false, Some(&null)), Skip);
        assert_eq!(presence(true, true, false, Some(&null)), Skip);
        assert_eq!(presence(true, false, true, Some(&null)), Check);

        assert_eq!(presence(true, false, false, Some(&one)), Check);
    }

    #[test]
    fn test_nested_path() -> Result<(), Box<dyn std::error::Error>> {
        let mut b = SchemaBuilder::new();
        let lon = b.float_range(FloatRange::new(-180.0, 180.0));
        let position = b.object([("longitude", lon)]);
        let root = b.object([("position", position)]);
        let schema = b.finish(root)?;

        let interp = Interpreter::new(&schema, UnionFailureMode::default());
        let failures = interp.run(
            Some(&json!({"position": {"longitude": -181}})),
            &ValidateOptions::new(),
        );
        assert_eq!(kinds(&failures), vec![FailureKind::OutOfRange]);
        assert_eq!(failures[0].path, "position['longitude']");
        assert_eq!(failures[0].value, Some(json!(-181)));
        Ok(())
    }

    #[test]
    fn test_structural_gate_skips_children() -> Result<(), Box<dyn std::error::Error>> {
        let mut b = SchemaBuilder::new();
        let item = b.boolean();
        let root = b.array_len(item, LengthBounds::new(2, 10));
        let schema = b.finish(root)?;
        let interp = Interpreter::new(&schema, UnionFailureMode::default());

        let failures = interp.run(Some(&json!(["nope"])), &ValidateOptions::new());
        assert_eq!(kinds(&failures), vec![FailureKind::WrongLength]);
        assert_eq!(
            failures[0].message,
            "Must contain between 2 and 10 items (found 1)"
        );

        let failures = interp.run(Some(&json!([1, true, "x"])), &ValidateOptions::new());
        assert_eq!(
            failures.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            vec!["[0]", "[2]"]
        );
        Ok(())
    }

    #[test]
    fn test_union_modes() -> Result<(), Box<dyn std::error::Error>> {
        let mut b = SchemaBuilder::new();
        let s = b.string();
        let i = b.integer();
        let root = b.union([s, i]);
        let schema = b.finish(root)?;

        let synthesized = Interpreter::new(&schema, UnionFailureMode::Synthesized);
        let failures = synthesized.run(Some(&json!(true)), &ValidateOptions::new());
        assert_eq!(kinds(&failures), vec![FailureKind::CompositeMismatch]);
        assert_eq!(failures[0].message, "Must match one of 2 alternatives");

        let all = Interpreter::new(&schema, UnionFailureMode::All);
        let failures = all.run(Some(&json!(true)), &ValidateOptions::new());
        assert_eq!(
            kinds(&failures),
            vec![FailureKind::NotString, FailureKind::NotInteger]
        );

        let failures = all.run(Some(&json!(true)), &ValidateOptions::new().early_fail());
        assert_eq!(kinds(&failures), vec![FailureKind::NotString]);

        assert!(all.run(Some(&json!(7)), &ValidateOptions::new()).is_empty());
        Ok(())
    }

    #[test]
    fn test_early_fail_keeps_first() -> Result<(), Box<dyn std::error::Error>> {
        let mut b = SchemaBuilder::new();
        let a = b.string();
        let c = b.integer();
        let root = b.object([("a", a), ("c", c)]);
        let schema = b.finish(root)?;
        let interp = Interpreter::new(&schema, UnionFailureMode::default());

        let full = interp.run(Some(&json!({})), &ValidateOptions::new());
        let early = interp.run(Some(&json!({})), &ValidateOptions::new().early_fail());
        assert_eq!(full.len(), 2);
        assert_eq!(early.as_slice(), &full[..1]);
        Ok(())
    }

    #[test]
    fn test_context_path_prefix() -> Result<(), Box<dyn std::error::Error>> {
        let mut b = SchemaBuilder::new();
        let speed = b.float();
        let root = b.object([("speed", speed)]);
        let schema = b.finish(root)?;
        let interp = Interpreter::new(&schema, UnionFailureMode::default());

        let failures = interp.run(
            Some(&json!({"speed": "fast"})),
            &ValidateOptions::new().with_path("reading"),
        );
        assert_eq!(failures[0].path, "reading['speed']");

        let failures = interp.run(None, &ValidateOptions::new().with_path("reading"));
        assert_eq!(kinds(&failures), vec![FailureKind::Required]);
        assert_eq!(failures[0].path, "reading");
        Ok(())
    }
}
