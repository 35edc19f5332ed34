//! The compiling optimizer.
//!
//! A pre-order walk over the schema inlines every node into one flat list of
//! typed check operations. Composite nodes become forward jumps around their
//! blocks, arrays and records become loops, unions become alternative blocks
//! bracketed by frame operations. Every inlined block reads its value from a
//! fresh local slot, allocated from a counter shared across the whole walk.
//! Failure constructors are deduplicated into the program's declarations
//! table and referenced by index.

use std::collections::HashMap;

use serde_json::Value;
use stricture_core::{
    DateTimeFormat, FloatRange, IntRange, Leaf, LengthBounds, NodeId, NodeKind, Pattern, Schema,
};
use thiserror::Error;

use crate::errors::ValidationFailure;
use crate::leaf;
use crate::template::{self, Template};
use crate::validate::{self, UnionFailureMode, ValidateOptions};
use crate::vm;

/// Default upper bound on the number of operations in one program
pub const DEFAULT_MAX_PROGRAM_OPS: usize = 1 << 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Compiled routine would exceed {limit} operations")]
    TooLarge { limit: usize },
}

/// One check operation. Slot, template, string and pattern operands are
/// indices into the program's tables; jump operands are op indices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    /// Presence gate. Jumps to `skip` when the value is accepted or reported
    /// missing, falls through when it must be checked.
    Gate {
        slot: usize,
        required: bool,
        nullable: bool,
        null_is_value: bool,
        missing: usize,
        skip: usize,
    },

    String {
        slot: usize,
        length: LengthBounds,
        wrong_type: usize,
        constraint: Option<usize>,
    },
    Integer {
        slot: usize,
        range: IntRange,
        wrong_type: usize,
        constraint: Option<usize>,
    },
    Float {
        slot: usize,
        range: FloatRange,
        wrong_type: usize,
        constraint: Option<usize>,
    },
    Boolean {
        slot: usize,
        wrong_type: usize,
    },
    Null {
        slot: usize,
        wrong_type: usize,
    },
    Undefined {
        slot: usize,
        wrong_type: usize,
    },
    Date {
        slot: usize,
        wrong_type: usize,
    },
    DateTime {
        slot: usize,
        format: DateTimeFormat,
        wrong_type: usize,
    },
    Exact {
        slot: usize,
        expected: usize,
        wrong_type: usize,
    },
    Regex {
        slot: usize,
        pattern: usize,
        wrong_type: usize,
        constraint: Option<usize>,
    },
    Buffer {
        slot: usize,
        length: LengthBounds,
        wrong_type: usize,
        constraint: Option<usize>,
    },

    /// Structural gates jump to `skip` on failure
    Object {
        slot: usize,
        not_object: usize,
        skip: usize,
    },
    Array {
        slot: usize,
        not_array: usize,
        length: Option<(LengthBounds, usize)>,
        skip: usize,
    },
    Tuple {
        slot: usize,
        not_array: usize,
        arity: usize,
        wrong_length: usize,
        skip: usize,
    },
    Record {
        slot: usize,
        not_object: usize,
        keys: Option<(LengthBounds, usize)>,
        skip: usize,
    },

    /// Load a field of `src` (possibly absent) into `dst`
    Field {
        src: usize,
        dst: usize,
        name: usize,
    },
    /// Load a tuple position of `src` into `dst`
    Element {
        src: usize,
        dst: usize,
        index: usize,
    },
    /// Start iterating the elements of an array
    Items {
        src: usize,
        cursor: usize,
    },
    /// Start iterating the entries of an object
    Entries {
        src: usize,
        cursor: usize,
    },
    /// Load the next element into `dst`, or jump to `done`
    Next {
        src: usize,
        cursor: usize,
        dst: usize,
        done: usize,
    },
    Jump {
        to: usize,
    },

    /// Open a union frame
    UnionEnter {
        synthesized: bool,
    },
    /// Start an alternative whose closing `AltEnd` is at `end`
    AltBegin {
        end: usize,
    },
    /// Close an alternative: on success drop the frame and jump to `done`
    AltEnd {
        done: usize,
    },
    /// Every alternative failed
    UnionFail {
        slot: usize,
        mismatch: usize,
    },
}

/// A compiled validation routine
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) ops: Vec<Op>,
    pub(crate) templates: Vec<Template>,
    pub(crate) strings: Vec<String>,
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) slots: usize,
    pub(crate) cursors: usize,
}

impl Program {
    /// Number of operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The declarations table: every distinct failure constructor referenced
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Number of local value slots
    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn run(&self, value: Option<&Value>, options: &ValidateOptions) -> Vec<ValidationFailure> {
        vm::execute(self, value, options)
    }
}

/// Compile `schema` into a flat program of at most `max_ops` operations
pub fn compile(
    schema: &Schema,
    union_failures: UnionFailureMode,
    max_ops: usize,
) -> Result<Program, CompileError> {
    let mut compiler = Compiler {
        schema,
        synthesized: union_failures == UnionFailureMode::Synthesized,
        max_ops,
        ops: Vec::new(),
        templates: Vec::new(),
        template_ids: HashMap::new(),
        strings: Vec::new(),
        string_ids: HashMap::new(),
        patterns: Vec::new(),
        slots: 1,
        cursors: 0,
    };
    compiler.node(schema.root(), 0)?;

    Ok(Program {
        ops: compiler.ops,
        templates: compiler.templates,
        strings: compiler.strings,
        patterns: compiler.patterns,
        slots: compiler.slots,
        cursors: compiler.cursors,
    })
}

struct Compiler<'s> {
    schema: &'s Schema,
    synthesized: bool,
    max_ops: usize,
    ops: Vec<Op>,
    templates: Vec<Template>,
    template_ids: HashMap<Template, usize>,
    strings: Vec<String>,
    string_ids: HashMap<String, usize>,
    patterns: Vec<Pattern>,
    slots: usize,
    cursors: usize,
}

impl Compiler<'_> {
    fn emit(&mut self, op: Op) -> Result<usize, CompileError> {
        if self.ops.len() >= self.max_ops {
            return Err(CompileError::TooLarge {
                limit: self.max_ops,
            });
        }
        self.ops.push(op);
        Ok(self.ops.len() - 1)
    }

    /// Point a forward jump at `target`
    fn patch(&mut self, at: usize, target: usize) {
        match &mut self.ops[at] {
            Op::Gate { skip, .. }
            | Op::Object { skip, .. }
            | Op::Array { skip, .. }
            | Op::Tuple { skip, .. }
            | Op::Record { skip, .. } => *skip = target,
            Op::Next { done, .. } | Op::AltEnd { done } => *done = target,
            Op::AltBegin { end } => *end = target,
            _ => {}
        }
    }

    fn here(&self) -> usize {
        self.ops.len()
    }

    fn slot(&mut self) -> usize {
        self.slots += 1;
        self.slots - 1
    }

    fn cursor(&mut self) -> usize {
        self.cursors += 1;
        self.cursors - 1
    }

    fn template(&mut self, template: Template) -> usize {
        if let Some(&id) = self.template_ids.get(&template) {
            return id;
        }
        let id = self.templates.len();
        self.templates.push(template.clone());
        self.template_ids.insert(template, id);
        id
    }

    fn string(&mut self, s: &str) -> usize {
        if let Some(&id) = self.string_ids.get(s) {
            return id;
        }
        let id = self.strings.len();
        self.strings.push(s.to_string());
        self.string_ids.insert(s.to_string(), id);
        id
    }

    fn node(&mut self, id: NodeId, slot: usize) -> Result<(), CompileError> {
        let schema = self.schema;
        let node = schema.node(id);
        let missing = self.template(template::required());
        let gate = self.emit(Op::Gate {
            slot,
            required: node.required,
            nullable: node.nullable,
            null_is_value: validate::null_is_value(schema, id),
            missing,
            skip: 0,
        })?;

        match &node.kind {
            NodeKind::Leaf(leaf) => self.leaf(leaf, slot)?,

            NodeKind::Object { fields } => {
                let not_object = self.template(template::not_object());
                let check = self.emit(Op::Object {
                    slot,
                    not_object,
                    skip: 0,
                })?;
                for field in fields {
                    let dst = self.slot();
                    let name = self.string(&field.name);
                    self.emit(Op::Field {
                        src: slot,
                        dst,
                        name,
                    })?;
                    self.node(field.node, dst)?;
                }
                let end = self.here();
                self.patch(check, end);
            }

            NodeKind::Array { item, length } => {
                let not_array = self.template(template::not_array());
                let length = if length.is_unbounded() {
                    None
                } else {
                    Some((*length, self.template(template::length(length, "items"))))
                };
                let check = self.emit(Op::Array {
                    slot,
                    not_array,
                    length,
                    skip: 0,
                })?;
                let cursor = self.cursor();
                self.emit(Op::Items { src: slot, cursor })?;
                self.body_loop(*item, slot, cursor)?;
                let end = self.here();
                self.patch(check, end);
            }

            NodeKind::Tuple { items } => {
                let not_array = self.template(template::not_array());
                let wrong_length = self.template(template::tuple_arity(items.len()));
                let check = self.emit(Op::Tuple {
                    slot,
                    not_array,
                    arity: items.len(),
                    wrong_length,
                    skip: 0,
                })?;
                for (index, item) in items.iter().enumerate() {
                    let dst = self.slot();
                    self.emit(Op::Element {
                        src: slot,
                        dst,
                        index,
                    })?;
                    self.node(*item, dst)?;
                }
                let end = self.here();
                self.patch(check, end);
            }

            NodeKind::Record { value, keys } => {
                let not_object = self.template(template::not_object());
                let keys = if keys.is_unbounded() {
                    None
                } else {
                    Some((*keys, self.template(template::length(keys, "keys"))))
                };
                let check = self.emit(Op::Record {
                    slot,
                    not_object,
                    keys,
                    skip: 0,
                })?;
                let cursor = self.cursor();
                self.emit(Op::Entries { src: slot, cursor })?;
                self.body_loop(*value, slot, cursor)?;
                let end = self.here();
                self.patch(check, end);
            }

            NodeKind::Union { alternatives } => {
                let mismatch = self.template(template::union_mismatch(alternatives.len()));
                self.emit(Op::UnionEnter {
                    synthesized: self.synthesized,
                })?;
                let mut exits = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    let begin = self.emit(Op::AltBegin { end: 0 })?;
                    // Alternatives see the union's own value
                    self.node(*alternative, slot)?;
                    let end = self.emit(Op::AltEnd { done: 0 })?;
                    self.patch(begin, end);
                    exits.push(end);
                }
                self.emit(Op::UnionFail { slot, mismatch })?;
                let done = self.here();
                for exit in exits {
                    self.patch(exit, done);
                }
            }
        }

        let end = self.here();
        self.patch(gate, end);
        Ok(())
    }

    /// Loop header, inlined body and back edge for arrays and records
    fn body_loop(&mut self, item: NodeId, src: usize, cursor: usize) -> Result<(), CompileError> {
        let dst = self.slot();
        let next = self.emit(Op::Next {
            src,
            cursor,
            dst,
            done: 0,
        })?;
        self.node(item, dst)?;
        self.emit(Op::Jump { to: next })?;
        let end = self.here();
        self.patch(next, end);
        Ok(())
    }

    fn leaf(&mut self, leaf: &Leaf, slot: usize) -> Result<(), CompileError> {
        // Unknown accepts everything and needs no check op
        let Some(wrong_type) = leaf::wrong_type(leaf) else {
            return Ok(());
        };
        let wrong_type = self.template(wrong_type);
        let constraint = match leaf {
            Leaf::String { length } | Leaf::Buffer { length } if length.is_unbounded() => None,
            _ => leaf::constraint(leaf).map(|t| self.template(t)),
        };

        let op = match leaf {
            Leaf::String { length } => Op::String {
                slot,
                length: *length,
                wrong_type,
                constraint,
            },
            Leaf::Integer { range } => Op::Integer {
                slot,
                range: *range,
                wrong_type,
                constraint,
            },
            Leaf::Float { range } => Op::Float {
                slot,
                range: *range,
                wrong_type,
                constraint,
            },
            Leaf::Boolean => Op::Boolean { slot, wrong_type },
            Leaf::Null => Op::Null { slot, wrong_type },
            Leaf::Undefined => Op::Undefined { slot, wrong_type },
            Leaf::Date => Op::Date { slot, wrong_type },
            Leaf::DateTime { format } => Op::DateTime {
                slot,
                format: *format,
                wrong_type,
            },
            Leaf::ExactString { expected } => Op::Exact {
                slot,
                expected: self.string(expected),
                wrong_type,
            },
            Leaf::Regex { pattern } => {
                self.patterns.push(pattern.clone());
                Op::Regex {
                    slot,
                    pattern: self.patterns.len() - 1,
                    wrong_type,
                    constraint,
                }
            }
            Leaf::Buffer { length } => Op::Buffer {
                slot,
                length: *length,
                wrong_type,
                constraint,
            },
            Leaf::Unknown => return Ok(()),
        };
        self.emit(op)?;
        Ok(())
    }
}
