//! Executor for compiled programs.
//!
//! A single loop over the op list. Values live in slots that remember their
//! parent slot and the step taken from it, so a failure's path is rendered
//! only when the failure is raised.

use serde_json::Value;

use crate::compile::{Op, Program};
use crate::errors::ValidationFailure;
use crate::leaf::{self, Class, Violation};
use crate::path::{self, Segment};
use crate::validate::{presence, Presence, ValidateOptions};

const NO_PARENT: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
enum Step<'v> {
    Root,
    Field(usize),
    Key(&'v str),
    Index(usize),
}

#[derive(Debug, Clone, Copy)]
struct Slot<'v> {
    value: Option<&'v Value>,
    parent: usize,
    step: Step<'v>,
}

const EMPTY: Slot<'static> = Slot {
    value: None,
    parent: NO_PARENT,
    step: Step::Root,
};

enum Cursor<'v> {
    Idle,
    Items(std::iter::Enumerate<std::slice::Iter<'v, Value>>),
    Entries(serde_json::map::Iter<'v>),
}

/// Open union
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Failure count when the union was entered
    mark: usize,
    /// Failure count when the current alternative began
    alt_mark: usize,
    /// Op index of the current alternative's `AltEnd`
    alt_end: usize,
    /// Whether a failure ends the current alternative
    abort: bool,
    synthesized: bool,
}

/// What to do after a failure was recorded
enum Flow {
    Continue,
    Jump(usize),
    Return,
}

struct Machine<'p, 'v> {
    program: &'p Program,
    root: &'p str,
    early_fail: bool,
    slots: Vec<Slot<'v>>,
    cursors: Vec<Cursor<'v>>,
    frames: Vec<Frame>,
    out: Vec<ValidationFailure>,
}

pub(crate) fn execute(
    program: &Program,
    value: Option<&Value>,
    options: &ValidateOptions,
) -> Vec<ValidationFailure> {
    let mut slots = vec![EMPTY; program.slots.max(1)];
    slots[0].value = value;

    let mut machine = Machine {
        program,
        root: &options.path,
        early_fail: options.early_fail,
        slots,
        cursors: (0..program.cursors).map(|_| Cursor::Idle).collect(),
        frames: Vec::new(),
        out: Vec::new(),
    };
    machine.run();
    machine.out
}

impl<'p, 'v> Machine<'p, 'v> {
    fn path(&self, slot: usize) -> String {
        let mut steps = Vec::new();
        let mut current = slot;
        while current != NO_PARENT {
            let s = &self.slots[current];
            match s.step {
                Step::Root => {}
                Step::Field(name) => steps.push(Segment::Key(&self.program.strings[name])),
                Step::Key(key) => steps.push(Segment::Key(key)),
                Step::Index(index) => steps.push(Segment::Index(index)),
            }
            current = s.parent;
        }
        path::render(self.root, steps.into_iter().rev())
    }

    /// Whether a failure raised now should stop the enclosing scope
    fn halting(&self) -> bool {
        self.frames
            .last()
            .map(|frame| frame.abort)
            .unwrap_or(self.early_fail)
    }

    fn after_failure(&self) -> Flow {
        match self.frames.last() {
            Some(frame) if frame.abort => Flow::Jump(frame.alt_end),
            Some(_) => Flow::Continue,
            None if self.early_fail => Flow::Return,
            None => Flow::Continue,
        }
    }

    fn raise(&mut self, template: usize, slot: usize, found: Option<usize>) -> Flow {
        let path = self.path(slot);
        let failure = self.program.templates[template].instantiate(self.slots[slot].value, found, path);
        self.out.push(failure);
        self.after_failure()
    }

    /// Resolve a failure's flow, continuing at `next` when nothing interrupts
    fn fail(&mut self, template: usize, slot: usize, found: Option<usize>, next: usize) -> Option<usize> {
        match self.raise(template, slot, found) {
            Flow::Continue => Some(next),
            Flow::Jump(to) => Some(to),
            Flow::Return => None,
        }
    }

    fn verdict(
        &mut self,
        pc: usize,
        slot: usize,
        violation: Option<Violation>,
        wrong_type: usize,
        constraint: Option<usize>,
    ) -> Option<usize> {
        let template = match violation {
            None => return Some(pc + 1),
            Some(Violation {
                class: Class::WrongType,
                ..
            }) => Some(wrong_type),
            Some(Violation {
                class: Class::Constraint,
                ..
            }) => constraint,
        };
        match template {
            Some(t) => self.fail(t, slot, violation.and_then(|v| v.found), pc + 1),
            None => Some(pc + 1),
        }
    }

    fn set(&mut self, dst: usize, value: Option<&'v Value>, parent: usize, step: Step<'v>) {
        self.slots[dst] = Slot {
            value,
            parent,
            step,
        };
    }

    fn run(&mut self) {
        let program = self.program;
        let ops = &program.ops;
        let mut pc = 0;

        while pc < ops.len() {
            let next = match &ops[pc] {
                Op::Gate {
                    slot,
                    required,
                    nullable,
                    null_is_value,
                    missing,
                    skip,
                } => match presence(*required, *nullable, *null_is_value, self.slots[*slot].value) {
                    Presence::Check => Some(pc + 1),
                    Presence::Skip => Some(*skip),
                    Presence::Missing => self.fail(*missing, *slot, None, *skip),
                },

                Op::String {
                    slot,
                    length,
                    wrong_type,
                    constraint,
                } => {
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_string(v, length));
                    self.verdict(pc, *slot, violation, *wrong_type, *constraint)
                }
                Op::Integer {
                    slot,
                    range,
                    wrong_type,
                    constraint,
                } => {
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_integer(v, range));
                    self.verdict(pc, *slot, violation, *wrong_type, *constraint)
                }
                Op::Float {
                    slot,
                    range,
                    wrong_type,
                    constraint,
                } => {
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_float(v, range));
                    self.verdict(pc, *slot, violation, *wrong_type, *constraint)
                }
                Op::Boolean { slot, wrong_type } => {
                    let violation = self.slots[*slot].value.and_then(leaf::check_boolean);
                    self.verdict(pc, *slot, violation, *wrong_type, None)
                }
                Op::Null { slot, wrong_type } => {
                    let violation = self.slots[*slot].value.and_then(leaf::check_null);
                    self.verdict(pc, *slot, violation, *wrong_type, None)
                }
                Op::Undefined { slot, wrong_type } => {
                    let violation = self.slots[*slot].value.and_then(leaf::check_undefined);
                    self.verdict(pc, *slot, violation, *wrong_type, None)
                }
                Op::Date { slot, wrong_type } => {
                    let violation = self.slots[*slot].value.and_then(leaf::check_date);
                    self.verdict(pc, *slot, violation, *wrong_type, None)
                }
                Op::DateTime {
                    slot,
                    format,
                    wrong_type,
                } => {
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_datetime(v, *format));
                    self.verdict(pc, *slot, violation, *wrong_type, None)
                }
                Op::Exact {
                    slot,
                    expected,
                    wrong_type,
                } => {
                    let expected = &program.strings[*expected];
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_exact(v, expected));
                    self.verdict(pc, *slot, violation, *wrong_type, None)
                }
                Op::Regex {
                    slot,
                    pattern,
                    wrong_type,
                    constraint,
                } => {
                    let pattern = &program.patterns[*pattern];
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_regex(v, pattern));
                    self.verdict(pc, *slot, violation, *wrong_type, *constraint)
                }
                Op::Buffer {
                    slot,
                    length,
                    wrong_type,
                    constraint,
                } => {
                    let violation = self.slots[*slot]
                        .value
                        .and_then(|v| leaf::check_buffer(v, length));
                    self.verdict(pc, *slot, violation, *wrong_type, *constraint)
                }

                Op::Object {
                    slot,
                    not_object,
                    skip,
                } => match self.slots[*slot].value {
                    Some(Value::Object(_)) => Some(pc + 1),
                    _ => self.fail(*not_object, *slot, None, *skip),
                },
                Op::Array {
                    slot,
                    not_array,
                    length,
                    skip,
                } => match (self.slots[*slot].value, length) {
                    (Some(Value::Array(items)), Some((bounds, wrong_length)))
                        if !bounds.contains(items.len()) =>
                    {
                        self.fail(*wrong_length, *slot, Some(items.len()), *skip)
                    }
                    (Some(Value::Array(_)), _) => Some(pc + 1),
                    _ => self.fail(*not_array, *slot, None, *skip),
                },
                Op::Tuple {
                    slot,
                    not_array,
                    arity,
                    wrong_length,
                    skip,
                } => match self.slots[*slot].value {
                    Some(Value::Array(items)) if items.len() != *arity => {
                        self.fail(*wrong_length, *slot, Some(items.len()), *skip)
                    }
                    Some(Value::Array(_)) => Some(pc + 1),
                    _ => self.fail(*not_array, *slot, None, *skip),
                },
                Op::Record {
                    slot,
                    not_object,
                    keys,
                    skip,
                } => match (self.slots[*slot].value, keys) {
                    (Some(Value::Object(map)), Some((bounds, wrong_length)))
                        if !bounds.contains(map.len()) =>
                    {
                        self.fail(*wrong_length, *slot, Some(map.len()), *skip)
                    }
                    (Some(Value::Object(_)), _) => Some(pc + 1),
                    _ => self.fail(*not_object, *slot, None, *skip),
                },

                Op::Field { src, dst, name } => {
                    let value = match self.slots[*src].value {
                        Some(Value::Object(map)) => map.get(&program.strings[*name]),
                        _ => None,
                    };
                    self.set(*dst, value, *src, Step::Field(*name));
                    Some(pc + 1)
                }
                Op::Element { src, dst, index } => {
                    let value = self.slots[*src]
                        .value
                        .and_then(Value::as_array)
                        .and_then(|items| items.get(*index));
                    self.set(*dst, value, *src, Step::Index(*index));
                    Some(pc + 1)
                }
                Op::Items { src, cursor } => {
                    self.cursors[*cursor] = match self.slots[*src].value {
                        Some(Value::Array(items)) => Cursor::Items(items.iter().enumerate()),
                        _ => Cursor::Idle,
                    };
                    Some(pc + 1)
                }
                Op::Entries { src, cursor } => {
                    self.cursors[*cursor] = match self.slots[*src].value {
                        Some(Value::Object(map)) => Cursor::Entries(map.iter()),
                        _ => Cursor::Idle,
                    };
                    Some(pc + 1)
                }
                Op::Next {
                    src,
                    cursor,
                    dst,
                    done,
                } => {
                    let step = match &mut self.cursors[*cursor] {
                        Cursor::Items(items) => items
                            .next()
                            .map(|(index, value)| (value, Step::Index(index))),
                        Cursor::Entries(entries) => entries
                            .next()
                            .map(|(key, value)| (value, Step::Key(key.as_str()))),
                        Cursor::Idle => None,
                    };
                    match step {
                        Some((value, step)) => {
                            self.set(*dst, Some(value), *src, step);
                            Some(pc + 1)
                        }
                        None => Some(*done),
                    }
                }
                Op::Jump { to } => Some(*to),

                Op::UnionEnter { synthesized } => {
                    let mark = self.out.len();
                    let abort = *synthesized || self.halting();
                    self.frames.push(Frame {
                        mark,
                        alt_mark: mark,
                        alt_end: pc,
                        abort,
                        synthesized: *synthesized,
                    });
                    Some(pc + 1)
                }
                Op::AltBegin { end } => {
                    let len = self.out.len();
                    if let Some(frame) = self.frames.last_mut() {
                        frame.alt_mark = len;
                        frame.alt_end = *end;
                    }
                    Some(pc + 1)
                }
                Op::AltEnd { done } => match self.frames.last().copied() {
                    Some(frame) if self.out.len() == frame.alt_mark => {
                        self.out.truncate(frame.mark);
                        self.frames.pop();
                        Some(*done)
                    }
                    _ => Some(pc + 1),
                },
                Op::UnionFail { slot, mismatch } => match self.frames.pop() {
                    Some(frame) if frame.synthesized => {
                        self.out.truncate(frame.mark);
                        self.fail(*mismatch, *slot, None, pc + 1)
                    }
                    Some(frame) if self.halting() => {
                        // Keep the first alternative's first failure
                        self.out.truncate(frame.mark + 1);
                        match self.after_failure() {
                            Flow::Continue => Some(pc + 1),
                            Flow::Jump(to) => Some(to),
                            Flow::Return => None,
                        }
                    }
                    _ => Some(pc + 1),
                },
            };

            match next {
                Some(next) => pc = next,
                None => return,
            }
        }
    }
}
