//! Field-access path rendering.
//!
//! Both the interpreter (which extends paths eagerly while descending) and the
//! bytecode executor (which renders them only when a failure is raised) go
//! through these helpers, so the two always agree on the text.

use std::fmt::Write;

/// One step below a parent value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Object field or record key
    Key(&'a str),
    /// Array or tuple position
    Index(usize),
}

/// Append `segment` to `path` in place.
///
/// Keys directly under an empty root are written bare (`position`), deeper
/// keys are bracketed and quoted (`position['longitude']`). Indices are
/// always bracketed (`positions[1]`).
pub fn push(path: &mut String, segment: Segment<'_>) {
    match segment {
        Segment::Key(key) if path.is_empty() => path.push_str(key),
        Segment::Key(key) => {
            path.push_str("['");
            for c in key.chars() {
                if c == '\'' || c == '\\' {
                    path.push('\\');
                }
                path.push(c);
            }
            path.push_str("']");
        }
        Segment::Index(index) => {
            // Writing into a String cannot fail
            let _ = write!(path, "[{}]", index);
        }
    }
}

pub fn join(parent: &str, segment: Segment<'_>) -> String {
    let mut path = String::with_capacity(parent.len() + 16);
    path.push_str(parent);
    push(&mut path, segment);
    path
}

/// Render a root context followed by segments listed outermost first
pub fn render<'a>(root: &str, segments: impl IntoIterator<Item = Segment<'a>>) -> String {
    let mut path = root.to_string();
    for segment in segments {
        push(&mut path, segment);
    }
    path
}
