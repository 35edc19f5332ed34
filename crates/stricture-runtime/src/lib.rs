//! Stricture runtime
//!
//! Checks untyped JSON values against a [`stricture_core::Schema`]:
//!
//! - **Interpreter**: the recursive reference walk over the node arena
//! - **Compiling optimizer**: flattens a schema into one bytecode [`Program`]
//!   with pre-resolved failure templates, executed by a tight loop
//! - **Validator**: owns a schema and its lazily built program, falling back
//!   to interpretation whenever compilation is refused
//!
//! Both paths return the same ordered list of [`ValidationFailure`]s.

mod compile;
mod errors;
mod leaf;
mod path;
mod template;
mod validate;
mod validator;
mod vm;

pub use compile::{compile, CompileError, Program, DEFAULT_MAX_PROGRAM_OPS};
pub use errors::{CastError, FailureKind, ValidationFailure, ValidationFailures};
pub use template::Template;
pub use validate::{presence, Interpreter, Presence, UnionFailureMode, ValidateOptions};
pub use validator::{Compilation, Validator, ValidatorOptions};
