//! The validator instance: a schema plus its lazily compiled routine.

use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde_json::Value;
use stricture_core::Schema;
use tracing::{debug, warn};

use crate::compile::{self, Program, DEFAULT_MAX_PROGRAM_OPS};
use crate::errors::{CastError, ValidationFailure, ValidationFailures};
use crate::validate::{Interpreter, UnionFailureMode, ValidateOptions};

/// When the compiled routine is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compilation {
    /// Never compile, always interpret
    Interpret,
    /// Compile on first use
    #[default]
    Lazy,
    /// Compile while constructing the validator
    Eager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    pub compilation: Compilation,
    pub union_failures: UnionFailureMode,
    /// Programs above this many operations fall back to interpretation
    pub max_program_ops: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            compilation: Compilation::default(),
            union_failures: UnionFailureMode::default(),
            max_program_ops: DEFAULT_MAX_PROGRAM_OPS,
        }
    }
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compilation(mut self, compilation: Compilation) -> Self {
        self.compilation = compilation;
        self
    }

    pub fn with_union_failures(mut self, mode: UnionFailureMode) -> Self {
        self.union_failures = mode;
        self
    }

    pub fn with_max_program_ops(mut self, limit: usize) -> Self {
        self.max_program_ops = limit;
        self
    }
}

/// A schema ready to validate values.
///
/// The compiled routine belongs to this instance. It is built at most once,
/// guarded by a one-shot initializer, and shared by every later call.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use stricture_core::{FloatRange, SchemaBuilder};
/// use stricture_runtime::Validator;
///
/// let mut b = SchemaBuilder::new();
/// let longitude = b.float_range(FloatRange::new(-180.0, 180.0));
/// let root = b.object([("longitude", longitude)]);
/// let validator = Validator::new(b.finish(root).unwrap());
///
/// assert!(validator.is_valid(&json!({"longitude": 12.5})));
/// let failures = validator.validate(&json!({"longitude": -181}));
/// assert_eq!(failures[0].path, "longitude");
/// ```
#[derive(Debug)]
pub struct Validator {
    schema: Schema,
    options: ValidatorOptions,
    program: OnceLock<Option<Program>>,
}

impl Validator {
    pub fn new(schema: Schema) -> Self {
        Self::with_options(schema, ValidatorOptions::default())
    }

    pub fn with_options(schema: Schema, options: ValidatorOptions) -> Self {
        let validator = Self {
            schema,
            options,
            program: OnceLock::new(),
        };
        if options.compilation == Compilation::Eager {
            validator.program();
        }
        validator
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// The compiled routine, building it on first call. `None` when
    /// compilation is disabled or fell back to interpretation.
    pub fn program(&self) -> Option<&Program> {
        if self.options.compilation == Compilation::Interpret {
            return None;
        }
        self.program
            .get_or_init(|| {
                match compile::compile(
                    &self.schema,
                    self.options.union_failures,
                    self.options.max_program_ops,
                ) {
                    Ok(program) => {
                        debug!(
                            ops = program.len(),
                            slots = program.slots(),
                            templates = program.templates().len(),
                            "compiled validation routine"
                        );
                        Some(program)
                    }
                    Err(err) => {
                        warn!("falling back to interpretation: {}", err);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Whether a compiled routine has been built and is in use
    pub fn is_compiled(&self) -> bool {
        matches!(self.program.get(), Some(Some(_)))
    }

    pub fn validate(&self, value: &Value) -> Vec<ValidationFailure> {
        self.validate_with(Some(value), &ValidateOptions::default())
    }

    /// Validate a possibly absent value with per-call options
    pub fn validate_with(
        &self,
        value: Option<&Value>,
        options: &ValidateOptions,
    ) -> Vec<ValidationFailure> {
        match self.program() {
            Some(program) => program.run(value, options),
            None => self.interpret(value, options),
        }
    }

    /// Validate through the recursive interpreter, bypassing any compiled routine
    pub fn interpret(&self, value: Option<&Value>, options: &ValidateOptions) -> Vec<ValidationFailure> {
        Interpreter::new(&self.schema, self.options.union_failures).run(value, options)
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validate_with(Some(value), &ValidateOptions::new().early_fail())
            .is_empty()
    }

    /// Validate, then deserialize into `T`.
    ///
    /// All failures are wrapped in one [`CastError::Invalid`].
    pub fn cast<T: DeserializeOwned>(&self, value: Value) -> Result<T, CastError> {
        let failures = self.validate(&value);
        if !failures.is_empty() {
            return Err(CastError::Invalid(ValidationFailures::from(failures)));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use serde::Deserialize;
    use serde_json::json;
    use stricture_core::{IntRange, SchemaBuilder};

    fn reading_schema() -> Result<Schema, stricture_core::CoreError> {
        let mut b = SchemaBuilder::new();
        let id = b.string();
        let odometer = b.integer_range(IntRange::new(0, 4_294_967_295));
        let root = b.object([("id", id), ("odometer", odometer)]);
        b.finish(root)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reading {
        id: String,
        odometer: u32,
    }

    #[test]
    fn test_lazy_compiles_on_first_use() -> Result<(), Box<dyn std::error::Error>> {
        let validator = Validator::new(reading_schema()?);
        assert!(!validator.is_compiled());
        assert!(validator.is_valid(&json!({"id": "a", "odometer": 12})));
        assert!(validator.is_compiled());
        Ok(())
    }

    #[test]
    fn test_eager_and_interpret() -> Result<(), Box<dyn std::error::Error>> {
        let eager = Validator::with_options(
            reading_schema()?,
            ValidatorOptions::new().with_compilation(Compilation::Eager),
        );
        assert!(eager.is_compiled());

        let interpreted = Validator::with_options(
            reading_schema()?,
            ValidatorOptions::new().with_compilation(Compilation::Interpret),
        );
        assert!(interpreted.program().is_none());
        assert!(!interpreted.is_compiled());
        assert_eq!(
            interpreted.validate(&json!({"id": 1})).len(),
            eager.validate(&json!({"id": 1})).len()
        );
        Ok(())
    }

    #[test]
    fn test_fallback_when_over_budget() -> Result<(), Box<dyn std::error::Error>> {
        let validator = Validator::with_options(
            reading_schema()?,
            ValidatorOptions::new().with_max_program_ops(2),
        );
        let failures = validator.validate(&json!({"odometer": -1}));
        assert!(!validator.is_compiled());
        assert_eq!(
            failures.iter().map(|f| f.kind).collect::<Vec<_>>(),
            vec![FailureKind::Required, FailureKind::OutOfRange]
        );
        Ok(())
    }

    #[test]
    fn test_cast() -> Result<(), Box<dyn std::error::Error>> {
        let validator = Validator::new(reading_schema()?);
        let reading: Reading = validator.cast(json!({"id": "r-1", "odometer": 7}))?;
        assert_eq!(
            reading,
            Reading {
                id: "r-1".to_string(),
                odometer: 7
            }
        );

        let err = validator
            .cast::<Reading>(json!({"odometer": "far"}))
            .unwrap_err();
        let failures = err.failures().ok_or("expected validation failures")?;
        assert_eq!(failures.len(), 2);
        assert!(err.to_string().starts_with("2 validation failures:"));
        Ok(())
    }
}
