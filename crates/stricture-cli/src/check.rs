//! Validation of input files against one schema

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use stricture_runtime::{ValidateOptions, ValidationFailure, Validator};
use tracing::debug;

use crate::load_value;

/// How [`render`] prints reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Outcome for one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub input: PathBuf,
    pub failures: Vec<ValidationFailure>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validate every input in order. Unreadable inputs abort the run.
pub fn check_files(
    validator: &Validator,
    inputs: &[PathBuf],
    options: &ValidateOptions,
) -> Result<Vec<CheckReport>> {
    inputs
        .iter()
        .map(|input| check_file(validator, input, options))
        .collect()
}

pub fn check_file(validator: &Validator, input: &Path, options: &ValidateOptions) -> Result<CheckReport> {
    let value = load_value(input)?;
    let failures = validator.validate_with(Some(&value), options);
    debug!(input = %input.display(), failures = failures.len(), "validated input");
    Ok(CheckReport {
        input: input.to_path_buf(),
        failures,
    })
}

pub fn render(reports: &[CheckReport], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        ReportFormat::Text => {
            let mut output = String::new();
            for report in reports {
                if report.is_valid() {
                    writeln!(output, "{}: ok", report.input.display())?;
                    continue;
                }
                writeln!(
                    output,
                    "{}: {} failure(s)",
                    report.input.display(),
                    report.failures.len()
                )?;
                for failure in &report.failures {
                    writeln!(output, "  - {}", failure)?;
                }
            }
            Ok(output)
        }
    }
}
