use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stricture::check::{self, ReportFormat};
use stricture::{
    export, load_schema, Compilation, ExportOptions, RegistryMode, UnionFailureMode,
    ValidateOptions, Validator, ValidatorOptions,
};

#[derive(Parser)]
#[command(name = "stricture")]
#[command(about = "Validate data against stricture schemas and emit their types", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate JSON or YAML inputs against a schema
    Validate {
        /// Schema document (YAML or JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input files to check
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Stop at the first failure of each input
        #[arg(long)]
        early_fail: bool,

        /// Skip compilation and walk the schema directly
        #[arg(long)]
        interpret: bool,

        /// Report every alternative's failures when no union alternative matches
        #[arg(long)]
        all_union_failures: bool,

        /// Prefix for every reported path
        #[arg(long)]
        context: Option<String>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Emit type declarations for a schema
    Types {
        /// Schema document (YAML or JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Target language (typescript, rust)
        #[arg(short, long, default_value = "typescript")]
        language: String,

        /// Name for the root type
        #[arg(short, long)]
        name: Option<String>,

        /// Output file path, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reject different declarations sharing a name
        #[arg(long)]
        strict: bool,
    },

    /// Print a schema in constructor form
    Show {
        /// Schema document (YAML or JSON)
        #[arg(short, long)]
        schema: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags win over RUST_LOG
    let filter = if cli.debug {
        EnvFilter::new("trace")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug) // Show target module in debug mode
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            schema,
            inputs,
            early_fail,
            interpret,
            all_union_failures,
            context,
            format,
        } => {
            let mut options = ValidatorOptions::new();
            if interpret {
                options = options.with_compilation(Compilation::Interpret);
            }
            if all_union_failures {
                options = options.with_union_failures(UnionFailureMode::All);
            }

            let mut call = ValidateOptions::new();
            if let Some(context) = context {
                call = call.with_path(context);
            }
            if early_fail {
                call = call.early_fail();
            }

            handle_validate(schema, &inputs, options, &call, format)
        }
        Commands::Types {
            schema,
            language,
            name,
            output,
            strict,
        } => handle_types(schema, language, name, output, strict),
        Commands::Show { schema } => {
            let schema = load_schema(&schema)?;
            println!("{}", export(&schema, &ExportOptions::new())?);
            Ok(())
        }
    }
}

fn handle_validate(
    schema: PathBuf,
    inputs: &[PathBuf],
    options: ValidatorOptions,
    call: &ValidateOptions,
    format: ReportFormat,
) -> Result<()> {
    let validator = Validator::with_options(load_schema(&schema)?, options);
    let reports = check::check_files(&validator, inputs, call)?;
    print!("{}", check::render(&reports, format)?);

    let invalid = reports.iter().filter(|report| !report.is_valid()).count();
    if invalid > 0 {
        bail!("{} of {} inputs failed validation", invalid, reports.len());
    }
    info!("All {} inputs are valid", reports.len());
    Ok(())
}

fn handle_types(
    schema: PathBuf,
    language: String,
    name: Option<String>,
    output: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let document = load_schema(&schema)?;

    let mut options = ExportOptions::types(language);
    if let Some(name) = name {
        options = options.with_root_name(name);
    }
    if strict {
        options = options.with_registry_mode(RegistryMode::Strict);
    }

    let code = export(&document, &options)
        .with_context(|| format!("Failed to emit types for {}", schema.display()))?;

    match output {
        Some(path) => {
            fs::write(&path, &code)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Generated types in {:?}", path);
        }
        None if code.ends_with('\n') => print!("{}", code),
        None => println!("{}", code),
    }
    Ok(())
}
