//! Binary entry point for the cxxsig CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Show the argument list of the call at a location
//! cxxsig scan --at src/widget.cpp:42:9
//!
//! # Preview a parameter change (unified diff inside the JSON response)
//! cxxsig change-params --file src/widget.cpp --request reorder.json
//!
//! # Route accesses of a field through accessors and write the result
//! cxxsig encapsulate-field --file src/widget.cpp --getter count --setter setCount \
//!     --at 17:12 --at 20:5 --apply
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use cxxsig::cli::{emit, run_change_params, run_encapsulate_field, run_scan};
use cxxsig::config::Config;
use cxxsig::error::{CxxsigError, OutputErrorCode};
use cxxsig::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Call-site aware C/C++ signature refactoring.
///
/// All output is JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "cxxsig", version, about = "Call-site aware C/C++ signature refactoring")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: cxxsig.toml in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Report the argument list of the call at a location.
    Scan {
        /// Location of the function name: path:line:col.
        #[arg(long)]
        at: String,
    },
    /// Reorder, add, remove or rename the parameters of a function.
    ///
    /// The JSON request names the new parameter list and the positions of
    /// declarations and call sites.
    #[command(name = "change-params")]
    ChangeParams {
        /// Source file to refactor.
        #[arg(long)]
        file: PathBuf,
        /// JSON request file.
        #[arg(long)]
        request: PathBuf,
        /// Write the result (default: preview only).
        #[arg(long)]
        apply: bool,
    },
    /// Replace direct accesses of a field with getter and setter calls.
    #[command(name = "encapsulate-field")]
    EncapsulateField {
        /// Source file to refactor.
        #[arg(long)]
        file: PathBuf,
        /// Getter name.
        #[arg(long)]
        getter: Option<String>,
        /// Setter name.
        #[arg(long)]
        setter: Option<String>,
        /// Field reference as line:col or byte offset (repeatable).
        #[arg(long = "at", required = true)]
        at: Vec<String>,
        /// Write the result (default: preview only).
        #[arg(long)]
        apply: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` overrides `--log-level`.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), CxxsigError> {
    let config = load_config(&cli.global)?;

    match cli.command {
        Command::Scan { at } => emit(&run_scan(&at)?, &config),
        Command::ChangeParams {
            file,
            request,
            apply,
        } => emit(&run_change_params(&file, &request, apply, &config)?, &config),
        Command::EncapsulateField {
            file,
            getter,
            setter,
            at,
            apply,
        } => emit(
            &run_encapsulate_field(&file, getter, setter, &at, apply)?,
            &config,
        ),
    }
}

fn load_config(global: &GlobalArgs) -> Result<Config, CxxsigError> {
    match &global.config {
        Some(path) => Config::load(path),
        None => Config::load_from_dir(&std::env::current_dir()?),
    }
}
