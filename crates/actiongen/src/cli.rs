//! Command-line arguments, front-end errors and exit codes

use crate::logging::{LogFormat, LogLevel};
use clap::Parser;
use miette::{Diagnostic, Report};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Success exit code
pub const EXIT_OK: i32 = 0;

/// Check mode found drifted or missing files
pub const EXIT_DRIFT: i32 = 1;

/// CLI or configuration error
pub const EXIT_CLI: i32 = 2;

/// Model, serialization or I/O error
pub const EXIT_MODEL: i32 = 3;

/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "ACTIONGEN_OUTPUT_DIR";

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "ACTIONGEN_CONFIG";

/// Front-end errors with exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Invalid arguments or configuration (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(actiongen::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The workflows could not be built, rendered or written (exit code 3)
    #[error("Generation failed: {message}")]
    #[diagnostic(code(actiongen::cli::model))]
    Model {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Committed files are out of date (exit code 1)
    #[error("{count} workflow file(s) out of date")]
    #[diagnostic(
        code(actiongen::cli::drift),
        help("Run without --check to regenerate the workflow files, then commit the result")
    )]
    Drift {
        /// Number of drifted or missing files
        count: usize,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new generation error
    #[must_use]
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            help: None,
        }
    }
}

impl From<actiongen_core::Error> for CliError {
    fn from(err: actiongen_core::Error) -> Self {
        use actiongen_core::Error;

        let help = match &err {
            Error::Validation(_) => Some("Fix the workflow definition in your generator".to_string()),
            Error::MissingFile { .. } => {
                Some("Run without --check to create the missing file".to_string())
            }
            Error::Serialization(_) | Error::Io { .. } | Error::Output(_) => None,
        };
        Self::Model {
            message: err.to_string(),
            help,
        }
    }
}

impl From<actiongen_core::ValidationError> for CliError {
    fn from(err: actiongen_core::ValidationError) -> Self {
        actiongen_core::Error::from(err).into()
    }
}

/// Map an error to its process exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Drift { .. } => EXIT_DRIFT,
        CliError::Config { .. } => EXIT_CLI,
        CliError::Model { .. } => EXIT_MODEL,
    }
}

/// Render an error as a miette report on `out`
pub fn render_error<W: Write>(err: &CliError, out: &mut W) {
    let report = Report::new(err.clone());
    // Nowhere left to report a failed write
    let _ = writeln!(out, "{report:?}");
}

/// What to do with the rendered workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write one file per workflow
    Write,
    /// Stream all documents to stdout
    Print,
    /// Compare committed files against fresh renderings
    Check,
}

/// Generate GitHub Actions workflow files
#[derive(Parser, Debug)]
#[command(name = "actiongen")]
#[command(about = "Generate GitHub Actions workflow files from Rust definitions")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Print the rendered YAML to stdout instead of writing files.
    #[arg(long, conflicts_with = "check")]
    pub print: bool,

    /// Verify committed files match the rendered YAML without writing.
    #[arg(long)]
    pub check: bool,

    /// Directory the workflow files live in.
    #[arg(long, value_name = "DIR", env = OUTPUT_DIR_ENV)]
    pub output_dir: Option<PathBuf>,

    /// Configuration file (defaults to actiongen.toml when present).
    #[arg(long, value_name = "FILE", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long, default_value = "compact", value_enum)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Selected mode; write mode when neither `--print` nor `--check` is set
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.print {
            Mode::Print
        } else if self.check {
            Mode::Check
        } else {
            Mode::Write
        }
    }
}
