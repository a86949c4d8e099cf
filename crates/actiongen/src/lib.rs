//! # actiongen
//!
//! Command-line front-end for [`actiongen_core`]. A generator binary declares
//! its workflows in a closure and hands control to [`main`]:
//!
//! ```no_run
//! use actiongen_core::workflow::{JobBuilder, Step, Trigger, WorkflowBuilder};
//!
//! fn main() -> std::process::ExitCode {
//!     actiongen::main(|registry| {
//!         let ci = WorkflowBuilder::new("ci")
//!             .on(Trigger::push())?
//!             .job(
//!                 JobBuilder::new("build")
//!                     .step(Step::action("actions/checkout", "v4"))
//!                     .build()?,
//!             )?
//!             .build()?;
//!         registry.register(ci)?;
//!         Ok(())
//!     })
//! }
//! ```
//!
//! Running the binary writes `.github/workflows/ci.yml`; `--print` streams the
//! YAML to stdout and `--check` verifies the committed files instead.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod logging;

use actiongen_core::{Registry, Renderer, VerifyReport, verify::Failure};
use clap::Parser;
use cli::{Cli, CliError, EXIT_OK, Mode, exit_code_for, render_error};
use config::Settings;
use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

/// Run the front-end with the process arguments and standard streams.
pub fn main<F>(build: F) -> ExitCode
where
    F: FnOnce(&mut Registry) -> actiongen_core::Result<()>,
{
    let code = run_with(
        std::env::args_os(),
        build,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}

/// Run the front-end against explicit arguments and output streams.
///
/// Returns the process exit code: see the `EXIT_*` constants in [`cli`].
pub fn run_with<I, T, F, O, E>(args: I, build: F, stdout: &mut O, stderr: &mut E) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce(&mut Registry) -> actiongen_core::Result<()>,
    O: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let rendered = err.render();
            // --help and --version are not errors and belong on stdout
            let _ = if err.use_stderr() {
                write!(stderr, "{rendered}")
            } else {
                write!(stdout, "{rendered}")
            };
            return err.exit_code();
        }
    };

    logging::init_tracing(cli.level, cli.log_format);

    match run(&cli, build, stdout, stderr) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            tracing::debug!(error = %err, "Command failed");
            render_error(&err, stderr);
            exit_code_for(&err)
        }
    }
}

#[tracing::instrument(skip_all, fields(mode = ?cli.mode()))]
fn run<F, O, E>(cli: &Cli, build: F, stdout: &mut O, stderr: &mut E) -> Result<(), CliError>
where
    F: FnOnce(&mut Registry) -> actiongen_core::Result<()>,
    O: Write,
    E: Write,
{
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::config(format!("Cannot determine working directory: {e}")))?;
    let settings = Settings::resolve(cli, &cwd)?;

    let mut registry = Registry::new();
    build(&mut registry)?;
    if registry.is_empty() {
        tracing::warn!("No workflows registered");
    }

    let mut renderer = Renderer::new(settings.output_dir.clone());
    if let Some(header) = &settings.header {
        renderer = renderer.with_header(header.as_str());
    }

    match cli.mode() {
        Mode::Write => {
            let written = renderer.write(&registry)?;
            tracing::info!(count = written.len(), "Workflows up to date");
            Ok(())
        }
        Mode::Print => Ok(renderer.print(&registry, stdout)?),
        Mode::Check => report_verification(&renderer.verify_all(&registry), stderr),
    }
}

/// Write drift to `out` and turn the report into a result.
///
/// Errors other than a missing file take precedence over drift.
fn report_verification<E: Write>(report: &VerifyReport, out: &mut E) -> Result<(), CliError> {
    let mut drifted = 0;
    let mut fatal = None;

    for failure in report.failures() {
        let written = match failure {
            Failure::Drift { workflow, path, diff } => {
                drifted += 1;
                tracing::debug!(workflow, path = %path.display(), changes = diff.changes().count(), "Out of date");
                let committed = format!("{} (committed)", path.display());
                let generated = format!("{} (generated)", path.display());
                write!(out, "{}", diff.unified(&committed, &generated))
            }
            Failure::Error {
                workflow,
                error: actiongen_core::Error::MissingFile { path, .. },
            } => {
                drifted += 1;
                writeln!(out, "missing: {} (workflow '{workflow}')", path.display())
            }
            Failure::Error { workflow, error } => {
                tracing::error!(workflow, error = %error, "Verification failed");
                if fatal.is_none() {
                    fatal = Some(CliError::model(format!("Workflow '{workflow}': {error}")));
                }
                Ok(())
            }
        };
        written.map_err(|e| CliError::model(format!("Failed to write report: {e}")))?;
    }

    if let Some(err) = fatal {
        return Err(err);
    }
    if drifted > 0 {
        return Err(CliError::Drift { count: drifted });
    }
    tracing::info!(matched = report.matched(), "All workflows up to date");
    Ok(())
}
