//! Logging setup for the command-line front-end.
//!
//! Logs always go to stderr so print mode keeps stdout pure YAML. `RUST_LOG`
//! takes precedence over the `-L` level when it is set.

use std::io;
pub use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level options for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact single-line format
    Compact,
    /// Pretty-printed multi-line format
    Pretty,
    /// Structured JSON format
    Json,
}

/// Filter directives for our own crates at `level`
#[must_use]
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("actiongen={level},actiongen_core={level}")
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens when
/// the front-end runs more than once in a process.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level.into())));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    let installed = match format {
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().with_target(true).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    }
    .is_ok();

    if installed {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), format = ?format, "Tracing initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_conversion() {
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "actiongen=debug,actiongen_core=debug"
        );
    }
}
