//! Configuration file loading and settings resolution.
//!
//! Values come from, in order of precedence: command-line flags, environment
//! variables, the `actiongen.toml` file, then built-in defaults.

use crate::cli::{Cli, CliError};
use actiongen_core::render::DEFAULT_OUTPUT_DIR;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "actiongen.toml";

/// Contents of an `actiongen.toml` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory the workflow files live in, relative to the config file
    pub output_dir: Option<PathBuf>,
    /// Comment written at the top of every generated file
    pub header: Option<String>,
}

impl Config {
    /// Parse configuration text
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] on malformed TOML or unknown keys.
    pub fn parse(text: &str) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| {
            CliError::config_with_help(
                format!("Invalid configuration: {}", e.message()),
                "Supported keys are `output_dir` and `header`",
            )
        })
    }

    /// Read and parse a configuration file
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config_with_help(
                format!("Failed to read {}: {e}", path.display()),
                "Pass an existing file to --config or unset ACTIONGEN_CONFIG",
            )
        })?;
        let mut config = Self::parse(&text).map_err(|err| match err {
            CliError::Config { message, help } => CliError::Config {
                message: format!("{}: {message}", path.display()),
                help,
            },
            other => other,
        })?;

        if let Some(dir) = config.output_dir.take() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.output_dir = Some(base.join(dir));
        }
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `explicit` if given, otherwise `actiongen.toml` under `base` when
    /// it exists, otherwise the empty configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the chosen file cannot be loaded.
    pub fn discover(explicit: Option<&Path>, base: &Path) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let default = base.join(CONFIG_FILE_NAME);
        if default.is_file() {
            Self::from_path(&default)
        } else {
            Ok(Self::default())
        }
    }
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory the workflow files live in
    pub output_dir: PathBuf,
    /// Comment written at the top of every generated file
    pub header: Option<String>,
}

impl Settings {
    /// Merge parsed arguments with the configuration found from `base`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the configuration file cannot be loaded.
    pub fn resolve(cli: &Cli, base: &Path) -> Result<Self, CliError> {
        let config = Config::discover(cli.config.as_deref(), base)?;
        let output_dir = cli
            .output_dir
            .clone()
            .or(config.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            output_dir,
            header: config.header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CONFIG_ENV, OUTPUT_DIR_ENV};
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        temp_env::with_vars_unset([OUTPUT_DIR_ENV, CONFIG_ENV], || {
            Cli::try_parse_from(std::iter::once("actiongen").chain(args.iter().copied())).unwrap()
        })
    }

    #[test]
    fn test_parse_config() {
        let config = Config::parse("output_dir = \"ci\"\nheader = \"Generated\"\n").unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("ci")));
        assert_eq!(config.header.as_deref(), Some("Generated"));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = Config::parse("output = \"ci\"\n").unwrap_err();
        assert!(matches!(err, CliError::Config { help: Some(_), .. }));
    }

    #[test]
    fn test_relative_output_dir_follows_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("actiongen.toml");
        std::fs::write(&path, "output_dir = \"workflows\"\n").unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.output_dir, Some(temp.path().join("workflows")));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = Config::discover(Some(&temp.path().join("nope.toml")), temp.path()).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_discover_without_file_is_default() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Config::discover(None, temp.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::resolve(&cli(&[]), temp.path()).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.header, None);
    }

    #[test]
    fn test_config_file_is_discovered() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "output_dir = \"gen\"\nheader = \"Do not edit\"\n",
        )
        .unwrap();

        let settings = Settings::resolve(&cli(&[]), temp.path()).unwrap();
        assert_eq!(settings.output_dir, temp.path().join("gen"));
        assert_eq!(settings.header.as_deref(), Some("Do not edit"));
    }

    #[test]
    fn test_flag_beats_config_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "output_dir = \"gen\"\n").unwrap();

        let settings = Settings::resolve(&cli(&["--output-dir", "flag"]), temp.path()).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("flag"));
    }
}
