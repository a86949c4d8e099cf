//! # actiongen-core
//!
//! Declare GitHub Actions workflows in Rust and render them to YAML.
//!
//! This crate provides:
//! - [`workflow`]: the workflow model (staged builders producing immutable values)
//!   and the deterministic YAML emitter
//! - [`render::Renderer`]: write mode and print mode over a [`Registry`]
//! - [`verify`]: check mode, comparing committed files against fresh renderings
//! - [`diff`]: the line diff used to report drift
//! - [`actions`]: helpers for commonly used actions (checkout, artifacts, cache)
//!
//! ## Example
//!
//! ```
//! use actiongen_core::workflow::{JobBuilder, Step, Trigger, WorkflowBuilder, emit};
//!
//! # fn main() -> actiongen_core::Result<()> {
//! let workflow = WorkflowBuilder::new("ci")
//!     .on(Trigger::push())?
//!     .job(
//!         JobBuilder::new("build")
//!             .runs_on("ubuntu-latest")
//!             .step(Step::action("actions/checkout", "v4"))
//!             .build()?,
//!     )?
//!     .build()?;
//!
//! assert!(emit(&workflow)?.starts_with("name: ci\non: [push]\n"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod actions;
pub mod diff;
pub mod registry;
pub mod render;
pub mod verify;
pub mod workflow;

pub use diff::{DiffLine, LineDiff, LineKind, diff_lines};
pub use registry::Registry;
pub use render::{RenderedDocument, Renderer};
pub use verify::{Verification, VerifyReport};
pub use workflow::{SerializationError, ValidationError};

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the workflow toolkit.
#[derive(Error, Debug)]
pub enum Error {
    /// The model was structurally invalid when it was built
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A model invariant failed while rendering YAML
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The committed file a workflow is verified against does not exist
    #[error("Workflow '{workflow}' has no generated file at {}", path.display())]
    MissingFile {
        /// Name of the workflow being verified
        workflow: String,
        /// Expected location of the file
        path: PathBuf,
    },

    /// Any other filesystem failure
    #[error("I/O error while trying to {operation} {}: {source}", path.display())]
    Io {
        /// What was being attempted
        operation: &'static str,
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Writing rendered documents to an output stream failed
    #[error("Failed to write rendered output: {0}")]
    Output(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_display() {
        let error = Error::MissingFile {
            workflow: "ci".to_string(),
            path: PathBuf::from(".github/workflows/ci.yml"),
        };
        assert_eq!(
            error.to_string(),
            "Workflow 'ci' has no generated file at .github/workflows/ci.yml"
        );
    }

    #[test]
    fn test_io_error_display() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = Error::io("write", "/tmp/ci.yml", source);
        assert!(matches!(error, Error::Io { .. }));
        assert_eq!(error.to_string(), "I/O error while trying to write /tmp/ci.yml: denied");
    }

    #[test]
    fn test_validation_error_converts() {
        let error: Error = ValidationError::NoJobs {
            workflow: "ci".to_string(),
        }
        .into();
        assert!(matches!(error, Error::Validation(_)));
        assert!(error.to_string().contains("ci"));
    }
}
