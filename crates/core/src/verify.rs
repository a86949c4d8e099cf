//! Check mode: compare committed workflow files with fresh renderings.
//!
//! Drift is not an error. [`Renderer::verify`] returns
//! [`Verification::Mismatch`] carrying the diff, and [`VerifyReport`] collects
//! every outcome so a caller can report all of them before choosing an exit
//! status.

use crate::diff::{LineDiff, diff_lines};
use crate::registry::Registry;
use crate::render::Renderer;
use crate::workflow::Workflow;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Outcome of verifying one workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The file holds exactly the rendered bytes
    Match {
        /// Verified file
        path: PathBuf,
    },
    /// The file differs from the rendering
    Mismatch {
        /// Verified file
        path: PathBuf,
        /// Persisted text → rendered text
        diff: LineDiff,
    },
}

impl Verification {
    /// True for [`Verification::Match`]
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// Verified file
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Match { path } | Self::Mismatch { path, .. } => path,
        }
    }
}

/// Verification outcome for one registered workflow
#[derive(Debug)]
pub struct VerifyEntry {
    /// Workflow name
    pub workflow: String,
    /// Match, mismatch, or the error that prevented comparison
    pub outcome: Result<Verification>,
}

/// A workflow that did not verify
#[derive(Debug)]
pub enum Failure<'a> {
    /// Persisted file differs
    Drift {
        /// Workflow name
        workflow: &'a str,
        /// Verified file
        path: &'a Path,
        /// Persisted text → rendered text
        diff: &'a LineDiff,
    },
    /// Rendering or reading failed (including a missing file)
    Error {
        /// Workflow name
        workflow: &'a str,
        /// What went wrong
        error: &'a Error,
    },
}

/// Outcomes for every registered workflow, in registration order
#[derive(Debug, Default)]
pub struct VerifyReport {
    entries: Vec<VerifyEntry>,
}

impl VerifyReport {
    /// True only when every workflow matched
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| matches!(&entry.outcome, Ok(v) if v.is_match()))
    }

    /// All entries
    #[must_use]
    pub fn entries(&self) -> &[VerifyEntry] {
        &self.entries
    }

    /// Number of workflows that matched
    #[must_use]
    pub fn matched(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(&entry.outcome, Ok(v) if v.is_match()))
            .count()
    }

    /// Drift and errors, in registration order
    pub fn failures(&self) -> impl Iterator<Item = Failure<'_>> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            Ok(Verification::Match { .. }) => None,
            Ok(Verification::Mismatch { path, diff }) => Some(Failure::Drift {
                workflow: &entry.workflow,
                path,
                diff,
            }),
            Err(error) => Some(Failure::Error {
                workflow: &entry.workflow,
                error,
            }),
        })
    }
}

impl Renderer {
    /// Verify one workflow against its target file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFile`] when the target does not exist,
    /// [`Error::Io`] when it cannot be read and [`Error::Serialization`] when
    /// the workflow cannot be rendered. A file that is not valid UTF-8 is
    /// reported as a [`Verification::Mismatch`].
    pub fn verify(&self, workflow: &Workflow) -> Result<Verification> {
        let document = self.render(workflow)?;
        let persisted = match std::fs::read(&document.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingFile {
                    workflow: document.workflow,
                    path: document.path,
                });
            }
            Err(e) => return Err(Error::io("read", document.path, e)),
        };

        if persisted == document.content.as_bytes() {
            tracing::debug!(workflow = %document.workflow, path = %document.path.display(), "Up to date");
            return Ok(Verification::Match {
                path: document.path,
            });
        }

        tracing::debug!(workflow = %document.workflow, path = %document.path.display(), "Drift detected");
        Ok(Verification::Mismatch {
            diff: diff_lines(&String::from_utf8_lossy(&persisted), &document.content),
            path: document.path,
        })
    }

    /// Verify every registered workflow without stopping at the first failure
    #[tracing::instrument(skip_all, fields(output_dir = %self.output_dir().display(), workflows = registry.len()))]
    pub fn verify_all(&self, registry: &Registry) -> VerifyReport {
        let entries = registry
            .iter()
            .map(|workflow| VerifyEntry {
                workflow: workflow.name().to_string(),
                outcome: self.verify(workflow),
            })
            .collect();
        VerifyReport { entries }
    }
}
