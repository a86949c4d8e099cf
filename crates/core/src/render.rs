//! Rendering registered workflows to files or a stream.

use crate::registry::Registry;
use crate::workflow::{EmitOptions, Workflow, emit_with};
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory workflows are written to unless configured otherwise
pub const DEFAULT_OUTPUT_DIR: &str = ".github/workflows";

/// Rendered YAML for one workflow together with its target path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Workflow name
    pub workflow: String,
    /// Where the document belongs on disk
    pub path: PathBuf,
    /// YAML text
    pub content: String,
}

/// Serializes workflows and places them under an output directory.
#[derive(Debug, Clone)]
pub struct Renderer {
    output_dir: PathBuf,
    options: EmitOptions,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl Renderer {
    /// Renderer writing below `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: EmitOptions::default(),
        }
    }

    /// Put a comment header above every document
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.options.header = Some(header.into());
        self
    }

    /// Replace the emit options
    #[must_use]
    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    /// Output directory
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Emit options
    #[must_use]
    pub const fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Target path of a workflow; absolute file names are kept as they are
    #[must_use]
    pub fn target_path(&self, workflow: &Workflow) -> PathBuf {
        self.output_dir.join(workflow.file_name())
    }

    /// Serialize one workflow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the workflow cannot be emitted.
    pub fn render(&self, workflow: &Workflow) -> Result<RenderedDocument> {
        Ok(RenderedDocument {
            workflow: workflow.name().to_string(),
            path: self.target_path(workflow),
            content: emit_with(workflow, &self.options)?,
        })
    }

    /// Serialize every registered workflow, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first serialization failure.
    pub fn render_all(&self, registry: &Registry) -> Result<Vec<RenderedDocument>> {
        registry.iter().map(|workflow| self.render(workflow)).collect()
    }

    /// Write mode: render all workflows, then write each to its target path.
    ///
    /// Nothing is written unless every workflow renders. Files that already
    /// hold the rendered bytes are left untouched but still reported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] before touching the filesystem, or
    /// [`Error::Io`] if a directory or file cannot be written.
    #[tracing::instrument(skip_all, fields(output_dir = %self.output_dir.display(), workflows = registry.len()))]
    pub fn write(&self, registry: &Registry) -> Result<Vec<PathBuf>> {
        let documents = self.render_all(registry)?;
        let mut written = Vec::with_capacity(documents.len());

        for document in documents {
            write_document(&document)?;
            written.push(document.path);
        }
        Ok(written)
    }

    /// Print mode: stream all documents, separated by `---` lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] before anything is written, or
    /// [`Error::Output`] if the stream fails.
    #[tracing::instrument(skip_all, fields(workflows = registry.len()))]
    pub fn print<W: Write>(&self, registry: &Registry, out: &mut W) -> Result<()> {
        let documents = self.render_all(registry)?;
        for (index, document) in documents.iter().enumerate() {
            if index > 0 {
                out.write_all(b"---\n").map_err(Error::Output)?;
            }
            out.write_all(document.content.as_bytes())
                .map_err(Error::Output)?;
        }
        out.flush().map_err(Error::Output)
    }
}

fn write_document(document: &RenderedDocument) -> Result<()> {
    let path = &document.path;
    if std::fs::read_to_string(path).is_ok_and(|existing| existing == document.content) {
        tracing::debug!(workflow = %document.workflow, path = %path.display(), "Unchanged");
        return Ok(());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!(parent = %parent.display(), error = %e, "Failed to create parent directory");
            Error::io("create directory", parent, e)
        })?;
    }
    std::fs::write(path, &document.content).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to write workflow");
        Error::io("write", path, e)
    })?;

    tracing::info!(workflow = %document.workflow, "Generated: {}", path.display());
    Ok(())
}
