//! Ordered set of workflows handled by one invocation.

use crate::workflow::{ValidationError, Workflow};
use std::path::PathBuf;

/// Workflows in registration order, unique by name and by target file.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    workflows: Vec<Workflow>,
}

impl Registry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workflow.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateWorkflow`] when a workflow with the
    /// same name is registered and [`ValidationError::DuplicateTarget`] when
    /// another workflow already renders to the same file.
    pub fn register(&mut self, workflow: Workflow) -> Result<&mut Self, ValidationError> {
        if self.get(workflow.name()).is_some() {
            return Err(ValidationError::DuplicateWorkflow {
                workflow: workflow.name().to_string(),
            });
        }
        if let Some(other) = self
            .workflows
            .iter()
            .find(|other| other.file_name() == workflow.file_name())
        {
            return Err(ValidationError::DuplicateTarget {
                workflow: workflow.name().to_string(),
                other: other.name().to_string(),
                path: PathBuf::from(workflow.file_name()),
            });
        }

        tracing::debug!(
            workflow = workflow.name(),
            file = workflow.file_name(),
            "Registered workflow"
        );
        self.workflows.push(workflow);
        Ok(self)
    }

    /// Look up a workflow by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|workflow| workflow.name() == name)
    }

    /// Workflows in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Workflow> {
        self.workflows.iter()
    }

    /// Number of registered workflows
    #[must_use]
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    /// True when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Workflow;
    type IntoIter = std::slice::Iter<'a, Workflow>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
