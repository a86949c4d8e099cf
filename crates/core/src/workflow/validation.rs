//! Workflow Validation
//!
//! Structural rules checked while workflows are built, plus the dependency
//! graph check the emitter repeats before rendering.

use super::schema::{Job, Matrix, Step, StepKind, Trigger, TriggerEvent, Workflow};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

/// Validation errors for the workflow model
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Step sets both `uses` and `run`
    #[error("Step '{step}' sets both an action and a command; exactly one is allowed")]
    AmbiguousStep {
        /// Step label
        step: String,
    },

    /// Step sets neither `uses` nor `run`
    #[error("Step '{step}' sets neither an action nor a command")]
    MissingStepKind {
        /// Step label
        step: String,
    },

    /// Step sets a field that belongs to the other step kind
    #[error("Step '{step}' sets '{field}', which does not apply to this kind of step")]
    IncompatibleStepField {
        /// Step label
        step: String,
        /// Offending YAML key
        field: &'static str,
    },

    /// Command step without command text
    #[error("Step '{step}' has an empty command")]
    EmptyCommand {
        /// Step label
        step: String,
    },

    /// Action step without an action name
    #[error("Step '{step}' references an action with an empty name")]
    EmptyActionName {
        /// Step label
        step: String,
    },

    /// A step inside a job failed validation
    #[error("Job '{job}': {source}")]
    InvalidStep {
        /// Job identifier
        job: String,
        /// What was wrong with the step
        #[source]
        source: Box<ValidationError>,
    },

    /// Job built with an empty identifier
    #[error("Job identifier must not be empty")]
    EmptyJobId,

    /// Job without steps
    #[error("Job '{job}' has no steps")]
    EmptySteps {
        /// Job identifier
        job: String,
    },

    /// Two steps in one job share an id
    #[error("Job '{job}' has more than one step with id '{step_id}'")]
    DuplicateStepId {
        /// Job identifier
        job: String,
        /// Repeated step id
        step_id: String,
    },

    /// Job lists the same dependency twice
    #[error("Job '{job}' lists dependency '{dependency}' more than once")]
    DuplicateDependency {
        /// Job identifier
        job: String,
        /// Repeated dependency
        dependency: String,
    },

    /// Job lists itself as a dependency
    #[error("Job '{job}' depends on itself")]
    SelfDependency {
        /// Job identifier
        job: String,
    },

    /// Matrix without axes
    #[error("Job '{job}' has a matrix without any axis or include entry")]
    EmptyMatrix {
        /// Job identifier
        job: String,
    },

    /// A matrix axis has no values
    #[error("Job '{job}' has matrix axis '{axis}' without values")]
    EmptyMatrixAxis {
        /// Job identifier
        job: String,
        /// Axis name
        axis: String,
    },

    /// Workflow built with an empty name
    #[error("Workflow name must not be empty")]
    EmptyWorkflowName,

    /// The target file name is unusable
    #[error("Workflow '{workflow}' has invalid file name '{file_name}': {reason}")]
    InvalidFileName {
        /// Workflow name
        workflow: String,
        /// Offending file name
        file_name: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// The same event was registered twice
    #[error("Workflow '{workflow}' already has a '{event}' trigger")]
    DuplicateTrigger {
        /// Workflow name
        workflow: String,
        /// Repeated event
        event: TriggerEvent,
    },

    /// Schedule trigger without cron expressions, or with a blank one
    #[error("Workflow '{workflow}' has a schedule trigger with a missing or blank cron expression")]
    EmptySchedule {
        /// Workflow name
        workflow: String,
    },

    /// Workflow built without triggers
    #[error("Workflow '{workflow}' has no triggers")]
    NoTriggers {
        /// Workflow name
        workflow: String,
    },

    /// Workflow built without jobs
    #[error("Workflow '{workflow}' has no jobs")]
    NoJobs {
        /// Workflow name
        workflow: String,
    },

    /// Concurrency settings with a blank group
    #[error("Workflow '{workflow}' has a concurrency setting with an empty group")]
    EmptyConcurrencyGroup {
        /// Workflow name
        workflow: String,
    },

    /// Two jobs share an identifier
    #[error("Workflow '{workflow}' already has a job '{job}'")]
    DuplicateJob {
        /// Workflow name
        workflow: String,
        /// Repeated job identifier
        job: String,
    },

    /// A job depends on a job that is not part of the workflow
    #[error("Job '{job}' in workflow '{workflow}' depends on unknown job '{dependency}'")]
    UnknownDependency {
        /// Workflow name
        workflow: String,
        /// Dependent job
        job: String,
        /// Missing dependency
        dependency: String,
    },

    /// Job dependencies form a cycle
    #[error("Workflow '{workflow}' has a dependency cycle involving: {jobs}")]
    DependencyCycle {
        /// Workflow name
        workflow: String,
        /// Comma-separated jobs on the cycle
        jobs: String,
    },

    /// Two registered workflows share a name
    #[error("A workflow named '{workflow}' is already registered")]
    DuplicateWorkflow {
        /// Workflow name
        workflow: String,
    },

    /// Two registered workflows would be written to the same file
    #[error("Workflows '{workflow}' and '{other}' both target {}", path.display())]
    DuplicateTarget {
        /// Workflow being registered
        workflow: String,
        /// Workflow already registered
        other: String,
        /// Shared target
        path: PathBuf,
    },
}

/// Check a single step in isolation
pub(crate) fn check_step(step: &Step) -> Result<(), ValidationError> {
    match step.kind() {
        StepKind::Command(command) if command.text().trim().is_empty() => {
            Err(ValidationError::EmptyCommand { step: step.label() })
        }
        StepKind::Action(action) if action.name().trim().is_empty() => {
            Err(ValidationError::EmptyActionName { step: step.label() })
        }
        _ => Ok(()),
    }
}

/// Check everything about a job that does not need the rest of the workflow
pub(crate) fn check_job(job: &Job) -> Result<(), ValidationError> {
    let id = job.id();
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyJobId);
    }
    if job.steps().is_empty() {
        return Err(ValidationError::EmptySteps { job: id.to_string() });
    }

    let mut step_ids = HashSet::new();
    for step in job.steps() {
        check_step(step).map_err(|source| ValidationError::InvalidStep {
            job: id.to_string(),
            source: Box::new(source),
        })?;

        if let Some(step_id) = step.id().filter(|step_id| !step_id.is_empty())
            && !step_ids.insert(step_id)
        {
            return Err(ValidationError::DuplicateStepId {
                job: id.to_string(),
                step_id: step_id.to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    for dependency in job.needs() {
        if dependency == id {
            return Err(ValidationError::SelfDependency { job: id.to_string() });
        }
        if !seen.insert(dependency.as_str()) {
            return Err(ValidationError::DuplicateDependency {
                job: id.to_string(),
                dependency: dependency.clone(),
            });
        }
    }

    if let Some(strategy) = job.strategy()
        && let Matrix::Axes(axes) = &strategy.matrix
    {
        if axes.dimensions.is_empty() && axes.include.is_empty() {
            return Err(ValidationError::EmptyMatrix { job: id.to_string() });
        }
        if let Some((axis, _)) = axes.dimensions.iter().find(|(_, values)| values.is_empty()) {
            return Err(ValidationError::EmptyMatrixAxis {
                job: id.to_string(),
                axis: axis.clone(),
            });
        }
    }

    Ok(())
}

pub(crate) fn check_trigger(workflow: &str, trigger: &Trigger) -> Result<(), ValidationError> {
    match trigger {
        Trigger::Schedule(crons)
            if crons.is_empty() || crons.iter().any(|cron| cron.trim().is_empty()) =>
        {
            Err(ValidationError::EmptySchedule {
                workflow: workflow.to_string(),
            })
        }
        _ => Ok(()),
    }
}

pub(crate) fn check_file_name(workflow: &str, file_name: &str) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::InvalidFileName {
        workflow: workflow.to_string(),
        file_name: file_name.to_string(),
        reason,
    };

    let stem = file_name
        .strip_suffix(".yml")
        .or_else(|| file_name.strip_suffix(".yaml"))
        .ok_or_else(|| invalid("must end with .yml or .yaml"))?;
    if stem.is_empty() || stem.ends_with('/') {
        return Err(invalid("has no name before the extension"));
    }
    Ok(())
}

/// Order the jobs of a workflow so that every job comes after its dependencies.
///
/// Ties keep registration order. Workflows built through
/// [`WorkflowBuilder`](super::WorkflowBuilder) always succeed; the emitter
/// calls this again before rendering.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownDependency`] for a dependency outside the
/// workflow and [`ValidationError::DependencyCycle`] when the graph is cyclic.
pub fn dependency_order(workflow: &Workflow) -> Result<Vec<&str>, ValidationError> {
    let jobs = workflow.jobs();
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(jobs.len(), jobs.len());
    let indices: HashMap<&str, NodeIndex> = jobs
        .keys()
        .map(|id| (id.as_str(), graph.add_node(id.as_str())))
        .collect();

    for (id, job) in jobs {
        for dependency in job.needs() {
            let Some(&from) = indices.get(dependency.as_str()) else {
                return Err(ValidationError::UnknownDependency {
                    workflow: workflow.name().to_string(),
                    job: id.clone(),
                    dependency: dependency.clone(),
                });
            };
            graph.add_edge(from, indices[id.as_str()], ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(|index| graph[index]).collect()),
        Err(cycle) => {
            let start = graph[cycle.node_id()];
            let on_cycle: Vec<&str> = jobs
                .iter()
                .filter(|(id, _)| {
                    id.as_str() == start
                        || petgraph::algo::has_path_connecting(
                            &graph,
                            indices[start],
                            indices[id.as_str()],
                            None,
                        ) && petgraph::algo::has_path_connecting(
                            &graph,
                            indices[id.as_str()],
                            indices[start],
                            None,
                        )
                })
                .map(|(id, _)| id.as_str())
                .collect();
            Err(ValidationError::DependencyCycle {
                workflow: workflow.name().to_string(),
                jobs: on_cycle.join(", "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Command, JobBuilder, MatrixAxes, Step, Strategy, WorkflowBuilder};

    #[test]
    fn test_empty_command_rejected() {
        let err = JobBuilder::new("build")
            .step(Step::command(""))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Job 'build': Step 'run: ' has an empty command"
        );
    }

    #[test]
    fn test_empty_action_rejected() {
        let err = JobBuilder::new("build")
            .step(Step::action("", "v1").with_id("setup"))
            .build()
            .unwrap_err();
        let ValidationError::InvalidStep { job, source } = err else {
            panic!("expected InvalidStep");
        };
        assert_eq!(job, "build");
        assert_eq!(
            *source,
            ValidationError::EmptyActionName {
                step: "setup".to_string()
            }
        );
    }

    #[test]
    fn test_job_without_steps_rejected() {
        let err = JobBuilder::new("build").build().unwrap_err();
        assert_eq!(err, ValidationError::EmptySteps { job: "build".to_string() });
    }

    #[test]
    fn test_empty_job_id_rejected() {
        let err = JobBuilder::new("")
            .step(Step::command("make"))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyJobId);
    }

    #[test]
    fn test_duplicate_step_id_rejected() {
        let err = JobBuilder::new("build")
            .step(Step::command("make").with_id("make"))
            .step(Step::new(Command::new("make install")).with_id("make"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateStepId { step_id, .. } if step_id == "make"));
    }

    #[test]
    fn test_duplicate_and_self_dependency_rejected() {
        let err = JobBuilder::new("deploy")
            .needs("build")
            .needs("build")
            .step(Step::command("make deploy"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateDependency { .. }));

        let err = JobBuilder::new("deploy")
            .needs("deploy")
            .step(Step::command("make deploy"))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::SelfDependency { job: "deploy".to_string() });
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let err = JobBuilder::new("test")
            .strategy(Strategy::new(MatrixAxes::new()))
            .step(Step::command("make test"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyMatrix { .. }));

        let err = JobBuilder::new("test")
            .strategy(Strategy::new(MatrixAxes::new().with_axis("os", Vec::<&str>::new())))
            .step(Step::command("make test"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyMatrixAxis { axis, .. } if axis == "os"));
    }

    #[test]
    fn test_file_name_rules() {
        assert!(check_file_name("ci", "ci.yml").is_ok());
        assert!(check_file_name("ci", "nested/ci.yaml").is_ok());
        assert!(check_file_name("ci", "ci.json").is_err());
        assert!(check_file_name("ci", ".yml").is_err());
    }

    #[test]
    fn test_symbols_only_name_needs_explicit_file_name() {
        let err = WorkflowBuilder::new("!!!")
            .on(Trigger::push())
            .unwrap()
            .job(JobBuilder::new("a").step(Step::command("true")).build().unwrap())
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFileName { .. }));
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let err = WorkflowBuilder::new("nightly")
            .on(Trigger::schedule(Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptySchedule { .. }));
    }

    #[test]
    fn test_blank_cron_among_valid_ones_rejected() {
        let err = WorkflowBuilder::new("nightly")
            .on(Trigger::schedule(["", "0 0 * * *"]))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptySchedule {
                workflow: "nightly".to_string()
            }
        );
        assert!(err.to_string().contains("nightly"));
    }

    #[test]
    fn test_empty_concurrency_group_rejected() {
        let err = WorkflowBuilder::new("deploy")
            .concurrency(crate::workflow::Concurrency::group(" "))
            .on(Trigger::push())
            .unwrap()
            .job(JobBuilder::new("a").step(Step::command("true")).build().unwrap())
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyConcurrencyGroup {
                workflow: "deploy".to_string()
            }
        );
    }

    #[test]
    fn test_empty_step_ids_do_not_collide() {
        let job = JobBuilder::new("build")
            .step(Step::command("make").with_id(""))
            .step(Step::command("make test").with_id(""))
            .build();
        assert!(job.is_ok());
    }

    #[test]
    fn test_dependency_order() {
        let job = |id: &str, needs: &[&str]| {
            needs
                .iter()
                .fold(JobBuilder::new(id), |builder, dep| builder.needs(*dep))
                .step(Step::command("true"))
                .build()
                .unwrap()
        };

        let workflow = WorkflowBuilder::new("ci")
            .on(Trigger::push())
            .unwrap()
            .job(job("lint", &[]))
            .unwrap()
            .job(job("build", &[]))
            .unwrap()
            .job(job("deploy", &["build", "lint"]))
            .unwrap()
            .build()
            .unwrap();

        let order = dependency_order(&workflow).unwrap();
        let position = |id| order.iter().position(|j| *j == id).unwrap();
        assert!(position("deploy") > position("build"));
        assert!(position("deploy") > position("lint"));
    }
}
