//! GitHub Actions workflow model and YAML emitter.
//!
//! - [`schema`]: workflows, jobs, steps and triggers with their builders
//! - [`validation`]: structural rules enforced while building
//! - [`emitter`]: deterministic YAML serialization

pub mod emitter;
pub mod schema;
pub mod validation;

pub use emitter::{EmitOptions, SerializationError, emit, emit_with};
pub use schema::{
    Action, Command, Concurrency, DEFAULT_RUNNER, EnvVars, Expression, Job, JobBuilder, Matrix,
    MatrixAxes, PermissionLevel, Permissions, PullRequestTrigger, PushTrigger, ReleaseTrigger,
    RunsOn, Step, StepBuilder, StepKind, Strategy, Trigger, TriggerEvent, Value, Workflow,
    WorkflowBuilder, WorkflowDispatchTrigger, WorkflowInput, sanitize_filename,
};
pub use validation::{ValidationError, dependency_order};
