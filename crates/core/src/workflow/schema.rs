//! GitHub Actions Workflow Model
//!
//! Defines the data structures a workflow is declared with. Workflows, jobs
//! and steps are assembled through builders and are read-only once built.
//! See: <https://docs.github.com/en/actions/using-workflows/workflow-syntax-for-github-actions>

use super::validation::{self, ValidationError};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

/// Runner used when a job does not name one
pub const DEFAULT_RUNNER: &str = "ubuntu-latest";

/// A GitHub Actions expression, rendered as `${{ <expr> }}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    /// Wrap an expression body such as `secrets.TOKEN` or `matrix.os`
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// The expression body without the `${{ }}` delimiters
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{{ {} }}}}", self.0)
    }
}

/// A scalar value used in `env`, `with`, `outputs` and matrix axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain string
    String(String),
    /// Boolean, rendered as `true`/`false`
    Bool(bool),
    /// Integer, rendered in decimal
    Integer(i64),
    /// Expression, rendered as `${{ ... }}`
    Expression(Expression),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Expression> for Value {
    fn from(value: Expression) -> Self {
        Self::Expression(value)
    }
}

/// Environment variables; keys serialize in sorted order
pub type EnvVars = BTreeMap<String, Value>;

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

// =========================================================================
// Triggers
// =========================================================================

/// Events a workflow can be triggered by.
///
/// The declaration order is the order events are written under `on:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriggerEvent {
    /// `push`
    Push,
    /// `pull_request`
    PullRequest,
    /// `pull_request_target`
    PullRequestTarget,
    /// `release`
    Release,
    /// `schedule`
    Schedule,
    /// `workflow_dispatch`
    WorkflowDispatch,
    /// `workflow_call`
    WorkflowCall,
}

impl TriggerEvent {
    /// The event name as written in workflow files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::PullRequestTarget => "pull_request_target",
            Self::Release => "release",
            Self::Schedule => "schedule",
            Self::WorkflowDispatch => "workflow_dispatch",
            Self::WorkflowCall => "workflow_call",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push event trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushTrigger {
    /// Branch patterns to trigger on
    pub branches: Vec<String>,
    /// Branch patterns to skip
    pub branches_ignore: Vec<String>,
    /// Tag patterns to trigger on
    pub tags: Vec<String>,
    /// Tag patterns to skip
    pub tags_ignore: Vec<String>,
    /// Path patterns that must be matched to trigger
    pub paths: Vec<String>,
    /// Path patterns to ignore
    pub paths_ignore: Vec<String>,
}

impl PushTrigger {
    /// Restrict to the given branch patterns
    #[must_use]
    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches.extend(strings(branches));
        self
    }

    /// Skip the given branch patterns
    #[must_use]
    pub fn with_branches_ignore<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches_ignore.extend(strings(branches));
        self
    }

    /// Restrict to the given tag patterns
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(strings(tags));
        self
    }

    /// Skip the given tag patterns
    #[must_use]
    pub fn with_tags_ignore<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags_ignore.extend(strings(tags));
        self
    }

    /// Restrict to changes touching the given paths
    #[must_use]
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(strings(paths));
        self
    }

    /// Ignore changes that only touch the given paths
    #[must_use]
    pub fn with_paths_ignore<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths_ignore.extend(strings(paths));
        self
    }

    /// True when no filter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
            && self.branches_ignore.is_empty()
            && self.tags.is_empty()
            && self.tags_ignore.is_empty()
            && self.paths.is_empty()
            && self.paths_ignore.is_empty()
    }
}

/// Pull request event trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestTrigger {
    /// Branch patterns to trigger on (target branches)
    pub branches: Vec<String>,
    /// Target branch patterns to skip
    pub branches_ignore: Vec<String>,
    /// Activity types to trigger on (e.g., "opened", "synchronize")
    pub types: Vec<String>,
    /// Path patterns that must be matched to trigger
    pub paths: Vec<String>,
    /// Path patterns to ignore
    pub paths_ignore: Vec<String>,
}

impl PullRequestTrigger {
    /// Restrict to the given target branch patterns
    #[must_use]
    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches.extend(strings(branches));
        self
    }

    /// Skip the given target branch patterns
    #[must_use]
    pub fn with_branches_ignore<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches_ignore.extend(strings(branches));
        self
    }

    /// Restrict to the given activity types
    #[must_use]
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(strings(types));
        self
    }

    /// Restrict to changes touching the given paths
    #[must_use]
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(strings(paths));
        self
    }

    /// Ignore changes that only touch the given paths
    #[must_use]
    pub fn with_paths_ignore<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths_ignore.extend(strings(paths));
        self
    }

    /// True when no filter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
            && self.branches_ignore.is_empty()
            && self.types.is_empty()
            && self.paths.is_empty()
            && self.paths_ignore.is_empty()
    }
}

/// Release event trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseTrigger {
    /// Activity types to trigger on (e.g., "published", "created")
    pub types: Vec<String>,
}

/// Manual workflow dispatch trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowDispatchTrigger {
    /// Input parameters for manual trigger
    pub inputs: BTreeMap<String, WorkflowInput>,
}

impl WorkflowDispatchTrigger {
    /// Add an input parameter
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, input: WorkflowInput) -> Self {
        self.inputs.insert(name.into(), input);
        self
    }
}

/// Input definition for `workflow_dispatch` triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInput {
    /// Human-readable description of the input
    pub description: String,
    /// Whether the input is required
    pub required: Option<bool>,
    /// Default value for the input
    pub default: Option<String>,
    /// Input type (string, boolean, choice, environment)
    pub input_type: Option<String>,
}

impl WorkflowInput {
    /// Create an input with a description and no other settings
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: None,
            default: None,
            input_type: None,
        }
    }
}

/// A single trigger of a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Run on pushes
    Push(PushTrigger),
    /// Run on pull request activity
    PullRequest(PullRequestTrigger),
    /// Run on pull request activity in the context of the base branch
    PullRequestTarget(PullRequestTrigger),
    /// Run on release activity
    Release(ReleaseTrigger),
    /// Run on cron schedules
    Schedule(Vec<String>),
    /// Run when started manually
    WorkflowDispatch(WorkflowDispatchTrigger),
    /// Run when called from another workflow
    WorkflowCall,
}

impl Trigger {
    /// Unfiltered push trigger
    #[must_use]
    pub fn push() -> Self {
        Self::Push(PushTrigger::default())
    }

    /// Unfiltered pull request trigger
    #[must_use]
    pub fn pull_request() -> Self {
        Self::PullRequest(PullRequestTrigger::default())
    }

    /// Manual trigger without inputs
    #[must_use]
    pub fn workflow_dispatch() -> Self {
        Self::WorkflowDispatch(WorkflowDispatchTrigger::default())
    }

    /// Scheduled trigger from cron expressions
    pub fn schedule<I, S>(crons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Schedule(strings(crons))
    }

    /// The event this trigger listens to
    #[must_use]
    pub const fn event(&self) -> TriggerEvent {
        match self {
            Self::Push(_) => TriggerEvent::Push,
            Self::PullRequest(_) => TriggerEvent::PullRequest,
            Self::PullRequestTarget(_) => TriggerEvent::PullRequestTarget,
            Self::Release(_) => TriggerEvent::Release,
            Self::Schedule(_) => TriggerEvent::Schedule,
            Self::WorkflowDispatch(_) => TriggerEvent::WorkflowDispatch,
            Self::WorkflowCall => TriggerEvent::WorkflowCall,
        }
    }

    /// True when the trigger carries no configuration beyond its event name
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        match self {
            Self::Push(push) => push.is_empty(),
            Self::PullRequest(pr) | Self::PullRequestTarget(pr) => pr.is_empty(),
            Self::Release(release) => release.types.is_empty(),
            Self::Schedule(_) => false,
            Self::WorkflowDispatch(dispatch) => dispatch.inputs.is_empty(),
            Self::WorkflowCall => true,
        }
    }
}

impl From<PushTrigger> for Trigger {
    fn from(value: PushTrigger) -> Self {
        Self::Push(value)
    }
}

impl From<PullRequestTrigger> for Trigger {
    fn from(value: PullRequestTrigger) -> Self {
        Self::PullRequest(value)
    }
}

impl From<ReleaseTrigger> for Trigger {
    fn from(value: ReleaseTrigger) -> Self {
        Self::Release(value)
    }
}

impl From<WorkflowDispatchTrigger> for Trigger {
    fn from(value: WorkflowDispatchTrigger) -> Self {
        Self::WorkflowDispatch(value)
    }
}

// =========================================================================
// Workflow-level settings
// =========================================================================

/// Concurrency configuration to prevent duplicate workflow runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concurrency {
    /// Concurrency group name (use expressions like `${{ github.workflow }}`)
    pub group: String,
    /// Whether to cancel in-progress runs (boolean or expression)
    pub cancel_in_progress: Option<Value>,
}

impl Concurrency {
    /// Concurrency group without cancellation
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            cancel_in_progress: None,
        }
    }

    /// Set whether in-progress runs are cancelled
    #[must_use]
    pub fn with_cancel_in_progress(mut self, cancel: impl Into<Value>) -> Self {
        self.cancel_in_progress = Some(cancel.into());
        self
    }
}

/// `GITHUB_TOKEN` permissions configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    /// Repository contents permission
    pub contents: Option<PermissionLevel>,
    /// Check runs permission
    pub checks: Option<PermissionLevel>,
    /// Pull requests permission
    pub pull_requests: Option<PermissionLevel>,
    /// Issues permission
    pub issues: Option<PermissionLevel>,
    /// GitHub Packages permission
    pub packages: Option<PermissionLevel>,
    /// OIDC token permission (for cloud authentication)
    pub id_token: Option<PermissionLevel>,
    /// GitHub Actions permission
    pub actions: Option<PermissionLevel>,
}

impl Permissions {
    /// True when no scope is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes().iter().all(|(_, level)| level.is_none())
    }

    /// Scopes in the order they are written, with their levels
    #[must_use]
    pub fn scopes(&self) -> [(&'static str, Option<PermissionLevel>); 7] {
        [
            ("contents", self.contents),
            ("checks", self.checks),
            ("pull-requests", self.pull_requests),
            ("issues", self.issues),
            ("packages", self.packages),
            ("id-token", self.id_token),
            ("actions", self.actions),
        ]
    }
}

/// Permission level for `GITHUB_TOKEN` scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    /// Read-only access
    Read,
    /// Read and write access
    Write,
    /// No access
    None,
}

impl PermissionLevel {
    /// The level as written in workflow files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::None => "none",
        }
    }
}

// =========================================================================
// Steps
// =========================================================================

/// A reusable action reference with its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    name: String,
    version: Option<String>,
    params: BTreeMap<String, Value>,
}

impl Action {
    /// Reference `name@version`, e.g. `("actions/checkout", "v4")`
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            params: BTreeMap::new(),
        }
    }

    /// Reference without a version (local `./path` or `docker://` actions)
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            params: BTreeMap::new(),
        }
    }

    /// Parse a `uses:` string such as `actions/checkout@v4`
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        match reference.rsplit_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Self::new(name, version)
            }
            _ => Self::unversioned(reference),
        }
    }

    /// Add an input passed through `with:`
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Action name (`owner/repo[/path]`, `./local` or `docker://image`)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version, tag or commit the action is pinned to
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Inputs passed through `with:`
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// The value written after `uses:`
    #[must_use]
    pub fn reference(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{version}", self.name),
            None => self.name.clone(),
        }
    }
}

/// An inline shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
    shell: Option<String>,
    working_directory: Option<String>,
}

impl Command {
    /// Command text, possibly spanning several lines
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shell: None,
            working_directory: None,
        }
    }

    /// Shell to run the command with (e.g., "bash", "pwsh")
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Directory to run the command in
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Command text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Configured shell
    #[must_use]
    pub fn shell(&self) -> Option<&str> {
        self.shell.as_deref()
    }

    /// Configured working directory
    #[must_use]
    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }
}

/// What a step does: exactly one of an action or a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// `uses:` a reusable action
    Action(Action),
    /// `run:` an inline command
    Command(Command),
}

impl From<Action> for StepKind {
    fn from(value: Action) -> Self {
        Self::Action(value)
    }
}

impl From<Command> for StepKind {
    fn from(value: Command) -> Self {
        Self::Command(value)
    }
}

/// A step in a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    name: Option<String>,
    id: Option<String>,
    kind: StepKind,
    condition: Option<String>,
    env: EnvVars,
    continue_on_error: Option<bool>,
    timeout_minutes: Option<u32>,
}

impl Step {
    /// Create a step of the given kind
    pub fn new(kind: impl Into<StepKind>) -> Self {
        Self {
            name: None,
            id: None,
            kind: kind.into(),
            condition: None,
            env: EnvVars::new(),
            continue_on_error: None,
            timeout_minutes: None,
        }
    }

    /// Create a step that uses `name@version`
    pub fn action(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(Action::new(name, version))
    }

    /// Create a step from a `uses:` string such as `actions/checkout@v4`
    #[must_use]
    pub fn uses(reference: &str) -> Self {
        Self::new(Action::parse(reference))
    }

    /// Create a step that runs a shell command
    pub fn command(text: impl Into<String>) -> Self {
        Self::new(Command::new(text))
    }

    /// Set the step name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the step ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a condition
    #[must_use]
    pub fn with_if(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Continue the job when this step fails
    #[must_use]
    pub const fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = Some(continue_on_error);
        self
    }

    /// Step timeout in minutes
    #[must_use]
    pub const fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Identifier for referencing step outputs
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Action or command
    #[must_use]
    pub const fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Conditional execution expression
    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Step environment variables
    #[must_use]
    pub const fn env(&self) -> &EnvVars {
        &self.env
    }

    /// Continue-on-error setting
    #[must_use]
    pub const fn continue_on_error(&self) -> Option<bool> {
        self.continue_on_error
    }

    /// Timeout in minutes
    #[must_use]
    pub const fn timeout_minutes(&self) -> Option<u32> {
        self.timeout_minutes
    }

    /// Short human-readable label used in error messages
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(label) = [&self.id, &self.name]
            .into_iter()
            .flatten()
            .find(|label| !label.is_empty())
        {
            return label.clone();
        }
        match &self.kind {
            StepKind::Action(action) => action.reference(),
            StepKind::Command(command) => {
                let first_line = command.text.lines().next().unwrap_or_default();
                format!("run: {first_line}")
            }
        }
    }
}

impl From<Action> for Step {
    fn from(value: Action) -> Self {
        Self::new(value)
    }
}

impl From<Command> for Step {
    fn from(value: Command) -> Self {
        Self::new(value)
    }
}

/// Loosely-typed step builder mirroring the YAML keys.
///
/// Useful when steps are assembled from external data; `build` rejects
/// combinations that the typed constructors on [`Step`] cannot express.
#[derive(Debug, Clone, Default)]
pub struct StepBuilder {
    name: Option<String>,
    id: Option<String>,
    uses: Option<String>,
    run: Option<String>,
    with: BTreeMap<String, Value>,
    shell: Option<String>,
    working_directory: Option<String>,
    condition: Option<String>,
    env: EnvVars,
    continue_on_error: Option<bool>,
    timeout_minutes: Option<u32>,
}

impl StepBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the step ID
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Action reference (`uses:`)
    #[must_use]
    pub fn uses(mut self, reference: impl Into<String>) -> Self {
        self.uses = Some(reference.into());
        self
    }

    /// Inline command (`run:`)
    #[must_use]
    pub fn run(mut self, command: impl Into<String>) -> Self {
        self.run = Some(command.into());
        self
    }

    /// Action input (`with:`)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with.insert(key.into(), value.into());
        self
    }

    /// Shell for `run` steps
    #[must_use]
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Working directory for `run` steps
    #[must_use]
    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Conditional execution expression
    #[must_use]
    pub fn if_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Continue the job when this step fails
    #[must_use]
    pub const fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = Some(continue_on_error);
        self
    }

    /// Step timeout in minutes
    #[must_use]
    pub const fn timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    /// Finish the step.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when both or neither of `uses`/`run` are
    /// set, when a field does not apply to the chosen kind, or when the
    /// action name or command text is empty.
    pub fn build(self) -> Result<Step, ValidationError> {
        let label = self
            .id
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.uses.clone())
            .unwrap_or_else(|| "(unnamed)".to_string());

        let kind = match (self.uses, self.run) {
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousStep { step: label }),
            (None, None) => return Err(ValidationError::MissingStepKind { step: label }),
            (Some(uses), None) => {
                if self.shell.is_some() {
                    return Err(ValidationError::IncompatibleStepField {
                        step: label,
                        field: "shell",
                    });
                }
                if self.working_directory.is_some() {
                    return Err(ValidationError::IncompatibleStepField {
                        step: label,
                        field: "working-directory",
                    });
                }
                let mut action = Action::parse(&uses);
                action.params = self.with;
                StepKind::Action(action)
            }
            (None, Some(run)) => {
                if !self.with.is_empty() {
                    return Err(ValidationError::IncompatibleStepField {
                        step: label,
                        field: "with",
                    });
                }
                StepKind::Command(Command {
                    text: run,
                    shell: self.shell,
                    working_directory: self.working_directory,
                })
            }
        };

        let step = Step {
            name: self.name,
            id: self.id,
            kind,
            condition: self.condition,
            env: self.env,
            continue_on_error: self.continue_on_error,
            timeout_minutes: self.timeout_minutes,
        };
        validation::check_step(&step)?;
        Ok(step)
    }
}

// =========================================================================
// Jobs
// =========================================================================

/// Runner specification for where a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunsOn {
    /// Single runner label (e.g., "ubuntu-latest")
    Label(String),
    /// Multiple runner labels (job runs on runner matching all labels)
    Labels(Vec<String>),
}

impl Default for RunsOn {
    fn default() -> Self {
        Self::Label(DEFAULT_RUNNER.to_string())
    }
}

impl From<&str> for RunsOn {
    fn from(value: &str) -> Self {
        Self::Label(value.to_string())
    }
}

impl From<String> for RunsOn {
    fn from(value: String) -> Self {
        Self::Label(value)
    }
}

impl From<Vec<String>> for RunsOn {
    fn from(value: Vec<String>) -> Self {
        Self::Labels(value)
    }
}

impl From<Vec<&str>> for RunsOn {
    fn from(value: Vec<&str>) -> Self {
        Self::Labels(strings(value))
    }
}

/// Matrix axes with optional include/exclude combinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixAxes {
    /// Axis name to its values
    pub dimensions: BTreeMap<String, Vec<Value>>,
    /// Extra combinations
    pub include: Vec<BTreeMap<String, Value>>,
    /// Combinations to drop
    pub exclude: Vec<BTreeMap<String, Value>>,
}

impl MatrixAxes {
    /// Empty axes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis
    #[must_use]
    pub fn with_axis<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.dimensions
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add an extra combination
    #[must_use]
    pub fn with_include<I, K, V>(mut self, combination: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.include.push(
            combination
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Drop a combination
    #[must_use]
    pub fn with_exclude<I, K, V>(mut self, combination: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.exclude.push(
            combination
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// Build matrix: literal axes or an expression producing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matrix {
    /// Literal axes
    Axes(MatrixAxes),
    /// Expression evaluated by the runner (e.g., `fromJSON(needs.plan.outputs.matrix)`)
    Expression(Expression),
}

impl From<MatrixAxes> for Matrix {
    fn from(value: MatrixAxes) -> Self {
        Self::Axes(value)
    }
}

impl From<Expression> for Matrix {
    fn from(value: Expression) -> Self {
        Self::Expression(value)
    }
}

/// Job strategy. `fail-fast` and `max-parallel` only exist alongside a matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    /// Build matrix
    pub matrix: Matrix,
    /// Cancel remaining matrix jobs when one fails
    pub fail_fast: Option<bool>,
    /// Maximum number of matrix jobs running at once
    pub max_parallel: Option<u32>,
}

impl Strategy {
    /// Strategy for the given matrix
    pub fn new(matrix: impl Into<Matrix>) -> Self {
        Self {
            matrix: matrix.into(),
            fail_fast: None,
            max_parallel: None,
        }
    }

    /// Set fail-fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = Some(fail_fast);
        self
    }

    /// Set max-parallel
    #[must_use]
    pub const fn with_max_parallel(mut self, max_parallel: u32) -> Self {
        self.max_parallel = Some(max_parallel);
        self
    }
}

/// A job in a workflow.
///
/// Jobs run in parallel by default unless `needs` dependencies are specified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: String,
    name: Option<String>,
    runs_on: RunsOn,
    needs: Vec<String>,
    condition: Option<String>,
    strategy: Option<Strategy>,
    env: EnvVars,
    outputs: BTreeMap<String, Value>,
    timeout_minutes: Option<u32>,
    continue_on_error: Option<bool>,
    steps: Vec<Step>,
}

impl Job {
    /// Job identifier (its key under `jobs:`)
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Runner label(s)
    #[must_use]
    pub const fn runs_on(&self) -> &RunsOn {
        &self.runs_on
    }

    /// Jobs that must complete first
    #[must_use]
    pub fn needs(&self) -> &[String] {
        &self.needs
    }

    /// Conditional execution expression
    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Matrix strategy
    #[must_use]
    pub const fn strategy(&self) -> Option<&Strategy> {
        self.strategy.as_ref()
    }

    /// Job-level environment variables
    #[must_use]
    pub const fn env(&self) -> &EnvVars {
        &self.env
    }

    /// Job outputs
    #[must_use]
    pub const fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    /// Timeout in minutes
    #[must_use]
    pub const fn timeout_minutes(&self) -> Option<u32> {
        self.timeout_minutes
    }

    /// Continue-on-error setting
    #[must_use]
    pub const fn continue_on_error(&self) -> Option<bool> {
        self.continue_on_error
    }

    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Builder for [`Job`].
#[derive(Debug, Clone)]
pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    /// Start a job with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            job: Job {
                id: id.into(),
                name: None,
                runs_on: RunsOn::default(),
                needs: Vec::new(),
                condition: None,
                strategy: None,
                env: EnvVars::new(),
                outputs: BTreeMap::new(),
                timeout_minutes: None,
                continue_on_error: None,
                steps: Vec::new(),
            },
        }
    }

    /// Set the display name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.job.name = Some(name.into());
        self
    }

    /// Set the runner label(s)
    #[must_use]
    pub fn runs_on(mut self, runs_on: impl Into<RunsOn>) -> Self {
        self.job.runs_on = runs_on.into();
        self
    }

    /// Depend on another job
    #[must_use]
    pub fn needs(mut self, job: impl Into<String>) -> Self {
        self.job.needs.push(job.into());
        self
    }

    /// Set a condition
    #[must_use]
    pub fn if_condition(mut self, condition: impl Into<String>) -> Self {
        self.job.condition = Some(condition.into());
        self
    }

    /// Set the matrix strategy
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.job.strategy = Some(strategy);
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.job.env.insert(key.into(), value.into());
        self
    }

    /// Add an output
    #[must_use]
    pub fn output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.job.outputs.insert(key.into(), value.into());
        self
    }

    /// Set the timeout in minutes
    #[must_use]
    pub const fn timeout_minutes(mut self, minutes: u32) -> Self {
        self.job.timeout_minutes = Some(minutes);
        self
    }

    /// Let the workflow continue when this job fails
    #[must_use]
    pub const fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.job.continue_on_error = Some(continue_on_error);
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.job.steps.push(step.into());
        self
    }

    /// Append several steps
    #[must_use]
    pub fn steps<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        self.job.steps.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Put a repository checkout in front of the steps added so far
    #[must_use]
    pub fn with_checkout(mut self) -> Self {
        self.job.steps.insert(0, crate::actions::checkout());
        self
    }

    /// Finish the job.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the identifier is empty, the job has
    /// no steps, a step is malformed, step ids repeat, a dependency repeats or
    /// names the job itself, or the matrix is empty.
    pub fn build(self) -> Result<Job, ValidationError> {
        validation::check_job(&self.job)?;
        Ok(self.job)
    }
}

// =========================================================================
// Workflow
// =========================================================================

/// A GitHub Actions workflow definition.
///
/// Represents the complete structure of a workflow file that can be committed
/// to `.github/workflows/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    name: String,
    file_name: String,
    triggers: BTreeMap<TriggerEvent, Trigger>,
    permissions: Option<Permissions>,
    concurrency: Option<Concurrency>,
    env: EnvVars,
    jobs: IndexMap<String, Job>,
}

impl Workflow {
    /// Workflow name displayed in GitHub UI
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name (or path) the workflow is written to
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Triggers in canonical event order
    pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.values()
    }

    /// Default permissions for `GITHUB_TOKEN`
    #[must_use]
    pub const fn permissions(&self) -> Option<&Permissions> {
        self.permissions.as_ref()
    }

    /// Concurrency settings
    #[must_use]
    pub const fn concurrency(&self) -> Option<&Concurrency> {
        self.concurrency.as_ref()
    }

    /// Environment variables available to all jobs
    #[must_use]
    pub const fn env(&self) -> &EnvVars {
        &self.env
    }

    /// Jobs in registration order
    #[must_use]
    pub const fn jobs(&self) -> &IndexMap<String, Job> {
        &self.jobs
    }
}

/// Builder for [`Workflow`].
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    name: String,
    file_name: Option<String>,
    triggers: BTreeMap<TriggerEvent, Trigger>,
    permissions: Option<Permissions>,
    concurrency: Option<Concurrency>,
    env: EnvVars,
    jobs: IndexMap<String, Job>,
}

impl WorkflowBuilder {
    /// Start a workflow with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            triggers: BTreeMap::new(),
            permissions: None,
            concurrency: None,
            env: EnvVars::new(),
            jobs: IndexMap::new(),
        }
    }

    /// Override the file name (defaults to the sanitized name plus `.yml`)
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set default `GITHUB_TOKEN` permissions
    #[must_use]
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Set concurrency settings
    #[must_use]
    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Add a workflow-level environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add a trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTrigger`] when the event is already
    /// registered and [`ValidationError::EmptySchedule`] for a schedule
    /// without cron expressions.
    pub fn on(mut self, trigger: impl Into<Trigger>) -> Result<Self, ValidationError> {
        let trigger = trigger.into();
        validation::check_trigger(&self.name, &trigger)?;
        let event = trigger.event();
        if self.triggers.contains_key(&event) {
            return Err(ValidationError::DuplicateTrigger {
                workflow: self.name,
                event,
            });
        }
        self.triggers.insert(event, trigger);
        Ok(self)
    }

    /// Add a job.
    ///
    /// Every job named in `needs` must already have been added, so the
    /// dependency graph is acyclic by construction.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateJob`] for a repeated identifier and
    /// [`ValidationError::UnknownDependency`] for a dependency on a job that
    /// has not been added.
    pub fn job(mut self, job: Job) -> Result<Self, ValidationError> {
        if self.jobs.contains_key(job.id()) {
            return Err(ValidationError::DuplicateJob {
                workflow: self.name,
                job: job.id,
            });
        }
        if let Some(missing) = job.needs().iter().find(|dep| !self.jobs.contains_key(*dep)) {
            return Err(ValidationError::UnknownDependency {
                workflow: self.name,
                job: job.id.clone(),
                dependency: missing.clone(),
            });
        }
        self.jobs.insert(job.id.clone(), job);
        Ok(self)
    }

    /// Finish the workflow.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name is empty, no trigger or no
    /// job was added, the file name is unusable or the concurrency group is
    /// blank.
    pub fn build(self) -> Result<Workflow, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyWorkflowName);
        }
        if self.triggers.is_empty() {
            return Err(ValidationError::NoTriggers {
                workflow: self.name,
            });
        }
        if self.jobs.is_empty() {
            return Err(ValidationError::NoJobs {
                workflow: self.name,
            });
        }

        let file_name = match self.file_name {
            Some(file_name) => file_name,
            None => format!("{}.yml", sanitize_filename(&self.name)),
        };
        validation::check_file_name(&self.name, &file_name)?;
        if self
            .concurrency
            .as_ref()
            .is_some_and(|concurrency| concurrency.group.trim().is_empty())
        {
            return Err(ValidationError::EmptyConcurrencyGroup {
                workflow: self.name,
            });
        }

        Ok(Workflow {
            name: self.name,
            file_name,
            triggers: self.triggers,
            permissions: self.permissions.filter(|p| !p.is_empty()),
            concurrency: self.concurrency,
            env: self.env,
            jobs: self.jobs,
        })
    }
}

/// Sanitize a string for use as a workflow filename
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
