//! Workflow YAML Emitter
//!
//! Transforms a [`Workflow`] into GitHub Actions YAML.
//!
//! The emitter builds a small node tree with keys already in schema order and
//! writes it in block style by hand, so the same workflow always produces the
//! same bytes.

use super::schema::{
    Concurrency, Job, Matrix, Permissions, PullRequestTrigger, PushTrigger, RunsOn, Step,
    StepKind, Strategy, Trigger, Value, Workflow, WorkflowInput,
};
use super::validation::{self, ValidationError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Flow sequences longer than this are written in block style
const MAX_FLOW_WIDTH: usize = 80;

/// Leading characters that stop a string from being written plain
const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
];

/// Words YAML 1.1 readers turn into booleans or null
const RESERVED_WORDS: &[&str] = &[
    "true", "false", "yes", "no", "y", "n", "on", "off", "null", "~",
];

/// Errors raised while serializing a workflow
#[derive(Error, Debug)]
pub enum SerializationError {
    /// The workflow broke a model invariant that construction should have caught
    #[error("Workflow '{workflow}' cannot be serialized: {source}")]
    InvalidModel {
        /// Workflow name
        workflow: String,
        /// Violated invariant
        #[source]
        source: ValidationError,
    },

    /// The emitted text did not parse back as YAML
    #[error("Workflow '{workflow}' produced invalid YAML: {source}")]
    InvalidYaml {
        /// Workflow name
        workflow: String,
        /// Parser error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Options controlling emitted text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Comment placed above the document, one `# ` line per input line
    pub header: Option<String>,
}

impl EmitOptions {
    /// Options with a header comment
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
        }
    }
}

/// Serialize a workflow to YAML without a header.
///
/// # Errors
///
/// Returns [`SerializationError`] if the workflow breaks a model invariant or
/// the output fails to parse back.
pub fn emit(workflow: &Workflow) -> Result<String, SerializationError> {
    emit_with(workflow, &EmitOptions::default())
}

/// Serialize a workflow to YAML.
///
/// # Errors
///
/// Returns [`SerializationError`] if the workflow breaks a model invariant or
/// the output fails to parse back.
pub fn emit_with(workflow: &Workflow, options: &EmitOptions) -> Result<String, SerializationError> {
    recheck(workflow).map_err(|source| SerializationError::InvalidModel {
        workflow: workflow.name().to_string(),
        source,
    })?;

    let mut writer = Writer::default();
    if let Some(header) = &options.header {
        writer.comment(header);
    }
    writer.mapping(&workflow_node(workflow), 0, false);
    let output = writer.finish();

    serde_yaml::from_str::<serde_yaml::Value>(&output).map_err(|source| {
        SerializationError::InvalidYaml {
            workflow: workflow.name().to_string(),
            source,
        }
    })?;

    tracing::trace!(workflow = workflow.name(), bytes = output.len(), "Emitted workflow");
    Ok(output)
}

fn recheck(workflow: &Workflow) -> Result<(), ValidationError> {
    if workflow.jobs().is_empty() {
        return Err(ValidationError::NoJobs {
            workflow: workflow.name().to_string(),
        });
    }
    if workflow.triggers().next().is_none() {
        return Err(ValidationError::NoTriggers {
            workflow: workflow.name().to_string(),
        });
    }
    validation::dependency_order(workflow).map(|_| ())
}

// =========================================================================
// Node tree
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Null,
    Str(String),
    Bool(bool),
    Int(i64),
    Seq(Vec<Node>),
    Map(Vec<(String, Node)>),
}

impl Node {
    fn strings(items: &[String]) -> Self {
        Self::Seq(items.iter().cloned().map(Self::Str).collect())
    }

    fn value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Str(s.clone()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Integer(i) => Self::Int(*i),
            Value::Expression(expr) => Self::Str(expr.to_string()),
        }
    }

    fn values(map: &BTreeMap<String, Value>) -> Self {
        Self::Map(
            map.iter()
                .map(|(key, value)| (render_key(key), Self::value(value)))
                .collect(),
        )
    }
}

/// Mapping under construction; keys are stored already rendered
#[derive(Default)]
struct Mapping(Vec<(String, Node)>);

impl Mapping {
    /// Structural key from the workflow schema
    fn insert(&mut self, key: &'static str, node: Node) {
        self.0.push((key.to_string(), node));
    }

    /// User-supplied key (job id, input name)
    fn insert_user(&mut self, key: &str, node: Node) {
        self.0.push((render_key(key), node));
    }

    /// Absent and empty strings are both left out
    fn insert_str(&mut self, key: &'static str, value: Option<&str>) {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.insert(key, Node::Str(value.to_string()));
        }
    }

    fn insert_bool(&mut self, key: &'static str, value: Option<bool>) {
        if let Some(value) = value {
            self.insert(key, Node::Bool(value));
        }
    }

    fn insert_int(&mut self, key: &'static str, value: Option<u32>) {
        if let Some(value) = value {
            self.insert(key, Node::Int(i64::from(value)));
        }
    }

    fn insert_list(&mut self, key: &'static str, items: &[String]) {
        if !items.is_empty() {
            self.insert(key, Node::strings(items));
        }
    }

    fn insert_values(&mut self, key: &'static str, map: &BTreeMap<String, Value>) {
        if !map.is_empty() {
            self.insert(key, Node::values(map));
        }
    }

    fn into_node(self) -> Node {
        Node::Map(self.0)
    }
}

fn workflow_node(workflow: &Workflow) -> Vec<(String, Node)> {
    let mut map = Mapping::default();
    map.insert("name", Node::Str(workflow.name().to_string()));
    map.insert("on", triggers_node(workflow));
    if let Some(permissions) = workflow.permissions() {
        map.insert("permissions", permissions_node(permissions));
    }
    if let Some(concurrency) = workflow.concurrency() {
        map.insert("concurrency", concurrency_node(concurrency));
    }
    map.insert_values("env", workflow.env());

    let mut jobs = Mapping::default();
    for (id, job) in workflow.jobs() {
        jobs.insert_user(id, job_node(job));
    }
    map.insert("jobs", jobs.into_node());
    map.0
}

fn triggers_node(workflow: &Workflow) -> Node {
    if workflow.triggers().all(Trigger::is_unfiltered) {
        return Node::Seq(
            workflow
                .triggers()
                .map(|trigger| Node::Str(trigger.event().as_str().to_string()))
                .collect(),
        );
    }

    let mut map = Mapping::default();
    for trigger in workflow.triggers() {
        let node = if trigger.is_unfiltered() {
            Node::Null
        } else {
            trigger_detail(trigger)
        };
        map.insert(trigger.event().as_str(), node);
    }
    map.into_node()
}

fn trigger_detail(trigger: &Trigger) -> Node {
    match trigger {
        Trigger::Push(push) => push_node(push),
        Trigger::PullRequest(pr) | Trigger::PullRequestTarget(pr) => pull_request_node(pr),
        Trigger::Release(release) => {
            let mut map = Mapping::default();
            map.insert_list("types", &release.types);
            map.into_node()
        }
        Trigger::Schedule(crons) => Node::Seq(
            crons
                .iter()
                .map(|cron| Node::Map(vec![("cron".to_string(), Node::Str(cron.clone()))]))
                .collect(),
        ),
        Trigger::WorkflowDispatch(dispatch) => {
            let mut inputs = Mapping::default();
            for (name, input) in &dispatch.inputs {
                inputs.insert_user(name, input_node(input));
            }
            let mut map = Mapping::default();
            map.insert("inputs", inputs.into_node());
            map.into_node()
        }
        Trigger::WorkflowCall => Node::Null,
    }
}

fn push_node(push: &PushTrigger) -> Node {
    let mut map = Mapping::default();
    map.insert_list("branches", &push.branches);
    map.insert_list("branches-ignore", &push.branches_ignore);
    map.insert_list("tags", &push.tags);
    map.insert_list("tags-ignore", &push.tags_ignore);
    map.insert_list("paths", &push.paths);
    map.insert_list("paths-ignore", &push.paths_ignore);
    map.into_node()
}

fn pull_request_node(pr: &PullRequestTrigger) -> Node {
    let mut map = Mapping::default();
    map.insert_list("branches", &pr.branches);
    map.insert_list("branches-ignore", &pr.branches_ignore);
    map.insert_list("types", &pr.types);
    map.insert_list("paths", &pr.paths);
    map.insert_list("paths-ignore", &pr.paths_ignore);
    map.into_node()
}

fn input_node(input: &WorkflowInput) -> Node {
    let mut map = Mapping::default();
    map.insert("description", Node::Str(input.description.clone()));
    map.insert_bool("required", input.required);
    map.insert_str("default", input.default.as_deref());
    map.insert_str("type", input.input_type.as_deref());
    map.into_node()
}

fn permissions_node(permissions: &Permissions) -> Node {
    let mut map = Mapping::default();
    for (scope, level) in permissions.scopes() {
        map.insert_str(scope, level.map(|level| level.as_str()));
    }
    map.into_node()
}

fn concurrency_node(concurrency: &Concurrency) -> Node {
    match &concurrency.cancel_in_progress {
        None => Node::Str(concurrency.group.clone()),
        Some(cancel) => {
            let mut map = Mapping::default();
            map.insert("group", Node::Str(concurrency.group.clone()));
            map.insert("cancel-in-progress", Node::value(cancel));
            map.into_node()
        }
    }
}

fn job_node(job: &Job) -> Node {
    let mut map = Mapping::default();
    map.insert_str("name", job.name());
    let runs_on = match job.runs_on() {
        RunsOn::Label(label) => Node::Str(label.clone()),
        RunsOn::Labels(labels) => Node::strings(labels),
    };
    map.insert("runs-on", runs_on);
    map.insert_list("needs", job.needs());
    map.insert_str("if", job.condition());
    if let Some(strategy) = job.strategy() {
        map.insert("strategy", strategy_node(strategy));
    }
    map.insert_values("env", job.env());
    map.insert_values("outputs", job.outputs());
    map.insert_int("timeout-minutes", job.timeout_minutes());
    map.insert_bool("continue-on-error", job.continue_on_error());
    map.insert("steps", Node::Seq(job.steps().iter().map(step_node).collect()));
    map.into_node()
}

fn strategy_node(strategy: &Strategy) -> Node {
    let matrix = match &strategy.matrix {
        Matrix::Expression(expr) => Node::Str(expr.to_string()),
        Matrix::Axes(axes) => {
            let mut entries: Vec<(String, Node)> = axes
                .dimensions
                .iter()
                .map(|(axis, values)| {
                    (render_key(axis), Node::Seq(values.iter().map(Node::value).collect()))
                })
                .collect();
            if !axes.include.is_empty() {
                entries.push((
                    "include".to_string(),
                    Node::Seq(axes.include.iter().map(Node::values).collect()),
                ));
            }
            if !axes.exclude.is_empty() {
                entries.push((
                    "exclude".to_string(),
                    Node::Seq(axes.exclude.iter().map(Node::values).collect()),
                ));
            }
            Node::Map(entries)
        }
    };

    let mut map = Mapping::default();
    map.insert("matrix", matrix);
    map.insert_bool("fail-fast", strategy.fail_fast);
    map.insert_int("max-parallel", strategy.max_parallel);
    map.into_node()
}

fn step_node(step: &Step) -> Node {
    let mut map = Mapping::default();
    map.insert_str("name", step.name());
    map.insert_str("id", step.id());
    match step.kind() {
        StepKind::Action(action) => {
            map.insert("uses", Node::Str(action.reference()));
            map.insert_values("with", action.params());
        }
        StepKind::Command(command) => {
            map.insert("run", Node::Str(command.text().to_string()));
            map.insert_str("shell", command.shell());
            map.insert_str("working-directory", command.working_directory());
        }
    }
    map.insert_str("if", step.condition());
    map.insert_values("env", step.env());
    map.insert_bool("continue-on-error", step.continue_on_error());
    map.insert_int("timeout-minutes", step.timeout_minutes());
    map.into_node()
}

// =========================================================================
// Writer
// =========================================================================

#[derive(Default)]
struct Writer {
    out: String,
}

impl Writer {
    fn finish(self) -> String {
        self.out
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat_n(' ', indent));
    }

    fn comment(&mut self, text: &str) {
        let breaks = ['\r', '\u{85}', '\u{2028}', '\u{2029}'];
        for line in text.lines().flat_map(|line| line.split(breaks)) {
            let line = line.trim_end();
            if line.is_empty() {
                self.out.push_str("#\n");
            } else {
                // Comments cannot escape, so unprintable characters are replaced
                let line: String = line
                    .chars()
                    .map(|c| if c != '\t' && needs_escape(c) { '\u{fffd}' } else { c })
                    .collect();
                self.out.push_str("# ");
                self.out.push_str(&line);
                self.out.push('\n');
            }
        }
    }

    /// Write mapping entries with keys at column `indent`. When `inline_first`
    /// is set the cursor already sits after a `- ` sequence marker.
    fn mapping(&mut self, entries: &[(String, Node)], indent: usize, inline_first: bool) {
        for (i, (key, value)) in entries.iter().enumerate() {
            if !(inline_first && i == 0) {
                self.pad(indent);
            }
            self.out.push_str(key);
            self.out.push(':');
            self.value(value, indent, indent + key.len() + 1);
        }
    }

    /// Write the value following `key:` or `-`. `column` is the current line
    /// width, used to decide whether a flow sequence fits.
    fn value(&mut self, node: &Node, indent: usize, column: usize) {
        match node {
            Node::Null => self.out.push('\n'),
            Node::Seq(items) if items.is_empty() => self.out.push_str(" []\n"),
            Node::Map(entries) if entries.is_empty() => self.out.push_str(" {}\n"),
            Node::Seq(items) => match flow_sequence(items) {
                Some(flow) if column + 1 + flow.len() <= MAX_FLOW_WIDTH => {
                    self.out.push(' ');
                    self.out.push_str(&flow);
                    self.out.push('\n');
                }
                _ => {
                    self.out.push('\n');
                    self.sequence(items, indent + 2);
                }
            },
            Node::Map(entries) => {
                self.out.push('\n');
                self.mapping(entries, indent + 2, false);
            }
            Node::Str(_) | Node::Bool(_) | Node::Int(_) => self.scalar(node, indent),
        }
    }

    fn sequence(&mut self, items: &[Node], indent: usize) {
        for item in items {
            self.pad(indent);
            self.out.push('-');
            match item {
                Node::Map(entries) if !entries.is_empty() => {
                    self.out.push(' ');
                    self.mapping(entries, indent + 2, true);
                }
                _ => self.value(item, indent, indent + 1),
            }
        }
    }

    fn scalar(&mut self, node: &Node, indent: usize) {
        match render_scalar(node) {
            Scalar::Inline(text) => {
                self.out.push(' ');
                self.out.push_str(&text);
                self.out.push('\n');
            }
            Scalar::Literal { indicator, lines } => {
                self.out.push(' ');
                self.out.push_str(indicator);
                self.out.push('\n');
                for line in lines {
                    if !line.is_empty() {
                        self.pad(indent + 2);
                        self.out.push_str(&line);
                    }
                    self.out.push('\n');
                }
            }
        }
    }
}

enum Scalar {
    Inline(String),
    Literal {
        indicator: &'static str,
        lines: Vec<String>,
    },
}

fn render_scalar(node: &Node) -> Scalar {
    match node {
        Node::Bool(b) => Scalar::Inline(b.to_string()),
        Node::Int(i) => Scalar::Inline(i.to_string()),
        Node::Str(s) if s.contains('\n') => match literal_block(s) {
            Some((indicator, lines)) => Scalar::Literal { indicator, lines },
            None => Scalar::Inline(double_quoted(s)),
        },
        Node::Str(s) => Scalar::Inline(quote(s, false)),
        Node::Null | Node::Seq(_) | Node::Map(_) => Scalar::Inline("null".to_string()),
    }
}

/// `[a, b]` rendering of a sequence of single-line scalars
fn flow_sequence(items: &[Node]) -> Option<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Node::Bool(b) => parts.push(b.to_string()),
            Node::Int(i) => parts.push(i.to_string()),
            Node::Str(s) if !s.contains('\n') => parts.push(quote(s, true)),
            _ => return None,
        }
    }
    Some(format!("[{}]", parts.join(", ")))
}

/// Literal block form of a multi-line string, if it can round-trip
fn literal_block(s: &str) -> Option<(&'static str, Vec<String>)> {
    let (body, indicator) = match s.strip_suffix('\n') {
        Some(rest) if rest.ends_with('\n') => return None,
        Some(rest) => (rest, "|"),
        None => (s, "|-"),
    };
    if body.is_empty() || body.chars().any(|c| needs_escape(c) && c != '\n' && c != '\t') {
        return None;
    }

    let lines: Vec<&str> = body.split('\n').collect();
    if lines.iter().any(|line| line.ends_with([' ', '\t'])) {
        return None;
    }
    if let Some(first) = lines.iter().find(|line| !line.is_empty())
        && first.starts_with([' ', '\t'])
    {
        return None;
    }
    Some((indicator, lines.into_iter().map(str::to_string).collect()))
}

fn render_key(key: &str) -> String {
    quote(key, false)
}

/// Plain, single-quoted or double-quoted form of a single-line string
fn quote(s: &str, flow: bool) -> String {
    if is_plain_safe(s, flow) {
        s.to_string()
    } else if s.chars().any(needs_escape) {
        double_quoted(s)
    } else {
        format!("'{}'", s.replace('\'', "''"))
    }
}

fn is_plain_safe(s: &str, flow: bool) -> bool {
    let mut chars = s.chars();
    let (Some(first), Some(last)) = (chars.next(), s.chars().last()) else {
        return false;
    };
    if first.is_whitespace() || last.is_whitespace() || last == ':' {
        return false;
    }
    if INDICATORS.contains(&first) {
        // `-x`, `?x` and `:x` are plain in YAML; the rest always need quotes
        let next_is_safe = chars
            .next()
            .is_some_and(|c| !c.is_whitespace() && !(flow && ",[]{}".contains(c)));
        let allowed = if flow { first == '-' } else { matches!(first, '-' | '?' | ':') };
        if !allowed || !next_is_safe {
            return false;
        }
    }
    if s.starts_with("---") || s.starts_with("...") {
        return false;
    }
    if s.contains(": ") || s.contains(" #") {
        return false;
    }
    if s.chars().any(needs_escape) {
        return false;
    }
    if flow && s.contains([',', '[', ']', '{', '}', ':']) {
        return false;
    }
    !is_reserved_word(s) && !looks_numeric(s)
}

fn is_reserved_word(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
}

fn looks_numeric(s: &str) -> bool {
    if s.parse::<f64>().is_ok() {
        return true;
    }
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let lower = body.to_ascii_lowercase();
    if ["0x", "0o", "0b"].iter().any(|prefix| lower.starts_with(prefix))
        || matches!(lower.as_str(), ".inf" | ".nan")
    {
        return true;
    }
    // Integers with separators, sexagesimals and dates
    body.starts_with(|c: char| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '_' | '.' | ':' | '-' | '+' | 'e' | 'E'))
}

/// Characters outside the YAML printable set, plus the ones a reader would
/// drop, fold or treat as a line break
fn needs_escape(c: char) -> bool {
    let printable = matches!(
        c,
        ' '..='~' | '\u{a0}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..
    );
    !printable || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if needs_escape(c) => {
                out.push_str(&format!("\\u{:04X}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
