//! Property-based tests for the emitter.
//!
//! - Determinism: the same workflow always produces the same bytes
//! - Trigger-order invariance: triggers registered in any order render alike
//! - Round-trip: every emitted string reads back as the exact original text,
//!   and optional fields set to empty strings are left out

use actiongen_core::workflow::{
    Job, JobBuilder, PullRequestTrigger, PushTrigger, Step, Trigger, Workflow, WorkflowBuilder,
    emit,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Job identifiers, including ones that collide with YAML keywords
fn job_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("on".to_string()),
        Just("y".to_string()),
        "[a-z][a-z0-9_-]{0,10}".prop_map(String::from),
    ]
}

/// Printable ASCII text of one or more lines
fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[ -~]{0,30}", 1..4)
        .prop_map(|lines| lines.join("\n"))
        .prop_filter("command must not be blank", |text| !text.trim().is_empty())
}

/// Optional text that is sometimes explicitly empty
fn optional_text_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![Just(String::new()), "[ -~]{1,20}".prop_map(String::from)])
}

fn env_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[A-Z][A-Z0-9_]{0,8}", "[ -~]{0,20}", 0..4)
}

fn triggers_strategy() -> impl Strategy<Value = Vec<Trigger>> {
    (
        prop::option::of(prop::collection::vec("[a-z][a-z0-9/*._-]{0,12}", 0..3)),
        prop::option::of(prop::collection::vec("[a-z][a-z0-9/*._-]{0,12}", 0..3)),
        any::<bool>(),
    )
        .prop_map(|(push, pull_request, dispatch)| {
            let mut triggers = Vec::new();
            if let Some(branches) = push {
                triggers.push(PushTrigger::default().with_branches(branches).into());
            }
            if let Some(branches) = pull_request {
                triggers.push(PullRequestTrigger::default().with_branches(branches).into());
            }
            if dispatch || triggers.is_empty() {
                triggers.push(Trigger::workflow_dispatch());
            }
            triggers
        })
}

#[derive(Debug, Clone)]
struct JobSpec {
    commands: Vec<String>,
    env: BTreeMap<String, String>,
    name: Option<String>,
    condition: Option<String>,
}

fn jobs_strategy() -> impl Strategy<Value = Vec<(String, JobSpec)>> {
    prop::collection::btree_set(job_id_strategy(), 1..4).prop_flat_map(|ids: BTreeSet<String>| {
        let count = ids.len();
        (
            Just(ids),
            prop::collection::vec(
                (
                    prop::collection::vec(text_strategy(), 1..4),
                    env_strategy(),
                    optional_text_strategy(),
                    optional_text_strategy(),
                )
                    .prop_map(|(commands, env, name, condition)| JobSpec {
                        commands,
                        env,
                        name,
                        condition,
                    }),
                count,
            ),
        )
            .prop_map(|(ids, specs)| ids.into_iter().zip(specs).collect::<Vec<_>>())
    })
}

fn build_job(id: &str, spec: &JobSpec, first: Option<&str>) -> Job {
    let mut builder = JobBuilder::new(id);
    if let Some(first) = first {
        builder = builder.needs(first);
    }
    for (key, value) in &spec.env {
        builder = builder.env(key.as_str(), value.as_str());
    }
    if let Some(name) = &spec.name {
        builder = builder.name(name.as_str());
    }
    if let Some(condition) = &spec.condition {
        builder = builder.if_condition(condition.as_str());
    }
    builder
        .steps(spec.commands.iter().map(|command| Step::command(command.as_str())))
        .build()
        .unwrap()
}

fn build_workflow(name: &str, triggers: &[Trigger], jobs: &[(String, JobSpec)]) -> Workflow {
    let mut builder = WorkflowBuilder::new(name).file_name("generated.yml");
    for trigger in triggers {
        builder = builder.on(trigger.clone()).unwrap();
    }
    let first = jobs.first().map(|(id, _)| id.as_str());
    for (index, (id, spec)) in jobs.iter().enumerate() {
        let needs = if index == 0 { None } else { first };
        builder = builder.job(build_job(id, spec, needs)).unwrap();
    }
    builder.build().unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn emit_is_deterministic(
        name in "[ -~]{1,30}".prop_filter("name must not be blank", |n| !n.trim().is_empty()),
        triggers in triggers_strategy(),
        jobs in jobs_strategy(),
    ) {
        let first = emit(&build_workflow(&name, &triggers, &jobs)).unwrap();
        let second = emit(&build_workflow(&name, &triggers, &jobs)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn trigger_order_is_irrelevant(
        triggers in triggers_strategy(),
        jobs in jobs_strategy(),
    ) {
        let mut reversed = triggers.clone();
        reversed.reverse();

        let forward = emit(&build_workflow("ci", &triggers, &jobs)).unwrap();
        let backward = emit(&build_workflow("ci", &reversed, &jobs)).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn strings_round_trip(
        name in "[ -~]{1,30}".prop_filter("name must not be blank", |n| !n.trim().is_empty()),
        jobs in jobs_strategy(),
    ) {
        let workflow = build_workflow(&name, &[Trigger::push()], &jobs);
        let yaml = emit(&workflow).unwrap();

        prop_assert!(yaml.ends_with('\n') && !yaml.ends_with("\n\n"));
        prop_assert!(yaml.lines().all(|line| !line.ends_with(' ')));

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(doc["name"].as_str(), Some(name.as_str()));
        for (id, spec) in &jobs {
            let job = &doc["jobs"][id.as_str()];
            for (index, command) in spec.commands.iter().enumerate() {
                prop_assert_eq!(job["steps"][index]["run"].as_str(), Some(command.as_str()));
            }
            for (key, value) in &spec.env {
                prop_assert_eq!(job["env"][key.as_str()].as_str(), Some(value.as_str()));
            }
            for (key, value) in [("name", &spec.name), ("if", &spec.condition)] {
                let expected = value.as_deref().filter(|text| !text.is_empty());
                prop_assert_eq!(job.get(key).and_then(|v| v.as_str()), expected);
            }
        }
    }
}
