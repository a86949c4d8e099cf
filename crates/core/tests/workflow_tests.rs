//! End-to-end behavior of the workflow model, emitter, renderer and verifier.

use actiongen_core::actions::{self, Artifact};
use actiongen_core::workflow::{
    Expression, JobBuilder, MatrixAxes, Permissions, PullRequestTrigger, PushTrigger, Step,
    StepBuilder, Strategy, Trigger, ValidationError, Workflow, WorkflowBuilder, emit,
};
use actiongen_core::{Error, LineKind, Registry, Renderer, Verification};
use tempfile::TempDir;

const CI_YAML: &str = "name: ci
on: [push]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
";

fn ci() -> Workflow {
    WorkflowBuilder::new("ci")
        .on(Trigger::push())
        .unwrap()
        .job(
            JobBuilder::new("build")
                .runs_on("ubuntu-latest")
                .step(Step::action("actions/checkout", "v4"))
                .build()
                .unwrap(),
        )
        .unwrap()
        .build()
        .unwrap()
}

mod serialization {
    use super::*;

    /// The smallest useful workflow renders exactly to the documented form
    #[test]
    fn end_to_end_example() {
        assert_eq!(emit(&ci()).unwrap(), CI_YAML);
    }

    #[test]
    fn serializing_twice_is_identical() {
        let workflow = ci();
        assert_eq!(emit(&workflow).unwrap(), emit(&workflow).unwrap());
    }

    /// Triggers form a set: registration order does not change the output
    #[test]
    fn trigger_order_does_not_matter() {
        let job = || {
            JobBuilder::new("test")
                .step(Step::command("make test"))
                .build()
                .unwrap()
        };
        let a = WorkflowBuilder::new("ci")
            .on(PullRequestTrigger::default().with_branches(["main"]))
            .unwrap()
            .on(Trigger::push())
            .unwrap()
            .job(job())
            .unwrap()
            .build()
            .unwrap();
        let b = WorkflowBuilder::new("ci")
            .on(Trigger::push())
            .unwrap()
            .on(PullRequestTrigger::default().with_branches(["main"]))
            .unwrap()
            .job(job())
            .unwrap()
            .build()
            .unwrap();

        let yaml = emit(&a).unwrap();
        assert_eq!(yaml, emit(&b).unwrap());
        assert!(yaml.contains("on:\n  push:\n  pull_request:\n    branches: [main]\n"));
    }

    /// Steps are a sequence: swapping them changes the output
    #[test]
    fn step_order_matters() {
        let workflow = |first: &str, second: &str| {
            WorkflowBuilder::new("ci")
                .on(Trigger::push())
                .unwrap()
                .job(
                    JobBuilder::new("build")
                        .step(Step::command(first))
                        .step(Step::command(second))
                        .build()
                        .unwrap(),
                )
                .unwrap()
                .build()
                .unwrap()
        };

        let forward = emit(&workflow("make", "make test")).unwrap();
        let backward = emit(&workflow("make test", "make")).unwrap();
        assert_ne!(forward, backward);
        assert!(forward.find("- run: make\n").unwrap() < forward.find("- run: make test\n").unwrap());
    }

    #[test]
    fn jobs_keep_registration_order() {
        let job = |id: &str| {
            JobBuilder::new(id)
                .step(Step::command("true"))
                .build()
                .unwrap()
        };
        let workflow = WorkflowBuilder::new("ci")
            .on(Trigger::push())
            .unwrap()
            .job(job("zeta"))
            .unwrap()
            .job(job("alpha"))
            .unwrap()
            .build()
            .unwrap();

        let yaml = emit(&workflow).unwrap();
        assert!(yaml.find("  zeta:\n").unwrap() < yaml.find("  alpha:\n").unwrap());
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let yaml = emit(&ci()).unwrap();
        for key in ["env:", "needs:", "if:", "with:", "permissions:", "null", "''", "[]"] {
            assert!(!yaml.contains(key), "unexpected {key} in {yaml}");
        }
    }

    /// Optional fields explicitly set to empty values are left out too
    #[test]
    fn explicitly_empty_optional_fields_are_omitted() {
        let built = StepBuilder::new()
            .name("")
            .id("")
            .run("make")
            .shell("")
            .working_directory("")
            .if_condition("")
            .build()
            .unwrap();
        let typed = Step::action("actions/checkout", "v4").with_name("").with_if("");
        let job = JobBuilder::new("build")
            .name("")
            .if_condition("")
            .step(typed)
            .step(built)
            .build()
            .unwrap();
        let workflow = WorkflowBuilder::new("ci")
            .permissions(Permissions::default())
            .on(Trigger::push())
            .unwrap()
            .job(job)
            .unwrap()
            .build()
            .unwrap();

        let yaml = emit(&workflow).unwrap();
        assert_eq!(
            yaml,
            "name: ci\non: [push]\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n      - run: make\n"
        );
    }

    /// A fuller workflow parses back with the structure the model describes
    #[test]
    fn output_matches_model_structure() {
        let dist = Artifact::new("dist", "dist/");
        let build = JobBuilder::new("build")
            .strategy(
                Strategy::new(MatrixAxes::new().with_axis("python", ["3.11", "3.12"]))
                    .with_fail_fast(false),
            )
            .step(actions::cache_for_files(
                "Cache pip",
                "~/.cache/pip",
                "pip",
                ["requirements.txt"],
            ))
            .step(Step::command("pip install -r requirements.txt\npython -m build\n"))
            .step(dist.upload())
            .with_checkout()
            .build()
            .unwrap();
        let publish = JobBuilder::new("publish")
            .needs("build")
            .if_condition("startsWith(github.ref, 'refs/tags/')")
            .env("TOKEN", Expression::new("secrets.PYPI_TOKEN"))
            .step(dist.download())
            .step(Step::command("twine upload dist/*"))
            .build()
            .unwrap();
        let workflow = WorkflowBuilder::new("release")
            .on(PushTrigger::default().with_tags(["v*"]))
            .unwrap()
            .job(build)
            .unwrap()
            .job(publish)
            .unwrap()
            .build()
            .unwrap();

        let yaml = emit(&workflow).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(doc["on"]["push"]["tags"][0].as_str(), Some("v*"));
        let build = &doc["jobs"]["build"];
        assert_eq!(build["steps"][0]["uses"].as_str(), Some("actions/checkout@v4"));
        assert_eq!(
            build["steps"][1]["with"]["key"].as_str(),
            Some("pip-${{ hashFiles('requirements.txt') }}")
        );
        assert_eq!(
            build["steps"][2]["run"].as_str(),
            Some("pip install -r requirements.txt\npython -m build\n")
        );
        assert_eq!(build["strategy"]["matrix"]["python"][0].as_str(), Some("3.11"));
        assert_eq!(build["strategy"]["fail-fast"].as_bool(), Some(false));

        let publish = &doc["jobs"]["publish"];
        assert_eq!(publish["needs"][0].as_str(), Some("build"));
        assert_eq!(publish["env"]["TOKEN"].as_str(), Some("${{ secrets.PYPI_TOKEN }}"));
        assert_eq!(publish["steps"][1]["run"].as_str(), Some("twine upload dist/*"));
    }
}

mod validation {
    use super::*;

    #[test]
    fn dependency_on_unknown_job_is_rejected() {
        let deploy = JobBuilder::new("deploy")
            .needs("build")
            .step(Step::command("make deploy"))
            .build()
            .unwrap();
        let err = WorkflowBuilder::new("ci").job(deploy).unwrap_err();

        assert!(matches!(err, ValidationError::UnknownDependency { .. }));
        let message = err.to_string();
        assert!(message.contains("deploy") && message.contains("build") && message.contains("ci"));
    }

    #[test]
    fn step_with_action_and_command_is_rejected() {
        let err = StepBuilder::new()
            .name("confused")
            .uses("actions/checkout@v4")
            .run("make")
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::AmbiguousStep { ref step } if step == "confused"));
    }

    #[test]
    fn blank_cron_is_rejected() {
        let err = WorkflowBuilder::new("nightly")
            .on(Trigger::schedule(["", "0 0 * * *"]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptySchedule { ref workflow } if workflow == "nightly"));
    }

    #[test]
    fn workflow_without_jobs_is_rejected() {
        let err = WorkflowBuilder::new("ci")
            .on(Trigger::push())
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Workflow 'ci' has no jobs");
    }
}

mod verification {
    use super::*;

    #[test]
    fn write_then_verify_succeeds() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path().join(".github/workflows"));
        let mut registry = Registry::new();
        registry.register(ci()).unwrap();

        let written = renderer.write(&registry).unwrap();
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), CI_YAML);
        assert!(renderer.verify_all(&registry).is_success());
    }

    /// A committed file missing the last step shows that line as added
    #[test]
    fn missing_step_line_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("ci.yml"),
            CI_YAML.trim_end_matches("      - uses: actions/checkout@v4\n"),
        )
        .unwrap();

        let outcome = Renderer::new(temp.path()).verify(&ci()).unwrap();
        let Verification::Mismatch { diff, .. } = outcome else {
            panic!("expected a mismatch");
        };
        let changes: Vec<_> = diff.changes().collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, LineKind::Added);
        assert_eq!(changes[0].text.trim_start(), "- uses: actions/checkout@v4");
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = Renderer::new(temp.path()).verify(&ci()).unwrap_err();
        assert!(matches!(err, Error::MissingFile { .. }));
        assert!(err.to_string().contains("ci.yml"));
    }
}
