//! A service workflow triggered by changes to its own sources.
//!
//! ```text
//! cargo run --example simple -- --print
//! ```

use actiongen_core::workflow::{
    JobBuilder, PullRequestTrigger, PushTrigger, Step, WorkflowBuilder,
};
use std::process::ExitCode;

const SERVICE_PATHS: [&str; 2] = ["src/service/*.py", "src/service.yml"];

fn main() -> ExitCode {
    actiongen::main(|registry| {
        let workflow = WorkflowBuilder::new("my service workflow")
            .file_name("my_service.yml")
            .on(PullRequestTrigger::default().with_paths(SERVICE_PATHS))?
            .on(PushTrigger::default()
                .with_branches(["master"])
                .with_paths(SERVICE_PATHS))?
            .job(
                JobBuilder::new("test")
                    .step(Step::command("make build"))
                    .step(Step::command("make lint"))
                    .step(Step::command("make test"))
                    .build()?,
            )?
            .build()?;

        registry.register(workflow)?;
        Ok(())
    })
}
