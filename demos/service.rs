//! Several services sharing one workflow shape, registered together.

use actiongen_core::actions;
use actiongen_core::workflow::{
    Concurrency, JobBuilder, PermissionLevel, Permissions, PullRequestTrigger, PushTrigger,
    Step, Workflow, WorkflowBuilder,
};
use actiongen_core::{Registry, Result};
use std::process::ExitCode;

const SERVICES: [&str; 2] = ["foo", "bar"];

fn service(name: &str) -> Result<Workflow> {
    let sources = format!("services/{name}/**");
    let build = JobBuilder::new("test")
        .with_checkout()
        .step(actions::cache_for_files(
            "Cache dependencies",
            "~/.cache/pip",
            name,
            [format!("services/{name}/requirements.txt")],
        ))
        .step(Step::command(format!("make name=\"{name}\" build")))
        .step(Step::command(format!("make name=\"{name}\" test")))
        .build()?;

    let workflow = WorkflowBuilder::new(format!("{name} service"))
        .file_name(format!("{name}.yml"))
        .permissions(Permissions {
            contents: Some(PermissionLevel::Read),
            ..Permissions::default()
        })
        .concurrency(
            Concurrency::group("${{ github.workflow }}-${{ github.ref }}")
                .with_cancel_in_progress(true),
        )
        .on(PushTrigger::default()
            .with_branches(["main"])
            .with_paths([sources.as_str()]))?
        .on(PullRequestTrigger::default().with_paths([sources.as_str()]))?
        .job(build)?
        .build()?;
    Ok(workflow)
}

fn register_all(registry: &mut Registry) -> Result<()> {
    for name in SERVICES {
        registry.register(service(name)?)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    actiongen::main(register_all)
}
