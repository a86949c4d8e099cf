//! Passing a build artifact from one job to the next.

use actiongen_core::actions::Artifact;
use actiongen_core::workflow::{JobBuilder, Step, Trigger, WorkflowBuilder};
use std::process::ExitCode;

fn main() -> ExitCode {
    actiongen::main(|registry| {
        let code = Artifact::new("code-archive", "build/code.zip");

        let build = JobBuilder::new("build")
            .with_checkout()
            .step(Step::command("make build"))
            .step(code.upload())
            .build()?;
        let deploy = JobBuilder::new("deploy")
            .needs("build")
            .step(code.download())
            .step(Step::command(format!("scp {} deploy@example.com:/srv", code.path)))
            .build()?;

        let workflow = WorkflowBuilder::new("my service workflow")
            .file_name("my_service.yml")
            .on(Trigger::push())?
            .job(build)?
            .job(deploy)?
            .build()?;

        registry.register(workflow)?;
        Ok(())
    })
}
