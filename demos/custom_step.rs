//! Wrapping a family of commands in a reusable step constructor.

use actiongen_core::workflow::{JobBuilder, Step, Trigger, WorkflowBuilder};
use std::process::ExitCode;

/// `make <target> key="value" ...`
fn make(target: &str, args: &[(&str, &str)]) -> Step {
    let mut command = format!("make {target}");
    for (key, value) in args {
        command.push_str(&format!(" {key}=\"{value}\""));
    }
    Step::command(command)
}

fn main() -> ExitCode {
    actiongen::main(|registry| {
        let workflow = WorkflowBuilder::new("foobar service")
            .file_name("foobar.yml")
            .on(Trigger::workflow_dispatch())?
            .job(
                JobBuilder::new("test")
                    .step(make("build", &[]))
                    .step(make("lint", &[("verbose", "1")]))
                    .step(make("test", &[("verbose", "1"), ("suite", "unit")]).with_name("Unit tests"))
                    .build()?,
            )?
            .build()?;

        registry.register(workflow)?;
        Ok(())
    })
}
