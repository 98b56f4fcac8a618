mod args;
mod plan;
mod run;

pub use args::{Cli, CliCommand, PlanCliArgs, RunCliArgs};
pub use plan::handle_plan_command;
pub use run::handle_run_command;
