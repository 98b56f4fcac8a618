use anyhow::Result;
use clap::Parser;
use intervox::cli::{handle_plan_command, handle_run_command, Cli, CliCommand};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        CliCommand::Version => {
            println!("Intervox {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliCommand::Plan(args) => handle_plan_command(args).await,
        CliCommand::Run(args) => handle_run_command(args).await,
    }
}
