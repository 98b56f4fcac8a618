use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "intervox")]
#[command(about = "Automated spoken-interview conductor", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Conduct an interview session in a live meeting
    Run(RunCliArgs),
    /// Generate and print the interview plan without joining anything
    Plan(PlanCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RunCliArgs {
    /// Meeting URL to join
    #[arg(long)]
    pub meeting_url: String,

    /// Candidate name used in transcripts and metadata
    #[arg(long)]
    pub candidate: String,

    /// Path to the candidate's CV (plain text or markdown)
    #[arg(long)]
    pub cv: PathBuf,

    /// Optional interview outline file overriding the default outline
    #[arg(long)]
    pub outline: Option<PathBuf>,

    /// Artifact base directory (default: the per-user data dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip the local status API server
    #[arg(long)]
    pub no_api: bool,
}

#[derive(ClapArgs, Debug)]
pub struct PlanCliArgs {
    /// Path to the candidate's CV (plain text or markdown)
    #[arg(long)]
    pub cv: PathBuf,

    /// Optional interview outline file overriding the default outline
    #[arg(long)]
    pub outline: Option<PathBuf>,
}
