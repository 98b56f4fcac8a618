//! The `plan` command: dry-run plan generation without joining a meeting.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::interview::{extract_profile, PlanGenerator};
use crate::llm;

use super::args::PlanCliArgs;

pub async fn handle_plan_command(args: PlanCliArgs) -> Result<()> {
    let config = Config::load()?;

    let profile = extract_profile(&args.cv)?;
    let outline = args
        .outline
        .as_deref()
        .map(std::fs::read_to_string)
        .transpose()
        .context("Failed to read outline file")?;

    let llm_client: Arc<dyn llm::LlmClient> = Arc::from(llm::build_client(&config.llm)?);
    let planner = PlanGenerator::new(llm_client);

    let plan = planner.generate(&profile, outline.as_deref()).await?;

    println!("Interview plan ({} questions):", plan.len());
    for (index, question) in plan.questions().iter().enumerate() {
        match question.expected_duration {
            Some(duration) => {
                println!("{:2}. {} (~{}s)", index + 1, question.text, duration.as_secs())
            }
            None => println!("{:2}. {}", index + 1, question.text),
        }
    }

    Ok(())
}
