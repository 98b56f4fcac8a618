//! Interview plan generation.
//!
//! Asks the configured LLM for an ordered question list and parses it into
//! an `InterviewPlan`. Models sometimes wrap the JSON in a fenced code
//! block, so parsing falls back to extracting the first fenced array.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::llm::{GenerationOptions, LlmClient};
use crate::session::model::{InterviewPlan, Question};

use super::DEFAULT_OUTLINE;

pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
}

#[derive(Debug, Deserialize)]
struct PlannedQuestion {
    question: String,
    #[serde(default)]
    expected_duration_seconds: Option<u64>,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Generate the question list for one session. Empty or unparseable
    /// output is an error — the caller owns the retry policy.
    pub async fn generate(&self, profile: &str, outline: Option<&str>) -> Result<InterviewPlan> {
        let prompt = build_prompt(profile, outline.unwrap_or(DEFAULT_OUTLINE));

        let options = GenerationOptions {
            max_tokens: 1024,
            ..Default::default()
        };

        let raw = self
            .llm
            .generate(&prompt, options)
            .await
            .context("Plan generation request failed")?;

        debug!("Plan generator returned {} chars", raw.len());

        let plan = parse_plan(&raw)?;
        info!(
            "Interview plan generated: {} questions via {}",
            plan.len(),
            self.llm.provider_name()
        );
        Ok(plan)
    }
}

fn build_prompt(profile: &str, outline: &str) -> String {
    format!(
        "You are preparing to interview a candidate in a live video call.\n\
         \n\
         CV:\n{profile}\n\
         \n\
         Interview outline:\n{outline}\n\
         \n\
         Return a JSON array where each item has the following keys:\n\
         - question: the question to ask aloud, phrased conversationally\n\
         - expected_duration_seconds: how long a spoken answer should take\n\
         \n\
         Start with a short warm welcome question confirming the candidate \
         can hear clearly. Return only the JSON array."
    )
}

/// Parse the model output into a plan, salvaging JSON from fenced blocks
/// when necessary.
pub fn parse_plan(raw: &str) -> Result<InterviewPlan> {
    let parsed: Vec<PlannedQuestion> = match serde_json::from_str(raw.trim()) {
        Ok(items) => items,
        Err(_) => {
            let block = extract_json_block(raw)
                .context("Failed to parse interview plan from the model response")?;
            serde_json::from_str(&block)
                .context("Fenced block in model response was not a valid question array")?
        }
    };

    let questions: Vec<Question> = parsed
        .into_iter()
        .filter(|item| !item.question.trim().is_empty())
        .map(|item| Question {
            text: item.question.trim().to_string(),
            expected_duration: item.expected_duration_seconds.map(Duration::from_secs),
        })
        .collect();

    match InterviewPlan::new(questions) {
        Some(plan) => Ok(plan),
        None => bail!("Model returned an empty interview plan"),
    }
}

fn extract_json_block(text: &str) -> Option<String> {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(\[.*?\])\s*```").ok()?;
    fence
        .captures(text)
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            // Last resort: widest bracketed span.
            let start = text.find('[')?;
            let end = text.rfind(']')?;
            (end > start).then(|| text[start..=end].to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json_array() {
        let raw = r#"[
            {"question": "Welcome! Can you hear me clearly?", "expected_duration_seconds": 15},
            {"question": "Walk me through your current role."}
        ]"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.questions()[0].expected_duration,
            Some(Duration::from_secs(15))
        );
        assert_eq!(plan.questions()[1].expected_duration, None);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "Here is the plan:\n```json\n[{\"question\": \"Tell me about a hard bug.\"}]\n```\nGood luck!";
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.questions()[0].text, "Tell me about a hard bug.");
    }

    #[test]
    fn test_parse_unfenced_surrounded_json() {
        let raw = "Sure! [{\"question\": \"What motivates you?\"}] Hope that helps.";
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_empty_plan_is_error() {
        assert!(parse_plan("[]").is_err());
        assert!(parse_plan(r#"[{"question": "   "}]"#).is_err());
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_plan("I cannot help with that.").is_err());
    }
}
