//! Closing summary over the aggregated transcript.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::llm::{GenerationOptions, LlmClient};

pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Summarize the interview transcript. The caller owns retries and
    /// the placeholder fallback.
    pub async fn summarize(&self, transcript: &str) -> Result<String> {
        if transcript.trim().is_empty() {
            bail!("Nothing to summarize: transcript is empty");
        }

        let prompt = format!(
            "Transcript:\n{transcript}\n\n\
             Summarise the interview transcript focusing on strengths, \
             risks, and recommendations."
        );

        let options = GenerationOptions {
            max_tokens: 512,
            ..Default::default()
        };

        let summary = self
            .llm
            .generate(&prompt, options)
            .await
            .context("Summarization request failed")?;

        if summary.trim().is_empty() {
            bail!("Model returned an empty summary");
        }

        info!(
            "Summary generated: {} chars via {}",
            summary.len(),
            self.llm.provider_name()
        );
        Ok(summary.trim().to_string())
    }
}

/// Text written in place of a summary when summarization stays unavailable.
pub fn placeholder_summary(detail: &str) -> String {
    format!(
        "[Summary unavailable: {detail}. The full transcript is stored alongside this file.]"
    )
}
