//! LLM provider adapters for plan generation and summarization.
//!
//! One client is selected by provider name at session start and held for
//! the session's lifetime. The orchestrator never special-cases providers
//! beyond this selection.

mod anthropic;
mod google;
mod openai;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use openai::OpenAiClient;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::LlmConfig;

/// Generation parameters for one request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync + std::fmt::Debug {
    fn provider_name(&self) -> &'static str;

    /// Single prompt-in, text-out completion. No adapter-level retries —
    /// retry policy belongs to the caller.
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String>;
}

/// Build the configured provider client.
pub fn build_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let api_key = config
        .api_key
        .clone()
        .with_context(|| format!("An API key is required for provider '{}'", config.provider))?;

    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiClient::new(
            api_key,
            config.model.clone(),
            config.api_endpoint.clone(),
        ))),
        "anthropic" => Ok(Box::new(AnthropicClient::new(
            api_key,
            config.model.clone(),
            config.api_endpoint.clone(),
        ))),
        "google" | "gemini" => Ok(Box::new(GoogleClient::new(
            api_key,
            config.model.clone(),
            config.api_endpoint.clone(),
        ))),
        other => bail!(
            "Unsupported LLM provider '{}'. Supported providers: openai, anthropic, google",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_requires_api_key() {
        let config = LlmConfig::default();
        let err = build_client(&config).unwrap_err().to_string();
        assert!(err.contains("API key"));
    }

    #[test]
    fn test_build_client_rejects_unknown_provider() {
        let config = LlmConfig {
            provider: "mistral".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let err = build_client(&config).unwrap_err().to_string();
        assert!(err.contains("Unsupported LLM provider"));
    }

    #[test]
    fn test_build_client_known_providers() {
        for provider in ["openai", "anthropic", "google", "gemini"] {
            let config = LlmConfig {
                provider: provider.to_string(),
                api_key: Some("k".to_string()),
                ..Default::default()
            };
            assert!(build_client(&config).is_ok(), "provider {}", provider);
        }
    }
}
