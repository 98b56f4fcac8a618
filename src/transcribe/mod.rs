//! Transcription adapter.
//!
//! Speech-to-text is optional: a session without any configured engine
//! still completes, with each turn marked transcribe-skipped. The
//! orchestrator never inspects engine detail beyond text-or-error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::TranscriptionConfig;

#[async_trait]
pub trait TranscriptionEngine: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Convert one captured answer to text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Build the configured engine, or None when transcription is disabled.
pub fn build_engine(config: &TranscriptionConfig) -> Result<Option<Box<dyn TranscriptionEngine>>> {
    match config.provider.as_str() {
        "none" | "" => Ok(None),
        "openai-api" => {
            let api_key = config
                .api_key
                .clone()
                .context("api_key is required for the openai-api transcription provider")?;
            let model = config.model.clone().unwrap_or_else(|| "whisper-1".to_string());
            Ok(Some(Box::new(OpenAiWhisperEngine::new(
                api_key,
                config.api_endpoint.clone(),
                model,
                config.language.clone(),
            ))))
        }
        "whisper-cli" => {
            let engine = WhisperCliEngine::new(config.command_path.clone(), config.model.clone())?;
            Ok(Some(Box::new(engine)))
        }
        other => bail!(
            "Unknown transcription provider '{}'. Supported providers: openai-api, whisper-cli, none",
            other
        ),
    }
}

/// OpenAI Whisper HTTP API engine.
#[derive(Debug)]
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    language: Option<String>,
}

impl OpenAiWhisperEngine {
    pub fn new(
        api_key: String,
        endpoint: Option<String>,
        model: String,
        language: Option<String>,
    ) -> Self {
        let endpoint = endpoint
            .unwrap_or_else(|| "https://api.openai.com/v1/audio/transcriptions".to_string());

        info!("Transcription via OpenAI API, model {}", model);

        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint,
            model,
            language,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    fn name(&self) -> &'static str {
        "openai-api"
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let audio_data = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file {:?}", audio_path))?;

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "answer.wav".to_string());

        let part = reqwest::multipart::Part::bytes(audio_data)
            .file_name(file_name)
            .mime_str("audio/wav")?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        debug!("Uploading {:?} for transcription", audio_path);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach transcription API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read transcription response")?;

        if !status.is_success() {
            bail!("Transcription API returned {}: {}", status, body);
        }

        Ok(body.trim().to_string())
    }
}

/// Local whisper binary engine (whisper.cpp compatible CLI).
#[derive(Debug)]
pub struct WhisperCliEngine {
    command: PathBuf,
    model: Option<String>,
}

impl WhisperCliEngine {
    pub fn new(command_path: Option<String>, model: Option<String>) -> Result<Self> {
        let command = match command_path {
            Some(path) => PathBuf::from(path),
            None => which::which("whisper-cli")
                .or_else(|_| which::which("whisper"))
                .context("No whisper binary found on PATH for the whisper-cli provider")?,
        };

        info!("Transcription via local binary {:?}", command);

        Ok(Self { command, model })
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperCliEngine {
    fn name(&self) -> &'static str {
        "whisper-cli"
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let mut command = tokio::process::Command::new(&self.command);
        if let Some(model) = &self.model {
            command.arg("-m").arg(model);
        }
        command.arg("--no-timestamps").arg("-f").arg(audio_path);

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to run {:?}", self.command))?;

        if !output.status.success() {
            bail!(
                "whisper binary exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_engine_none() {
        let config = TranscriptionConfig::default();
        assert!(build_engine(&config).unwrap().is_none());
    }

    #[test]
    fn test_build_engine_requires_key_for_openai() {
        let config = TranscriptionConfig {
            provider: "openai-api".to_string(),
            ..Default::default()
        };
        assert!(build_engine(&config).is_err());
    }

    #[test]
    fn test_build_engine_rejects_unknown_provider() {
        let config = TranscriptionConfig {
            provider: "wav2vec".to_string(),
            ..Default::default()
        };
        let err = build_engine(&config).unwrap_err().to_string();
        assert!(err.contains("Unknown transcription provider"));
    }
}
