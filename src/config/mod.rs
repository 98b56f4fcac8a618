use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub capture: CaptureConfig,
    pub transcription: TranscriptionConfig,
    pub meeting: MeetingConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider for plan generation and summarization: openai, anthropic, google
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// TTS program resolved on PATH. Must block until playback finishes.
    pub program: String,
    pub voice: Option<String>,
    pub extra_args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            voice: None,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Loopback input device name. None picks the default input device.
    pub device: Option<String>,
    pub sample_rate: u32,
    /// Stop capture early once the trailing audio stays below this RMS level.
    pub silence_detection: bool,
    pub silence_threshold: f32,
    pub silence_hold_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: 16000,
            silence_detection: true,
            silence_threshold: 0.012,
            silence_hold_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// openai-api, whisper-cli, or none
    pub provider: String,
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
    pub model: Option<String>,
    pub command_path: Option<String>,
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            api_key: None,
            api_endpoint: None,
            model: None,
            command_path: None,
            language: Some("en".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingConfig {
    pub display_name: String,
    /// Headed by default so a human can clear login/captcha screens
    /// inside the join window.
    pub headless: bool,
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self {
            display_name: "Intervox".to_string(),
            headless: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Window for joining the meeting, generous enough for manual login.
    pub join_timeout_secs: u64,
    /// Upper bound on waiting for TTS playback of one question.
    pub max_speak_secs: u64,
    /// Pause between reported playback end and opening the capture window,
    /// so the question audio never bleeds into the recording.
    pub guard_delay_ms: u64,
    pub min_answer_secs: u64,
    pub max_answer_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            join_timeout_secs: 180,
            max_speak_secs: 60,
            guard_delay_ms: 750,
            min_answer_secs: 10,
            max_answer_secs: 120,
        }
    }
}

impl TimingConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    pub fn max_speak(&self) -> Duration {
        Duration::from_secs(self.max_speak_secs)
    }

    pub fn guard_delay(&self) -> Duration {
        Duration::from_millis(self.guard_delay_ms)
    }

    pub fn min_answer(&self) -> Duration {
        Duration::from_secs(self.min_answer_secs)
    }

    pub fn max_answer(&self) -> Duration {
        Duration::from_secs(self.max_answer_secs)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.provider, "openai");
        assert_eq!(parsed.capture.sample_rate, 16000);
        assert_eq!(parsed.timing.guard_delay_ms, 750);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[llm]\nprovider = \"anthropic\"\n").unwrap();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.transcription.provider, "none");
        assert!(config.capture.silence_detection);
    }
}
