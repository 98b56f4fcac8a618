//! Speech output adapter.
//!
//! Turns question text into audible output on the virtual output device
//! that the meeting picks up as a microphone. `speak` must not return
//! before playback has finished — the orchestrator's turn-taking depends
//! on that completion signal.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SpeechConfig;

#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Synthesize and play `text`, returning once playback has completed.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Speech output backed by a local TTS command (espeak-ng, piper, ...).
/// The process exiting is the playback-completion signal.
pub struct CommandSpeechOutput {
    program: PathBuf,
    voice: Option<String>,
    extra_args: Vec<String>,
}

impl CommandSpeechOutput {
    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let program = which::which(&config.program).with_context(|| {
            format!(
                "TTS program '{}' not found on PATH. Install it or set speech.program in config.",
                config.program
            )
        })?;

        info!("Speech output using {:?}", program);

        Ok(Self {
            program,
            voice: config.voice.clone(),
            extra_args: config.extra_args.clone(),
        })
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeechOutput {
    async fn speak(&self, text: &str) -> Result<()> {
        let mut command = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            command.arg("-v").arg(voice);
        }
        command.args(&self.extra_args);
        command.arg(text);
        // The caller bounds speak() with a timeout; the child must die
        // with the dropped future or it would keep playing into the
        // capture window.
        command.kill_on_drop(true);

        debug!("Speaking {} chars", text.len());

        let status = command
            .status()
            .await
            .with_context(|| format!("Failed to run TTS program {:?}", self.program))?;

        if !status.success() {
            bail!("TTS program {:?} exited with {}", self.program, status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn shell_speech(script: &str) -> CommandSpeechOutput {
        CommandSpeechOutput::from_config(&SpeechConfig {
            program: "sh".to_string(),
            voice: None,
            extra_args: vec!["-c".to_string(), script.to_string()],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_speak_waits_for_process_exit() {
        let speech = shell_speech("exit 0");
        speech.speak("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_speak_reports_nonzero_exit() {
        let speech = shell_speech("exit 3");
        assert!(speech.speak("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_child_is_killed_when_playback_wait_is_dropped() {
        // The script touches a marker after sleeping; if the child
        // outlives the dropped speak() future, the marker appears.
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("still-playing");
        let speech = shell_speech("sleep 0.3; touch \"$0\"");

        let bounded = tokio::time::timeout(
            Duration::from_millis(50),
            speech.speak(marker.to_str().unwrap()),
        )
        .await;
        assert!(bounded.is_err(), "speak should have been timed out");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(
            !marker.exists(),
            "TTS process survived the abandoned playback wait"
        );
    }
}
