//! On-disk artifact set for one session.
//!
//! Layout under `<base>/<session_id>/`:
//!   audio/turn_{i}.wav
//!   transcript.txt
//!   summary.txt
//!   metadata.json
//!
//! Turn artifacts are flushed as each turn completes, so a crash
//! mid-session leaves every finished turn recoverable. The directory is
//! keyed by session id; nothing here is ever deleted by the core.

use anyhow::{Context, Result};
use hound::{WavSpec, WavWriter};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::capture::CapturedAudio;
use crate::session::model::{Session, Turn};

pub struct ArtifactStore {
    root: PathBuf,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    session_id: &'a str,
    candidate: &'a str,
    meeting_url: &'a str,
    provider: &'a str,
    model: &'a str,
    started_at: chrono::DateTime<chrono::Utc>,
    finished_at: chrono::DateTime<chrono::Utc>,
    question_count: usize,
    turn_count: usize,
    turns: &'a [Turn],
    status: &'a crate::session::model::SessionStatus,
}

impl ArtifactStore {
    /// Create the per-session directory tree.
    pub fn create(base_dir: &Path, session_id: &str) -> Result<Self> {
        let root = base_dir.join(session_id);
        std::fs::create_dir_all(root.join("audio"))
            .with_context(|| format!("Failed to create artifact directory {:?}", root))?;

        info!("Artifact store at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audio_path(&self, turn_index: usize) -> PathBuf {
        self.root.join("audio").join(format!("turn_{turn_index}.wav"))
    }

    /// Write one turn's captured audio and flush it to disk before the
    /// orchestrator is allowed to advance.
    pub fn write_turn_audio(&self, turn_index: usize, audio: &CapturedAudio) -> Result<PathBuf> {
        let path = self.audio_path(turn_index);

        let spec = WavSpec {
            channels: 1,
            sample_rate: audio.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create {:?}", path))?;
        for &sample in &audio.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        File::open(&path)?.sync_all()?;

        info!(
            "Turn {} audio saved: {:?} ({} samples)",
            turn_index,
            path,
            audio.samples.len()
        );
        Ok(path)
    }

    /// Rewrite the labelled transcript from the turns recorded so far.
    pub fn write_transcript(&self, session: &Session) -> Result<()> {
        let path = self.root.join("transcript.txt");
        self.write_durable(&path, session.transcript_aggregate().as_bytes())
    }

    pub fn write_summary(&self, summary: &str) -> Result<()> {
        let path = self.root.join("summary.txt");
        self.write_durable(&path, summary.as_bytes())
    }

    pub fn write_metadata(&self, session: &Session) -> Result<()> {
        let metadata = Metadata {
            session_id: &session.id,
            candidate: &session.candidate,
            meeting_url: &session.meeting_url,
            provider: &session.provider,
            model: &session.model,
            started_at: session.started_at,
            finished_at: chrono::Utc::now(),
            question_count: session.question_count,
            turn_count: session.turns.len(),
            turns: &session.turns,
            status: &session.status,
        };

        let json = serde_json::to_string_pretty(&metadata)
            .context("Failed to serialize session metadata")?;
        let path = self.root.join("metadata.json");
        self.write_durable(&path, json.as_bytes())
    }

    fn write_durable(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file =
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        file.write_all(bytes)?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::{SessionStatus, TurnOutcome};
    use chrono::Utc;

    fn sample_audio() -> CapturedAudio {
        CapturedAudio {
            samples: vec![0.1, -0.1, 0.2, -0.2],
            sample_rate: 16000,
        }
    }

    #[test]
    fn test_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "abc-123").unwrap();

        assert!(store.root().ends_with("abc-123"));
        assert!(store.root().join("audio").is_dir());
        assert_eq!(
            store.audio_path(3).file_name().unwrap().to_str().unwrap(),
            "turn_3.wav"
        );
    }

    #[test]
    fn test_write_turn_audio_creates_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "s").unwrap();

        let path = store.write_turn_audio(0, &sample_audio()).unwrap();
        assert!(path.exists());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_metadata_contains_session_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "s").unwrap();

        let mut session = Session::new(
            "s",
            "Ada",
            "https://meet.example/x",
            "openai",
            "gpt-4o-mini",
            store.root().to_path_buf(),
        );
        session.status = SessionStatus::Completed;
        session.question_count = 2;
        session.turns.push(Turn {
            index: 0,
            question: "Q".to_string(),
            audio_path: Some(store.audio_path(0)),
            transcript: Some("A".to_string()),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            outcome: TurnOutcome::Success,
        });

        store.write_metadata(&session).unwrap();

        let raw = std::fs::read_to_string(store.root().join("metadata.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["candidate"], "Ada");
        // Planned questions and completed turns are tracked separately:
        // a session that ends early keeps the full plan size on record.
        assert_eq!(value["question_count"], 2);
        assert_eq!(value["turn_count"], 1);
        assert_eq!(value["status"]["state"], "completed");
        assert_eq!(value["turns"][0]["outcome"], "success");
    }

    #[test]
    fn test_transcript_rewrite_reflects_turns() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "s").unwrap();

        let mut session = Session::new("s", "Ada", "url", "openai", "m", store.root().to_path_buf());
        session.turns.push(Turn {
            index: 0,
            question: "First question".to_string(),
            audio_path: None,
            transcript: Some("First answer".to_string()),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            outcome: TurnOutcome::Success,
        });

        store.write_transcript(&session).unwrap();
        let text = std::fs::read_to_string(store.root().join("transcript.txt")).unwrap();
        assert!(text.contains("Q1: First question"));
        assert!(text.contains("A1: First answer"));
    }
}
