//! Session failure taxonomy.
//!
//! Only three conditions are fatal to a session: plan generation, joining
//! the meeting, and the final artifact write. Everything else is absorbed
//! into the affected turn's outcome.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("interview plan generation failed: {0}")]
    PlanGeneration(String),

    #[error("could not join the meeting within {timeout:?}: {detail}")]
    JoinTimeout { timeout: Duration, detail: String },

    #[error("audio capture failed: {0}")]
    Capture(String),

    #[error("transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("failed to persist session artifacts: {0}")]
    Persist(String),

    #[error("session aborted by user")]
    Aborted,
}

impl InterviewError {
    /// Whether this error ends the session (as opposed to being absorbed
    /// into a single turn's outcome).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PlanGeneration(_) | Self::JoinTimeout { .. } | Self::Persist(_) | Self::Aborted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        assert!(InterviewError::PlanGeneration("empty plan".into()).is_fatal());
        assert!(InterviewError::Persist("disk full".into()).is_fatal());
        assert!(!InterviewError::Capture("no device".into()).is_fatal());
        assert!(!InterviewError::Summarization("api error".into()).is_fatal());
    }
}
