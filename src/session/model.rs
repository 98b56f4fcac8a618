//! Session, plan, and turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One question in the interview plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    /// Hint used to bound the answer capture window.
    pub expected_duration: Option<Duration>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expected_duration: None,
        }
    }
}

/// Ordered, immutable question list generated once per session.
#[derive(Debug, Clone)]
pub struct InterviewPlan {
    questions: Vec<Question>,
}

impl InterviewPlan {
    /// Returns None for an empty question list — an empty plan is a
    /// plan-generation failure, never a valid session input.
    pub fn new(questions: Vec<Question>) -> Option<Self> {
        if questions.is_empty() {
            None
        } else {
            Some(Self { questions })
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// How a single question/answer exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Success,
    CaptureFailed,
    TranscribeSkipped,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::CaptureFailed => "capture_failed",
            Self::TranscribeSkipped => "transcribe_skipped",
        }
    }
}

/// One completed question/answer exchange. Appended to the session's turn
/// list and never mutated after the next turn begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub index: usize,
    pub question: String,
    pub audio_path: Option<PathBuf>,
    pub transcript: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub outcome: TurnOutcome,
}

/// Reason a session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    PlanGeneration,
    JoinTimeout,
    Persist,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanGeneration => "plan_generation",
            Self::JoinTimeout => "join_timeout",
            Self::Persist => "persist",
        }
    }
}

/// Orchestrator state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    PlanGenerated,
    Joining,
    Joined,
    AskingQuestion(usize),
    Capturing(usize),
    Transcribing(usize),
    Advancing(usize),
    Summarizing,
    Completed,
    Failed(FailureReason),
    Aborted,
}

impl SessionStatus {
    pub fn question_index(&self) -> Option<usize> {
        match self {
            Self::AskingQuestion(i)
            | Self::Capturing(i)
            | Self::Transcribing(i)
            | Self::Advancing(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::PlanGenerated => "plan_generated",
            Self::Joining => "joining",
            Self::Joined => "joined",
            Self::AskingQuestion(_) => "asking_question",
            Self::Capturing(_) => "capturing",
            Self::Transcribing(_) => "transcribing",
            Self::Advancing(_) => "advancing",
            Self::Summarizing => "summarizing",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
            Self::Aborted => "aborted",
        }
    }
}

/// One interview run. Owned and mutated exclusively by the orchestrator;
/// observers see read-only snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub candidate: String,
    pub meeting_url: String,
    pub provider: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub artifact_dir: PathBuf,
    /// Length of the generated plan; 0 until plan generation succeeds.
    pub question_count: usize,
    pub turns: Vec<Turn>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        candidate: impl Into<String>,
        meeting_url: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        artifact_dir: PathBuf,
    ) -> Self {
        Self {
            id: id.into(),
            candidate: candidate.into(),
            meeting_url: meeting_url.into(),
            provider: provider.into(),
            model: model.into(),
            started_at: Utc::now(),
            status: SessionStatus::Created,
            artifact_dir,
            question_count: 0,
            turns: Vec::new(),
        }
    }

    /// Ordered concatenation of all turn transcripts with question/answer
    /// labels. Derived on demand; turns without a transcript contribute
    /// their question and a placeholder answer line.
    pub fn transcript_aggregate(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            out.push_str(&format!("Q{}: {}\n", turn.index + 1, turn.question));
            match (&turn.transcript, turn.outcome) {
                (Some(text), _) => out.push_str(&format!("A{}: {}\n", turn.index + 1, text)),
                (None, TurnOutcome::CaptureFailed) => {
                    out.push_str(&format!("A{}: [answer not captured]\n", turn.index + 1))
                }
                (None, _) => {
                    out.push_str(&format!("A{}: [transcript unavailable]\n", turn.index + 1))
                }
            }
            out.push('\n');
        }
        out
    }

    /// Transcribed answers only, skipping turns with no transcript.
    pub fn answered_transcripts(&self) -> Vec<&str> {
        self.turns
            .iter()
            .filter_map(|t| t.transcript.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(index: usize, transcript: Option<&str>, outcome: TurnOutcome) -> Turn {
        Turn {
            index,
            question: format!("Question {}", index + 1),
            audio_path: None,
            transcript: transcript.map(String::from),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            outcome,
        }
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert!(InterviewPlan::new(Vec::new()).is_none());
        let plan = InterviewPlan::new(vec![Question::new("Tell me about yourself.")]).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_transcript_aggregate_labels_and_placeholders() {
        let mut session = Session::new("s-1", "Ada", "https://meet.example/x", "openai",
            "gpt-4o-mini", PathBuf::from("/tmp/intervox-test"));
        session.turns.push(turn(0, Some("I build compilers."), TurnOutcome::Success));
        session.turns.push(turn(1, None, TurnOutcome::CaptureFailed));
        session.turns.push(turn(2, None, TurnOutcome::TranscribeSkipped));

        let aggregate = session.transcript_aggregate();
        assert!(aggregate.contains("Q1: Question 1"));
        assert!(aggregate.contains("A1: I build compilers."));
        assert!(aggregate.contains("A2: [answer not captured]"));
        assert!(aggregate.contains("A3: [transcript unavailable]"));
    }

    #[test]
    fn test_answered_transcripts_skips_missing() {
        let mut session = Session::new("s-1", "Ada", "url", "openai", "m",
            PathBuf::from("/tmp/intervox-test"));
        session.turns.push(turn(0, Some("first"), TurnOutcome::Success));
        session.turns.push(turn(1, None, TurnOutcome::TranscribeSkipped));
        session.turns.push(turn(2, Some("third"), TurnOutcome::Success));
        assert_eq!(session.answered_transcripts(), vec!["first", "third"]);
    }

    #[test]
    fn test_status_question_index() {
        assert_eq!(SessionStatus::Capturing(3).question_index(), Some(3));
        assert_eq!(SessionStatus::Summarizing.question_index(), None);
        assert!(SessionStatus::Failed(FailureReason::Persist).is_terminal());
        assert!(!SessionStatus::Joined.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::Failed(FailureReason::JoinTimeout)).unwrap();
        assert!(json.contains("failed"));
        assert!(json.contains("join_timeout"));
    }
}
