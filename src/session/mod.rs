pub mod model;
pub mod orchestrator;
pub mod status;

pub use model::{FailureReason, InterviewPlan, Question, Session, SessionStatus, Turn, TurnOutcome};
pub use orchestrator::{SessionOrchestrator, SessionRequest, TurnTiming};
pub use status::{SessionStatusHandle, StatusEvent, StatusSnapshot};
