//! Interview content: candidate profile ingestion, plan generation,
//! and transcript summarization.

pub mod cv;
pub mod plan;
pub mod summary;

pub use cv::extract_profile;
pub use plan::PlanGenerator;
pub use summary::Summarizer;

/// Fallback outline used when the caller supplies none.
pub const DEFAULT_OUTLINE: &str = "\
1. Welcome the candidate and confirm audio quality.
2. Ask about the candidate's most relevant experience for the role.
3. Dive deeper into one technical project.
4. Explore behavioural competencies.
5. Provide time for candidate questions.
6. Close by explaining next steps.";
