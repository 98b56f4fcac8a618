//! Session orchestrator.
//!
//! Drives one interview end to end:
//! plan → join → (ask → capture → transcribe → persist)* → summarize → done
//!
//! Turn-taking rule: capture for a question never opens before that
//! question's playback has completed (or the maximum speak duration has
//! elapsed), plus a guard delay, so the synthesized audio is never
//! self-recorded. A turn's artifacts are durably written before the next
//! question is spoken.
//!
//! Failure policy: anything local to one turn is absorbed into that
//! turn's outcome. Plan generation and joining are fatal before the
//! interview commits; after it completes, only the final artifact write
//! can fail the session.
//!
//! All dependencies are injected via constructor — no concrete types
//! hardcoded.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactStore;
use crate::capture::{AudioCapture, CaptureWindow, SilencePolicy};
use crate::config::{CaptureConfig, TimingConfig};
use crate::error::InterviewError;
use crate::interview::summary::placeholder_summary;
use crate::interview::{PlanGenerator, Summarizer};
use crate::meet::MeetingSession;
use crate::speech::SpeechOutput;
use crate::transcribe::TranscriptionEngine;

use super::model::{FailureReason, Session, SessionStatus, Turn, TurnOutcome};
use super::status::SessionStatusHandle;

use std::time::Duration;

/// Timing policy for one session, fixed at start.
#[derive(Debug, Clone, Copy)]
pub struct TurnTiming {
    pub join_timeout: Duration,
    pub max_speak: Duration,
    pub guard_delay: Duration,
    pub min_answer: Duration,
    pub max_answer: Duration,
    pub silence: Option<SilencePolicy>,
}

impl TurnTiming {
    pub fn from_config(timing: &TimingConfig, capture: &CaptureConfig) -> Self {
        let silence = capture.silence_detection.then(|| SilencePolicy {
            threshold: capture.silence_threshold,
            hold: Duration::from_secs(capture.silence_hold_secs),
        });

        Self {
            join_timeout: timing.join_timeout(),
            max_speak: timing.max_speak(),
            guard_delay: timing.guard_delay(),
            min_answer: timing.min_answer(),
            max_answer: timing.max_answer(),
            silence,
        }
    }
}

/// Inputs for one interview run.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// Must match the id the artifact store was created with.
    pub session_id: String,
    pub candidate: String,
    pub meeting_url: String,
    pub profile: String,
    pub outline: Option<String>,
    pub provider: String,
    pub model: String,
}

pub struct SessionOrchestrator {
    speech: Box<dyn SpeechOutput>,
    capture: Box<dyn AudioCapture>,
    transcription: Option<Box<dyn TranscriptionEngine>>,
    meeting: Box<dyn MeetingSession>,
    planner: PlanGenerator,
    summarizer: Summarizer,
    store: ArtifactStore,
    status: SessionStatusHandle,
    timing: TurnTiming,
    cancel: CancellationToken,
}

impl SessionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        speech: Box<dyn SpeechOutput>,
        capture: Box<dyn AudioCapture>,
        transcription: Option<Box<dyn TranscriptionEngine>>,
        meeting: Box<dyn MeetingSession>,
        planner: PlanGenerator,
        summarizer: Summarizer,
        store: ArtifactStore,
        status: SessionStatusHandle,
        timing: TurnTiming,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            speech,
            capture,
            transcription,
            meeting,
            planner,
            summarizer,
            store,
            status,
            timing,
            cancel,
        }
    }

    /// Conduct the interview. Always returns the session with its final
    /// status; fatal failures and aborts are recorded, never panicked.
    pub async fn run(mut self, request: SessionRequest) -> Session {
        let mut session = Session::new(
            &request.session_id,
            &request.candidate,
            &request.meeting_url,
            &request.provider,
            &request.model,
            self.store.root().to_path_buf(),
        );
        self.status
            .transition(&session.id, SessionStatus::Created)
            .await;

        info!(
            "Session {} started for candidate '{}'",
            session.id, session.candidate
        );

        if let Err(err) = self.drive(&mut session, &request).await {
            let status = match &err {
                InterviewError::Aborted => SessionStatus::Aborted,
                InterviewError::JoinTimeout { .. } => {
                    SessionStatus::Failed(FailureReason::JoinTimeout)
                }
                InterviewError::PlanGeneration(_) => {
                    SessionStatus::Failed(FailureReason::PlanGeneration)
                }
                _ => SessionStatus::Failed(FailureReason::Persist),
            };

            error!("Session {} ended: {}", session.id, err);
            session.status = status;

            // Leave the meeting and snapshot metadata so everything
            // gathered so far stays discoverable on disk.
            if let Err(e) = self.meeting.leave().await {
                warn!("Failed to leave meeting after session end: {e:#}");
            }
            if let Err(e) = self.store.write_metadata(&session) {
                warn!("Failed to snapshot session metadata: {e:#}");
            }

            self.status.set_error(err.to_string()).await;
            self.status.transition(&session.id, status).await;
        }

        session
    }

    async fn drive(
        &mut self,
        session: &mut Session,
        request: &SessionRequest,
    ) -> Result<(), InterviewError> {
        let plan = self.generate_plan(request).await?;
        session.question_count = plan.len();
        self.set_status(session, SessionStatus::PlanGenerated).await;

        self.join(session).await?;

        let greeting = format!(
            "Hello {}! I'm an automated interviewer. I'll ask {} questions aloud; \
             please answer after each one.",
            session.candidate,
            plan.len()
        );
        if let Err(e) = self.meeting.announce(&greeting).await {
            warn!("Failed to post greeting announcement: {e:#}");
        }

        for (index, question) in plan.questions().iter().enumerate() {
            self.check_cancel()?;
            self.set_status(session, SessionStatus::AskingQuestion(index))
                .await;
            let started_at = Utc::now();

            self.ask(index, &question.text).await?;
            self.guard_delay().await?;

            self.set_status(session, SessionStatus::Capturing(index))
                .await;
            let (audio_path, mut outcome) = self.capture_answer(index, question).await?;

            let mut transcript = None;
            if let (TurnOutcome::Success, Some(path)) = (outcome, audio_path.as_deref()) {
                match &self.transcription {
                    Some(engine) => {
                        self.set_status(session, SessionStatus::Transcribing(index))
                            .await;
                        match engine.transcribe(path).await {
                            Ok(text) if !text.trim().is_empty() => transcript = Some(text),
                            Ok(_) => {
                                debug!("Turn {} transcript came back empty", index + 1);
                                outcome = TurnOutcome::TranscribeSkipped;
                            }
                            Err(e) => {
                                let err =
                                    InterviewError::TranscriptionUnavailable(format!("{e:#}"));
                                warn!("Turn {}: {}", index + 1, err);
                                outcome = TurnOutcome::TranscribeSkipped;
                            }
                        }
                    }
                    None => outcome = TurnOutcome::TranscribeSkipped,
                }
            }

            session.turns.push(Turn {
                index,
                question: question.text.clone(),
                audio_path,
                transcript,
                started_at,
                ended_at: Utc::now(),
                outcome,
            });

            // Write-before-advance: the turn's audio is already durable;
            // flush the transcript so far before the next question.
            self.set_status(session, SessionStatus::Advancing(index))
                .await;
            if let Err(e) = self.store.write_transcript(session) {
                warn!("Failed to flush transcript after turn {}: {e:#}", index + 1);
            }
            if let Err(e) = self.meeting.keep_alive().await {
                warn!("Meeting keep-alive failed: {e:#}");
            }
        }

        self.check_cancel()?;

        if let Err(e) = self
            .meeting
            .announce("Thank you for your time! We'll follow up shortly.")
            .await
        {
            warn!("Failed to post closing announcement: {e:#}");
        }
        if let Err(e) = self.meeting.leave().await {
            warn!("Failed to leave meeting: {e:#}");
        }

        self.set_status(session, SessionStatus::Summarizing).await;
        let summary = self.summarize(session).await;

        // The artifact set is the deliverable: this write must succeed
        // even though the interview itself already happened.
        session.status = SessionStatus::Completed;
        self.store
            .write_summary(&summary)
            .map_err(|e| InterviewError::Persist(format!("{e:#}")))?;
        self.store
            .write_transcript(session)
            .map_err(|e| InterviewError::Persist(format!("{e:#}")))?;
        self.store
            .write_metadata(session)
            .map_err(|e| InterviewError::Persist(format!("{e:#}")))?;

        self.status
            .transition(&session.id, SessionStatus::Completed)
            .await;
        info!(
            "Session {} completed: {} turns, artifacts at {:?}",
            session.id,
            session.turns.len(),
            self.store.root()
        );
        Ok(())
    }

    /// Plan generation, retried once with the same input.
    async fn generate_plan(
        &self,
        request: &SessionRequest,
    ) -> Result<crate::session::model::InterviewPlan, InterviewError> {
        let profile = request.profile.as_str();
        let outline = request.outline.as_deref();

        match self.planner.generate(profile, outline).await {
            Ok(plan) => Ok(plan),
            Err(first) => {
                warn!("Plan generation failed, retrying once: {first:#}");
                self.check_cancel()?;
                self.planner
                    .generate(profile, outline)
                    .await
                    .map_err(|second| InterviewError::PlanGeneration(format!("{second:#}")))
            }
        }
    }

    /// Join within the configured window. The window is generous enough
    /// for a human to clear login or captcha screens in the browser.
    async fn join(&mut self, session: &mut Session) -> Result<(), InterviewError> {
        self.set_status(session, SessionStatus::Joining).await;

        let cancel = self.cancel.clone();
        let timeout = self.timing.join_timeout;
        let url = session.meeting_url.clone();

        tokio::select! {
            _ = cancel.cancelled() => return Err(InterviewError::Aborted),
            joined = tokio::time::timeout(timeout, self.meeting.join(&url)) => match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(InterviewError::JoinTimeout {
                        timeout,
                        detail: format!("{e:#}"),
                    })
                }
                Err(_) => {
                    return Err(InterviewError::JoinTimeout {
                        timeout,
                        detail: "join window elapsed".to_string(),
                    })
                }
            },
        }

        self.set_status(session, SessionStatus::Joined).await;
        Ok(())
    }

    /// Speak one question, waiting for playback completion bounded by the
    /// maximum speak duration. Speech trouble never ends the interview.
    async fn ask(&self, index: usize, text: &str) -> Result<(), InterviewError> {
        let cancel = self.cancel.clone();

        tokio::select! {
            _ = cancel.cancelled() => return Err(InterviewError::Aborted),
            spoken = tokio::time::timeout(self.timing.max_speak, self.speech.speak(text)) => {
                match spoken {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("Speech output failed for question {}: {e:#}", index + 1),
                    Err(_) => warn!(
                        "Playback of question {} exceeded {:?}, opening capture anyway",
                        index + 1,
                        self.timing.max_speak
                    ),
                }
            }
        }
        Ok(())
    }

    /// Fixed pause between reported playback end and the capture window,
    /// so the question's tail never lands in the recording.
    async fn guard_delay(&self) -> Result<(), InterviewError> {
        let cancel = self.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => Err(InterviewError::Aborted),
            _ = tokio::time::sleep(self.timing.guard_delay) => Ok(()),
        }
    }

    /// Capture one answer and persist its audio. Device trouble yields a
    /// capture-failed turn and the interview continues.
    async fn capture_answer(
        &self,
        index: usize,
        question: &crate::session::model::Question,
    ) -> Result<(Option<std::path::PathBuf>, TurnOutcome), InterviewError> {
        let max = question
            .expected_duration
            .unwrap_or(self.timing.max_answer)
            .max(self.timing.min_answer);
        let window = CaptureWindow {
            min: self.timing.min_answer,
            max,
            silence: self
                .capture
                .supports_silence_detection()
                .then_some(self.timing.silence)
                .flatten(),
        };

        match self.capture.capture(window, &self.cancel).await {
            Ok(audio) => match self.store.write_turn_audio(index, &audio) {
                Ok(path) => Ok((Some(path), TurnOutcome::Success)),
                Err(e) => {
                    let err = InterviewError::Capture(format!("{e:#}"));
                    warn!("Turn {}: {}", index + 1, err);
                    Ok((None, TurnOutcome::CaptureFailed))
                }
            },
            Err(e) => {
                if self.cancel.is_cancelled() {
                    return Err(InterviewError::Aborted);
                }
                let err = match e.downcast::<InterviewError>() {
                    Ok(err) if err.is_fatal() => return Err(err),
                    Ok(err) => err,
                    Err(e) => InterviewError::Capture(format!("{e:#}")),
                };
                warn!("Turn {} absorbed: {}", index + 1, err);
                Ok((None, TurnOutcome::CaptureFailed))
            }
        }
    }

    /// Summarize with one retry, degrading to a placeholder. Never fatal.
    async fn summarize(&self, session: &Session) -> String {
        if session.answered_transcripts().is_empty() {
            info!("No transcripts available, writing placeholder summary");
            return placeholder_summary("no answers were transcribed");
        }

        let aggregate = session.transcript_aggregate();
        match self.summarizer.summarize(&aggregate).await {
            Ok(summary) => summary,
            Err(first) => {
                warn!("Summarization failed, retrying once: {first:#}");
                match self.summarizer.summarize(&aggregate).await {
                    Ok(summary) => summary,
                    Err(second) => {
                        let err = InterviewError::Summarization(format!("{second:#}"));
                        warn!("{err}; falling back to placeholder");
                        placeholder_summary(&err.to_string())
                    }
                }
            }
        }
    }

    async fn set_status(&self, session: &mut Session, status: SessionStatus) {
        session.status = status;
        self.status.transition(&session.id, status).await;
    }

    fn check_cancel(&self) -> Result<(), InterviewError> {
        if self.cancel.is_cancelled() {
            Err(InterviewError::Aborted)
        } else {
            Ok(())
        }
    }
}
