//! The `run` command: wire adapters from config and conduct a session.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::ApiServer;
use crate::artifacts::ArtifactStore;
use crate::capture::LoopbackCapture;
use crate::config::Config;
use crate::global;
use crate::interview::{extract_profile, PlanGenerator, Summarizer};
use crate::llm;
use crate::meet::ChromiumMeetSession;
use crate::session::{
    SessionOrchestrator, SessionRequest, SessionStatus, SessionStatusHandle, TurnTiming,
};
use crate::speech::CommandSpeechOutput;
use crate::transcribe;

use super::args::RunCliArgs;

pub async fn handle_run_command(args: RunCliArgs) -> Result<()> {
    let config = Config::load()?;

    let profile = extract_profile(&args.cv)?;
    let outline = args
        .outline
        .as_deref()
        .map(std::fs::read_to_string)
        .transpose()
        .context("Failed to read outline file")?;

    let llm_client: Arc<dyn llm::LlmClient> = Arc::from(llm::build_client(&config.llm)?);
    let planner = PlanGenerator::new(llm_client.clone());
    let summarizer = Summarizer::new(llm_client);

    let speech = CommandSpeechOutput::from_config(&config.speech)?;
    let capture = LoopbackCapture::from_config(&config.capture);
    let transcription = transcribe::build_engine(&config.transcription)?;
    if transcription.is_none() {
        warn!("No transcription engine configured; answers will be audio-only");
    }
    let meeting = ChromiumMeetSession::from_config(&config.meeting);

    let base_dir = match args.output_dir {
        Some(dir) => dir,
        None => global::sessions_dir()?,
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    let request = SessionRequest {
        session_id: session_id.clone(),
        candidate: args.candidate,
        meeting_url: args.meeting_url,
        profile,
        outline,
        provider: config.llm.provider.clone(),
        model: config.llm.model.clone(),
    };

    let store = ArtifactStore::create(&base_dir, &session_id)?;

    let status = SessionStatusHandle::default();
    let cancel = CancellationToken::new();

    if !args.no_api {
        let api_server = ApiServer::new(status.clone(), cancel.clone());
        tokio::spawn(async move {
            if let Err(e) = api_server.start().await {
                error!("Status API failed: {}", e);
            }
        });
    }

    // Ctrl-C aborts the session at the next suspend point.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, aborting session");
                cancel.cancel();
            }
        });
    }

    // Print transitions for whoever is watching the terminal.
    {
        let mut events = status.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event.question_index {
                    Some(i) => info!("[{}] {} (question {})", event.session_id, event.status.as_str(), i + 1),
                    None => info!("[{}] {}", event.session_id, event.status.as_str()),
                }
            }
        });
    }

    let timing = TurnTiming::from_config(&config.timing, &config.capture);
    let orchestrator = SessionOrchestrator::new(
        Box::new(speech),
        Box::new(capture),
        transcription,
        Box::new(meeting),
        planner,
        summarizer,
        store,
        status,
        timing,
        cancel,
    );

    let session = orchestrator.run(request).await;

    println!("Session {} finished: {}", session.id, session.status.as_str());
    println!("Artifacts: {}", session.artifact_dir.display());

    match session.status {
        SessionStatus::Completed => Ok(()),
        status => bail!("Session ended with status '{}'", status.as_str()),
    }
}
