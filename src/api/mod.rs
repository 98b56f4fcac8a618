//! Local status API for the UI collaborator.
//!
//! Exposes the running session read-only and accepts a user-initiated
//! abort. The orchestrator itself never depends on this server.

use anyhow::Result;
use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tracing::info;

use crate::session::SessionStatusHandle;

const DEFAULT_PORT: u16 = 4646;

#[derive(Clone)]
pub struct ApiState {
    pub status: SessionStatusHandle,
    pub cancel: CancellationToken,
}

pub struct ApiServer {
    port: u16,
    state: ApiState,
}

impl ApiServer {
    pub fn new(status: SessionStatusHandle, cancel: CancellationToken) -> Self {
        Self {
            port: DEFAULT_PORT,
            state: ApiState { status, cancel },
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .route("/status", get(session_status))
            .route("/abort", post(abort_session))
            .layer(ServiceBuilder::new())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("Status API listening on http://127.0.0.1:{}", self.port);
        info!("  GET  /       - Service info");
        info!("  GET  /status - Current session status");
        info!("  POST /abort  - Abort the running session");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "intervox",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn session_status(State(state): State<ApiState>) -> Json<Value> {
    let snapshot = state.status.get().await;
    Json(json!({
        "session_id": snapshot.session_id,
        "status": snapshot.status.as_str(),
        "question_index": snapshot.question_index,
        "last_error": snapshot.last_error,
        "updated_at": snapshot.updated_at,
    }))
}

async fn abort_session(State(state): State<ApiState>) -> Json<Value> {
    info!("Abort requested via API");
    state.cancel.cancel();
    Json(json!({ "success": true }))
}
