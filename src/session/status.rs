//! Shared session status handle and transition event stream.
//!
//! The orchestrator publishes every state transition here; the status API
//! and any other observer read snapshots or subscribe to the event stream.
//! Delivery is best effort, in transition order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use super::model::SessionStatus;

/// Payload emitted on every state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub session_id: String,
    pub status: SessionStatus,
    pub question_index: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot readable by observers.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub session_id: Option<String>,
    pub status: SessionStatus,
    pub question_index: Option<usize>,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            status: SessionStatus::Created,
            question_index: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }
}

/// Thread-safe handle shared between the orchestrator and observers.
#[derive(Clone)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<StatusSnapshot>>,
    events: broadcast::Sender<StatusEvent>,
}

impl Default for SessionStatusHandle {
    fn default() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(StatusSnapshot::default())),
            events,
        }
    }
}

impl SessionStatusHandle {
    pub async fn get(&self) -> StatusSnapshot {
        self.inner.lock().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    /// Record a transition and publish it. Lagging or absent subscribers
    /// never block the orchestrator.
    pub async fn transition(&self, session_id: &str, status: SessionStatus) {
        let event = StatusEvent {
            session_id: session_id.to_string(),
            status,
            question_index: status.question_index(),
            timestamp: Utc::now(),
        };

        {
            let mut snapshot = self.inner.lock().await;
            snapshot.session_id = Some(event.session_id.clone());
            snapshot.status = status;
            snapshot.question_index = event.question_index;
            snapshot.updated_at = event.timestamp;
        }

        let _ = self.events.send(event);
    }

    pub async fn set_error(&self, detail: String) {
        let mut snapshot = self.inner.lock().await;
        snapshot.last_error = Some(detail);
    }
}
