use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{
    model::{ActivityEntry, ActivityKind, NewActivity},
    repo::ActivityRepo,
};
use crate::error::StoreError;

const QUEUE_DEPTH: usize = 1024;

/// Upper bound on each admin feed.
pub const FEED_LIMIT: i64 = 100;

/// Fire-and-forget writer. `record` only enqueues; a background task persists
/// and logs failures, so callers never observe the outcome.
#[derive(Clone)]
pub struct ActivityRecorder {
    tx: mpsc::Sender<NewActivity>,
    repo: Arc<dyn ActivityRepo>,
}

impl ActivityRecorder {
    /// The consumer exits once every recorder clone is dropped.
    pub fn spawn(repo: Arc<dyn ActivityRepo>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let handle = tokio::spawn(drain(rx, repo.clone()));
        (Self { tx, repo }, handle)
    }

    pub fn record(&self, user_id: Uuid, kind: ActivityKind, details: serde_json::Value) {
        let event = NewActivity {
            user_id,
            kind,
            details,
        };
        if let Err(e) = self.tx.try_send(event) {
            warn!(%user_id, kind = kind.as_str(), error = %e, "activity event dropped");
        }
    }

    pub async fn recent(&self, kind: ActivityKind, limit: i64) -> Result<Vec<ActivityEntry>, StoreError> {
        self.repo.recent(kind, limit.clamp(0, FEED_LIMIT)).await
    }
}

async fn drain(mut rx: mpsc::Receiver<NewActivity>, repo: Arc<dyn ActivityRepo>) {
    while let Some(event) = rx.recv().await {
        let (user_id, kind) = (event.user_id, event.kind);
        match repo.insert(event).await {
            Ok(()) => debug!(%user_id, kind = kind.as_str(), "activity recorded"),
            Err(e) => error!(%user_id, kind = kind.as_str(), error = %e, "failed to record activity"),
        }
    }
    debug!("activity recorder stopped");
}
