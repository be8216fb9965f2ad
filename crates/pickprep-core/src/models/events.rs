use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Telemetry event emitted over a batch's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareEvent {
    pub batch_id: Uuid,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: PrepareEventKind,
}

impl PrepareEvent {
    pub fn new(batch_id: Uuid, kind: PrepareEventKind) -> Self {
        Self {
            batch_id,
            at: Utc::now(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            PrepareEventKind::Started { .. } => "prepare_started",
            PrepareEventKind::Finished { .. } => "prepare_finished",
            PrepareEventKind::Failed { .. } => "prepare_failed",
            PrepareEventKind::Cancelled { .. } => "prepare_cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PrepareEventKind {
    Started {
        total: usize,
        remote: usize,
        transcode_candidates: usize,
    },
    Finished {
        prepared: usize,
        duration_ms: u64,
    },
    Failed {
        failed: usize,
        duration_ms: u64,
    },
    Cancelled {
        reason: String,
        duration_ms: u64,
    },
}
