//! State shared by the tasks of one batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use pickprep_core::{
    ErrorMetadata, LogLevel, MediaId, PrepareError, PrepareEvent, PrepareEventKind,
    PrepareEventSink, Progress, StatusPatch,
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::heartbeat::Heartbeat;
use crate::outcome::{PrepareOutcome, ResultSlot};
use crate::status_store::{StatusStore, StatusUpdate};
use crate::transcode::TranscodeQueue;

pub(crate) struct BatchShared {
    pub(crate) batch_id: Uuid,
    pub(crate) store: Arc<StatusStore>,
    pub(crate) heartbeat: Heartbeat,
    pub(crate) queue: TranscodeQueue,
    pub(crate) result: ResultSlot,
    progress: watch::Sender<Progress>,
    failed: AtomicBool,
    events: Arc<dyn PrepareEventSink>,
    started_at: Instant,
}

impl BatchShared {
    pub(crate) fn new(
        batch_id: Uuid,
        store: Arc<StatusStore>,
        heartbeat: Heartbeat,
        queue: TranscodeQueue,
        result: ResultSlot,
        progress: watch::Sender<Progress>,
        events: Arc<dyn PrepareEventSink>,
    ) -> Self {
        Self {
            batch_id,
            store,
            heartbeat,
            queue,
            result,
            progress,
            failed: AtomicBool::new(false),
            events,
            started_at: Instant::now(),
        }
    }

    /// Apply `patch` to one item and account for it.
    ///
    /// `error` describes the failure when the patch marks the item failed and
    /// is logged against the item it names.
    /// Does not beat: callers announce the change once every side effect
    /// (such as a transcode enqueue) is in place.
    pub(crate) async fn record(
        &self,
        item: &MediaId,
        patch: StatusPatch,
        error: Option<PrepareError>,
    ) -> Option<StatusUpdate> {
        let Some(update) = self.store.update(self.batch_id, item, patch).await else {
            tracing::debug!(
                batch_id = %self.batch_id,
                item_id = %item,
                "Dropping status update for a batch that is no longer current"
            );
            return None;
        };

        if update.became_done {
            self.progress.send_modify(|progress| progress.completed += 1);
        }

        if patch.is_failure() {
            self.failed.store(true, Ordering::SeqCst);
        }
        if let Some(err) = error {
            log_item_error(self.batch_id, err.item().unwrap_or(item), &err);
        }

        Some(update)
    }

    /// True once any item of the batch has failed.
    pub(crate) fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Resolve the batch and report the matching event. No-op when the result
    /// was already set.
    pub(crate) fn resolve(&self, outcome: PrepareOutcome) -> bool {
        let kind = match &outcome {
            PrepareOutcome::Success(items) => PrepareEventKind::Finished {
                prepared: items.len(),
                duration_ms: self.elapsed_ms(),
            },
            PrepareOutcome::Failure(PrepareError::ItemsFailed { items }) => {
                PrepareEventKind::Failed {
                    failed: items.len(),
                    duration_ms: self.elapsed_ms(),
                }
            }
            PrepareOutcome::Failure(err) if err.is_cancellation() => PrepareEventKind::Cancelled {
                reason: err.error_code().to_string(),
                duration_ms: self.elapsed_ms(),
            },
            PrepareOutcome::Failure(_) => PrepareEventKind::Failed {
                failed: 0,
                duration_ms: self.elapsed_ms(),
            },
        };

        if !self.result.resolve(outcome) {
            return false;
        }

        self.emit(kind);
        true
    }

    /// Fire-and-forget telemetry.
    pub(crate) fn emit(&self, kind: PrepareEventKind) {
        let event = PrepareEvent::new(self.batch_id, kind);
        let sink = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.dispatch(&event).await {
                tracing::warn!(
                    error = %e,
                    event = event.name(),
                    batch_id = %event.batch_id,
                    "Failed to dispatch preparation event"
                );
            }
        });
    }

    pub(crate) fn progress_receiver(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

fn log_item_error(batch_id: Uuid, item: &MediaId, err: &PrepareError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            batch_id = %batch_id,
            item_id = %item,
            error_code = err.error_code(),
            error = %err,
            "Item preparation stopped"
        ),
        LogLevel::Warn => tracing::warn!(
            batch_id = %batch_id,
            item_id = %item,
            error_code = err.error_code(),
            error = %err,
            "Item preparation failed"
        ),
        LogLevel::Error => tracing::error!(
            batch_id = %batch_id,
            item_id = %item,
            error_code = err.error_code(),
            error = %err,
            "Item preparation failed"
        ),
    }
}
