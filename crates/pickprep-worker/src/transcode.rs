//! Transcode queue and its sequential consumer.

use std::sync::Arc;

use pickprep_core::{
    MediaItem, PrepareError, StatusPatch, TranscodeCapabilities, TranscodeCapabilityChecker,
    TranscodeExecutor, TranscodeStatus,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::batch::BatchShared;

/// Producer side of a batch's transcode queue. Pushing never blocks.
#[derive(Clone, Debug)]
pub struct TranscodeQueue {
    tx: mpsc::Sender<MediaItem>,
}

/// Create a queue able to hold `capacity` items; a batch sizes it to its item
/// count so every candidate fits.
pub fn transcode_queue(capacity: usize) -> (TranscodeQueue, mpsc::Receiver<MediaItem>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TranscodeQueue { tx }, rx)
}

impl TranscodeQueue {
    pub fn push(&self, item: MediaItem) -> Result<(), PrepareError> {
        self.tx.try_send(item).map_err(|e| {
            match &e {
                TrySendError::Full(item) => tracing::error!(
                    item_id = %item.id,
                    "Transcode queue full, dropping item"
                ),
                TrySendError::Closed(item) => tracing::debug!(
                    item_id = %item.id,
                    "Transcode queue closed, dropping item"
                ),
            }
            PrepareError::QueueClosed
        })
    }
}

/// Consumes the transcode queue one item at a time.
pub(crate) struct TranscodeWorker {
    shared: Arc<BatchShared>,
    rx: mpsc::Receiver<MediaItem>,
    checker: Arc<dyn TranscodeCapabilityChecker>,
    executor: Arc<dyn TranscodeExecutor>,
    capabilities: TranscodeCapabilities,
}

impl TranscodeWorker {
    pub(crate) fn new(
        shared: Arc<BatchShared>,
        rx: mpsc::Receiver<MediaItem>,
        checker: Arc<dyn TranscodeCapabilityChecker>,
        executor: Arc<dyn TranscodeExecutor>,
        capabilities: TranscodeCapabilities,
    ) -> Self {
        Self {
            shared,
            rx,
            checker,
            executor,
            capabilities,
        }
    }

    #[tracing::instrument(skip_all, fields(batch_id = %self.shared.batch_id))]
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        tracing::debug!(batch_id = %self.shared.batch_id, "Transcode worker started");

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                item = self.rx.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            if !self.transcode_one(item, &cancel).await {
                break;
            }
        }

        self.rx.close();
        let mut discarded = 0usize;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }

        tracing::debug!(
            batch_id = %self.shared.batch_id,
            discarded,
            "Transcode worker stopped"
        );
    }

    /// Returns false if cancellation was observed mid-item.
    async fn transcode_one(&self, item: MediaItem, cancel: &CancellationToken) -> bool {
        let batch_id = self.shared.batch_id;

        let Some(status) = self.shared.store.get(&item.id).await else {
            tracing::warn!(batch_id = %batch_id, item_id = %item.id, "Transcode requested for unknown item");
            return true;
        };
        if status.transcode.is_terminal() {
            tracing::warn!(
                batch_id = %batch_id,
                item_id = %item.id,
                transcode = %status.transcode,
                "Transcode already settled, skipping"
            );
            return true;
        }
        if !status.preload_done() {
            tracing::warn!(
                batch_id = %batch_id,
                item_id = %item.id,
                load = %status.load,
                "Transcode requested before preload completed, skipping"
            );
            return true;
        }

        let required = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            required = self.checker.is_transcode_required(&self.capabilities, &item) => required,
        };

        let (outcome, error) = if !required {
            (TranscodeStatus::NotApplies, None)
        } else if !item.kind.supports_transcode() {
            (
                TranscodeStatus::Failed,
                Some(PrepareError::TranscodeUnsupportedKind {
                    item: item.id.clone(),
                    kind: item.kind,
                }),
            )
        } else if let Err(reason) = item.locator.to_transcoded() {
            (
                TranscodeStatus::Failed,
                Some(PrepareError::TranscodeTargetInvalid {
                    item: item.id.clone(),
                    reason,
                }),
            )
        } else {
            let start = std::time::Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                result = self.executor.perform_transcode(&item.locator) => result,
            };

            match result {
                Ok(true) => {
                    tracing::info!(
                        batch_id = %batch_id,
                        item_id = %item.id,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Transcode succeeded"
                    );
                    (TranscodeStatus::Succeeded, None)
                }
                Ok(false) => (
                    TranscodeStatus::Failed,
                    Some(PrepareError::TranscodeExecutionFailed {
                        item: item.id.clone(),
                        message: "executor reported failure".to_string(),
                    }),
                ),
                Err(e) => (
                    TranscodeStatus::Failed,
                    Some(PrepareError::TranscodeExecutionFailed {
                        item: item.id.clone(),
                        message: format!("{:#}", e),
                    }),
                ),
            }
        };

        self.shared
            .record(&item.id, StatusPatch::transcode(outcome), error)
            .await;
        self.shared.heartbeat.beat();
        true
    }
}
