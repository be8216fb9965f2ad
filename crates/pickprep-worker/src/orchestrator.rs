//! Batch lifecycle: start, supersede, cancel and observe preparation batches.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use pickprep_core::{
    ErrorMetadata, MediaItem, PrepareConfig, PrepareError, PrepareEventKind, Progress,
    SelectionMode, TranscodeRequest,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::batch::BatchShared;
use crate::context::PrepareCollaborators;
use crate::heartbeat::heartbeat;
use crate::monitor::Monitor;
use crate::outcome::{PrepareHandle, PrepareOutcome, ResultSlot};
use crate::preloader::Preloader;
use crate::status_store::{BatchSnapshot, StatusStore};
use crate::transcode::{transcode_queue, TranscodeWorker};

/// Identity of the storage the caller is browsing (account, profile...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageContextId(String);

impl StorageContextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StorageContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StorageContextId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Lifecycle of the most recent batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareState {
    Idle,
    Preparing,
    Succeeded,
    Failed,
    Cancelled,
}

struct ActiveBatch {
    batch_id: Uuid,
    scope: CancellationToken,
    tracker: TaskTracker,
    shared: Arc<BatchShared>,
}

impl ActiveBatch {
    fn state(&self) -> PrepareState {
        match self.shared.result.current() {
            None => PrepareState::Preparing,
            Some(PrepareOutcome::Success(_)) => PrepareState::Succeeded,
            Some(PrepareOutcome::Failure(err)) if err.is_cancellation() => {
                PrepareState::Cancelled
            }
            Some(PrepareOutcome::Failure(_)) => PrepareState::Failed,
        }
    }
}

/// Runs at most one preparation batch at a time.
pub struct PrepareOrchestrator {
    config: PrepareConfig,
    collaborators: PrepareCollaborators,
    store: Arc<StatusStore>,
    active: Mutex<Option<ActiveBatch>>,
    storage_context: Mutex<Option<StorageContextId>>,
}

impl PrepareOrchestrator {
    pub fn new(
        config: PrepareConfig,
        collaborators: PrepareCollaborators,
    ) -> Result<Self, PrepareError> {
        config
            .validate()
            .map_err(|e| PrepareError::Config(e.to_string()))?;

        Ok(Self {
            config,
            collaborators,
            store: Arc::new(StatusStore::new()),
            active: Mutex::new(None),
            storage_context: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Start preparing `items`, superseding any batch still in flight.
    pub async fn start_prepare(
        &self,
        items: Vec<MediaItem>,
        request: TranscodeRequest,
    ) -> Result<PrepareHandle, PrepareError> {
        if items.len() > self.config.max_batch_size {
            return Err(PrepareError::BatchTooLarge {
                size: items.len(),
                max: self.config.max_batch_size,
            });
        }

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.scope.cancel();
            if previous.shared.resolve(PrepareOutcome::Failure(PrepareError::Superseded)) {
                tracing::info!(
                    batch_id = %previous.batch_id,
                    "Preparation superseded by a newer batch"
                );
            }
        }

        let batch_id = Uuid::new_v4();
        let transcode_enabled = self.config.transcode_enabled && request.enabled;
        let (queue, queue_rx) = transcode_queue(items.len());
        let init = self
            .store
            .initialize(
                batch_id,
                &items,
                |item| transcode_enabled && item.kind.supports_transcode(),
                &queue,
            )
            .await?;

        let snapshot = self.store.snapshot().await;
        let (beat, listener) = heartbeat();
        let (result, outcome_rx) = ResultSlot::new();
        let (progress, _) = watch::channel(Progress::new(
            snapshot.completed_count(),
            snapshot.len(),
        ));
        let shared = Arc::new(BatchShared::new(
            batch_id,
            self.store.clone(),
            beat,
            queue,
            result,
            progress,
            self.collaborators.events.clone(),
        ));
        let handle = PrepareHandle::new(batch_id, outcome_rx, shared.progress_receiver());

        tracing::info!(
            batch_id = %batch_id,
            total = snapshot.len(),
            remote = init.remote.len(),
            transcode_candidates = init.transcode_candidates,
            queued_local = init.queued_for_transcode,
            transcode_enabled,
            "Preparation started"
        );
        shared.emit(PrepareEventKind::Started {
            total: snapshot.len(),
            remote: init.remote.len(),
            transcode_candidates: init.transcode_candidates,
        });

        let scope = CancellationToken::new();
        let tracker = TaskTracker::new();

        if snapshot.all_done() {
            tracing::debug!(batch_id = %batch_id, "Every item already prepared");
            let items = snapshot.entries.into_iter().map(|entry| entry.item).collect();
            shared.resolve(PrepareOutcome::Success(items));
        } else {
            let monitor = Monitor::new(
                shared.clone(),
                listener,
                self.collaborators.selection.clone(),
                scope.clone(),
            );
            tracker.spawn(monitor.run(scope.child_token()));

            if !init.remote.is_empty() {
                let preloader = Preloader::new(
                    shared.clone(),
                    self.collaborators.storage.clone(),
                    self.config.preload_concurrency,
                    self.config.preload_timeout(),
                );
                tracker.spawn(preloader.run(init.remote, scope.child_token()));
            }

            let worker = TranscodeWorker::new(
                shared.clone(),
                queue_rx,
                self.collaborators.capability_checker.clone(),
                self.collaborators.executor.clone(),
                request.capabilities,
            );
            tracker.spawn(worker.run(scope.child_token()));
        }
        tracker.close();

        *active = Some(ActiveBatch {
            batch_id,
            scope,
            tracker,
            shared,
        });

        Ok(handle)
    }

    /// Cancel the current batch. Safe to call at any time, any number of times.
    ///
    /// In `Single` mode the selection is cleared only when this call cancels a
    /// batch that was still preparing; a delivered result is left alone.
    pub async fn cancel_prepare(&self) {
        self.cancel_with(PrepareError::UserCancelled, false).await;
    }

    /// Report the storage context the caller is now browsing. A change while a
    /// batch is preparing cancels it. The first report only records the context.
    ///
    /// Returns true if a batch was cancelled.
    pub async fn on_storage_context_changed(&self, context: StorageContextId) -> bool {
        let changed = {
            let mut current = self.storage_context.lock().await;
            let changed = current.as_ref().is_some_and(|seen| seen != &context);
            if changed {
                tracing::info!(
                    from = %current.as_ref().map(|c| c.as_str()).unwrap_or_default(),
                    to = %context,
                    "Storage context changed"
                );
            }
            *current = Some(context);
            changed
        };

        changed && self.cancel_with(PrepareError::ContextChanged, true).await
    }

    /// Forward every value of `contexts` to [`Self::on_storage_context_changed`]
    /// until the sender is dropped.
    pub fn watch_storage_context(
        self: Arc<Self>,
        mut contexts: watch::Receiver<StorageContextId>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = contexts.borrow_and_update().clone();
            self.on_storage_context_changed(initial).await;

            while contexts.changed().await.is_ok() {
                let context = contexts.borrow_and_update().clone();
                self.on_storage_context_changed(context).await;
            }
            tracing::debug!("Storage context sender dropped, stopped watching");
        })
    }

    /// Wait until every task of the current batch has exited.
    pub async fn wait_for_workers(&self) {
        let tracker = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|batch| batch.tracker.clone());
        if let Some(tracker) = tracker {
            tracker.wait().await;
        }
    }

    pub async fn state(&self) -> PrepareState {
        self.active
            .lock()
            .await
            .as_ref()
            .map_or(PrepareState::Idle, ActiveBatch::state)
    }

    pub async fn current_batch(&self) -> Option<Uuid> {
        self.active.lock().await.as_ref().map(|batch| batch.batch_id)
    }

    /// Per-item statuses of the current batch.
    pub async fn status_snapshot(&self) -> BatchSnapshot {
        self.store.snapshot().await
    }

    /// Returns true if this call resolved the batch.
    async fn cancel_with(&self, reason: PrepareError, only_if_preparing: bool) -> bool {
        let resolved = {
            let active = self.active.lock().await;
            let Some(batch) = active.as_ref() else {
                tracing::debug!(reason = reason.error_code(), "No batch to cancel");
                return false;
            };
            if only_if_preparing && batch.state() != PrepareState::Preparing {
                return false;
            }

            batch.scope.cancel();
            let resolved = batch.shared.resolve(PrepareOutcome::Failure(reason.clone()));
            if resolved {
                tracing::info!(
                    batch_id = %batch.batch_id,
                    reason = reason.error_code(),
                    "Preparation cancelled"
                );
            }
            resolved
        };

        if resolved && self.config.selection_mode == SelectionMode::Single {
            self.collaborators.selection.clear().await;
        }

        resolved
    }
}
