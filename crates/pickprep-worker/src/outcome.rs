//! Batch result: a single-assignment slot and the caller's handle on it.

use pickprep_core::{MediaItem, PrepareError, Progress};
use tokio::sync::watch;
use uuid::Uuid;

/// Final result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Every item is ready; transcoded items point at their artifact.
    Success(Vec<MediaItem>),
    /// Nothing is returned; the caller treats the whole batch as not ready.
    Failure(PrepareError),
}

impl PrepareOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PrepareOutcome::Success(_))
    }
}

/// Write side of a batch result. The first `resolve` wins.
#[derive(Debug)]
pub(crate) struct ResultSlot {
    tx: watch::Sender<Option<PrepareOutcome>>,
}

impl ResultSlot {
    pub(crate) fn new() -> (Self, watch::Receiver<Option<PrepareOutcome>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    /// Store `outcome` unless the slot is already resolved. The check and the
    /// write happen under the channel's lock.
    ///
    /// Returns true if this call resolved the slot.
    pub(crate) fn resolve(&self, outcome: PrepareOutcome) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub(crate) fn current(&self) -> Option<PrepareOutcome> {
        self.tx.borrow().clone()
    }
}

/// Caller's view of one batch: its outcome and progress.
#[derive(Debug, Clone)]
pub struct PrepareHandle {
    batch_id: Uuid,
    outcome: watch::Receiver<Option<PrepareOutcome>>,
    progress: watch::Receiver<Progress>,
}

impl PrepareHandle {
    pub(crate) fn new(
        batch_id: Uuid,
        outcome: watch::Receiver<Option<PrepareOutcome>>,
        progress: watch::Receiver<Progress>,
    ) -> Self {
        Self {
            batch_id,
            outcome,
            progress,
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Wait for the batch to resolve.
    ///
    /// A batch torn down without ever resolving reports `UserCancelled`.
    pub async fn outcome(&mut self) -> PrepareOutcome {
        match self.outcome.wait_for(|slot| slot.is_some()).await {
            Ok(slot) => slot
                .clone()
                .unwrap_or(PrepareOutcome::Failure(PrepareError::UserCancelled)),
            Err(_) => PrepareOutcome::Failure(PrepareError::UserCancelled),
        }
    }

    /// Outcome if already resolved.
    pub fn try_outcome(&self) -> Option<PrepareOutcome> {
        self.outcome.borrow().clone()
    }

    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    /// Receiver that changes every time an item finishes, for UI observers.
    pub fn progress_receiver(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }
}
