//! Per-item preparation status table.
//!
//! One table per batch, behind a single lock. Every read that needs more than
//! one field goes through [`StatusStore::snapshot`], so derived answers
//! (any failed, all done) always come from one consistent view.

use std::collections::HashMap;

use pickprep_core::{
    LoadStatus, Locality, MediaId, MediaItem, PrepareError, PrepareStatus, StatusPatch,
    TranscodeStatus,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::transcode::TranscodeQueue;

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub item: MediaItem,
    pub status: PrepareStatus,
}

/// Result of a successful [`StatusStore::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Status after the merge.
    pub status: PrepareStatus,
    /// True if the item became done with this update.
    pub became_done: bool,
}

/// What [`StatusStore::initialize`] learned about the new batch.
#[derive(Debug, Default)]
pub struct InitializedBatch {
    /// Items that must be preloaded, in submission order.
    pub remote: Vec<MediaItem>,
    /// Items already pushed to the transcode queue.
    pub queued_for_transcode: usize,
    /// Items whose transcode is pending, local or remote.
    pub transcode_candidates: usize,
}

#[derive(Debug, Default)]
struct StatusTable {
    batch_id: Option<Uuid>,
    order: Vec<MediaId>,
    entries: HashMap<MediaId, StatusEntry>,
}

/// Concurrency-safe status table shared by the workers of one batch.
#[derive(Debug, Default)]
pub struct StatusStore {
    table: Mutex<StatusTable>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table with a fresh one for `batch_id`.
    ///
    /// Local items needing a transcode are pushed to `queue` right away; the
    /// returned batch lists the remote items the preloader has to fetch.
    /// Duplicate ids keep their first occurrence.
    pub async fn initialize<F>(
        &self,
        batch_id: Uuid,
        items: &[MediaItem],
        requires_transcode: F,
        queue: &TranscodeQueue,
    ) -> Result<InitializedBatch, PrepareError>
    where
        F: Fn(&MediaItem) -> bool,
    {
        let mut table = self.table.lock().await;
        table.batch_id = Some(batch_id);
        table.order.clear();
        table.entries.clear();

        let mut initialized = InitializedBatch::default();
        for item in items {
            if table.entries.contains_key(&item.id) {
                tracing::warn!(
                    batch_id = %batch_id,
                    item_id = %item.id,
                    "Duplicate item in batch, keeping first occurrence"
                );
                continue;
            }

            let load = match item.locality {
                Locality::Remote => LoadStatus::Queued,
                Locality::Local => LoadStatus::Completed,
            };
            let transcode = if requires_transcode(item) {
                TranscodeStatus::Queued
            } else {
                TranscodeStatus::NotApplies
            };

            if transcode == TranscodeStatus::Queued {
                initialized.transcode_candidates += 1;
                if load == LoadStatus::Completed {
                    queue.push(item.clone())?;
                    initialized.queued_for_transcode += 1;
                }
            }
            if load == LoadStatus::Queued {
                initialized.remote.push(item.clone());
            }

            table.order.push(item.id.clone());
            table.entries.insert(
                item.id.clone(),
                StatusEntry {
                    item: item.clone(),
                    status: PrepareStatus::new(load, transcode),
                },
            );
        }

        tracing::debug!(
            batch_id = %batch_id,
            items = table.order.len(),
            remote = initialized.remote.len(),
            transcode_candidates = initialized.transcode_candidates,
            "Status table initialized"
        );

        Ok(initialized)
    }

    /// Merge `patch` into an item's status.
    ///
    /// Returns `None` if the table belongs to another batch or does not know
    /// the item.
    pub async fn update(
        &self,
        batch_id: Uuid,
        item: &MediaId,
        patch: StatusPatch,
    ) -> Option<StatusUpdate> {
        let mut table = self.table.lock().await;
        if table.batch_id != Some(batch_id) {
            return None;
        }

        let entry = table.entries.get_mut(item)?;
        let was_done = entry.status.item_done();
        entry.status.apply(patch);

        Some(StatusUpdate {
            status: entry.status,
            became_done: !was_done && entry.status.item_done(),
        })
    }

    pub async fn get(&self, item: &MediaId) -> Option<PrepareStatus> {
        let table = self.table.lock().await;
        table.entries.get(item).map(|entry| entry.status)
    }

    pub async fn snapshot(&self) -> BatchSnapshot {
        let table = self.table.lock().await;
        BatchSnapshot {
            batch_id: table.batch_id,
            entries: table
                .order
                .iter()
                .filter_map(|id| table.entries.get(id).cloned())
                .collect(),
        }
    }

    pub async fn any_failed(&self) -> bool {
        let table = self.table.lock().await;
        table.entries.values().any(|entry| entry.status.item_failed())
    }

    pub async fn all_done(&self) -> bool {
        let table = self.table.lock().await;
        table.entries.values().all(|entry| entry.status.item_done())
    }

    /// Drop the table if it still belongs to `batch_id`.
    pub async fn clear(&self, batch_id: Uuid) {
        let mut table = self.table.lock().await;
        if table.batch_id == Some(batch_id) {
            *table = StatusTable::default();
        }
    }
}

/// Consistent copy of the table, in submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchSnapshot {
    pub batch_id: Option<Uuid>,
    pub entries: Vec<StatusEntry>,
}

impl BatchSnapshot {
    pub fn any_failed(&self) -> bool {
        self.entries.iter().any(|entry| entry.status.item_failed())
    }

    pub fn all_done(&self) -> bool {
        self.entries.iter().all(|entry| entry.status.item_done())
    }

    pub fn failed_items(&self) -> Vec<MediaItem> {
        self.entries
            .iter()
            .filter(|entry| entry.status.item_failed())
            .map(|entry| entry.item.clone())
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status.item_done())
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items as they are handed back to the caller: transcoded items point at
    /// their artifact, everything else passes through unchanged.
    pub fn prepared_items(&self) -> Result<Vec<MediaItem>, PrepareError> {
        self.entries
            .iter()
            .map(|entry| match entry.status.transcode {
                TranscodeStatus::Succeeded => {
                    let locator = entry.item.locator.to_transcoded()?;
                    Ok(entry.item.with_locator(locator))
                }
                _ => Ok(entry.item.clone()),
            })
            .collect()
    }
}
