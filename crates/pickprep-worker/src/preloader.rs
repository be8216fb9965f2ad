//! Bounded preloader pool for remote items.
//!
//! Each remote item gets exactly one `open` attempt through the storage
//! accessor. At most `concurrency` attempts are in flight; the pool stops
//! starting new attempts once the batch is cancelled or any item has failed.

use std::sync::Arc;
use std::time::Duration;

use pickprep_core::{LoadStatus, MediaItem, PrepareError, StatusPatch, TranscodeStatus};
use pickprep_storage::{Storage, StorageError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::batch::BatchShared;

pub(crate) struct Preloader {
    shared: Arc<BatchShared>,
    storage: Arc<dyn Storage>,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl Preloader {
    pub(crate) fn new(
        shared: Arc<BatchShared>,
        storage: Arc<dyn Storage>,
        concurrency: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            shared,
            storage,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    #[tracing::instrument(skip_all, fields(batch_id = %self.shared.batch_id))]
    pub(crate) async fn run(self, items: Vec<MediaItem>, cancel: CancellationToken) {
        let batch_id = self.shared.batch_id;
        tracing::debug!(
            batch_id = %batch_id,
            items = items.len(),
            concurrency = self.concurrency,
            backend = self.storage.backend_name(),
            "Preloader started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();
        let mut started = 0usize;

        for item in items {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            if cancel.is_cancelled() {
                break;
            }
            if self.shared.has_failed() {
                tracing::debug!(
                    batch_id = %batch_id,
                    item_id = %item.id,
                    "Batch already failed, not starting further preloads"
                );
                break;
            }

            let shared = self.shared.clone();
            let storage = self.storage.clone();
            let cancel = cancel.clone();
            let timeout = self.timeout;
            started += 1;
            workers.spawn(async move {
                let _permit = permit;
                preload_one(&shared, storage.as_ref(), item, timeout, &cancel).await;
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(batch_id = %batch_id, error = %e, "Preload task panicked");
            }
        }

        tracing::debug!(batch_id = %batch_id, started, "Preloader stopped");
    }
}

async fn preload_one(
    shared: &BatchShared,
    storage: &dyn Storage,
    item: MediaItem,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) {
    let start = std::time::Instant::now();
    let attempt = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, storage.open(&item.locator))
                .await
                .unwrap_or_else(|_| {
                    Err(StorageError::ReadFailed(format!(
                        "timed out after {}s",
                        limit.as_secs()
                    )))
                }),
            None => storage.open(&item.locator).await,
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(batch_id = %shared.batch_id, item_id = %item.id, "Preload abandoned on cancellation");
            return;
        }
        result = attempt => result,
    };

    match result {
        Ok(size) => {
            tracing::debug!(
                batch_id = %shared.batch_id,
                item_id = %item.id,
                size_bytes = size,
                duration_ms = start.elapsed().as_millis() as u64,
                "Preload completed"
            );

            let update = shared
                .record(&item.id, StatusPatch::load(LoadStatus::Completed), None)
                .await;
            if let Some(update) = update {
                if update.status.transcode == TranscodeStatus::Queued {
                    if let Err(err) = shared.queue.push(item.clone()) {
                        shared
                            .record(
                                &item.id,
                                StatusPatch::transcode(TranscodeStatus::Failed),
                                Some(err),
                            )
                            .await;
                    }
                }
            }
        }
        Err(e) => {
            let err = match e {
                StorageError::NotFound(_) => PrepareError::PreloadNotFound {
                    item: item.id.clone(),
                },
                other => PrepareError::PreloadFailed {
                    item: item.id.clone(),
                    message: other.to_string(),
                },
            };
            shared
                .record(&item.id, StatusPatch::load(LoadStatus::Failed), Some(err))
                .await;
        }
    }

    shared.heartbeat.beat();
}
