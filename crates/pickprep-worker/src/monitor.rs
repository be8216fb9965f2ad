//! Convergence monitor.
//!
//! Wakes on every heartbeat, re-derives the batch state from one snapshot of
//! the status table and resolves the batch once it has failed or converged.

use std::sync::Arc;

use pickprep_core::{PrepareError, Selection};
use tokio_util::sync::CancellationToken;

use crate::batch::BatchShared;
use crate::heartbeat::HeartbeatListener;
use crate::outcome::PrepareOutcome;

pub(crate) struct Monitor {
    shared: Arc<BatchShared>,
    listener: HeartbeatListener,
    selection: Arc<dyn Selection>,
    /// Batch scope; cancelled once the result is set so every sibling stops.
    scope: CancellationToken,
}

/// What one check decided.
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Pending,
    Resolved,
    Stale,
}

impl Monitor {
    pub(crate) fn new(
        shared: Arc<BatchShared>,
        listener: HeartbeatListener,
        selection: Arc<dyn Selection>,
        scope: CancellationToken,
    ) -> Self {
        Self {
            shared,
            listener,
            selection,
            scope,
        }
    }

    #[tracing::instrument(skip_all, fields(batch_id = %self.shared.batch_id))]
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        let batch_id = self.shared.batch_id;
        tracing::debug!(batch_id = %batch_id, "Convergence monitor started");

        // Catch a batch that converged before the monitor subscribed.
        self.shared.heartbeat.beat();

        loop {
            let alive = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                alive = self.listener.next() => alive,
            };
            if !alive {
                break;
            }

            match self.check().await {
                Verdict::Pending => continue,
                Verdict::Resolved => {
                    self.scope.cancel();
                    break;
                }
                Verdict::Stale => {
                    tracing::debug!(batch_id = %batch_id, "Status table moved to another batch");
                    break;
                }
            }
        }

        self.listener.close();
        tracing::debug!(batch_id = %batch_id, "Convergence monitor stopped");
    }

    async fn check(&self) -> Verdict {
        let snapshot = self.shared.store.snapshot().await;
        if snapshot.batch_id != Some(self.shared.batch_id) {
            return Verdict::Stale;
        }

        if snapshot.any_failed() {
            if self.shared.result.is_resolved() {
                return Verdict::Resolved;
            }

            let failed = snapshot.failed_items();
            self.selection.remove_all(&failed).await;
            tracing::warn!(
                batch_id = %self.shared.batch_id,
                failed = failed.len(),
                total = snapshot.len(),
                "Batch preparation failed, pruned failed items from selection"
            );
            self.shared
                .resolve(PrepareOutcome::Failure(PrepareError::ItemsFailed {
                    items: failed.into_iter().map(|item| item.id).collect(),
                }));
            return Verdict::Resolved;
        }

        if snapshot.all_done() {
            let outcome = match snapshot.prepared_items() {
                Ok(items) => {
                    tracing::info!(
                        batch_id = %self.shared.batch_id,
                        items = items.len(),
                        "Batch preparation succeeded"
                    );
                    PrepareOutcome::Success(items)
                }
                Err(err) => {
                    tracing::error!(
                        batch_id = %self.shared.batch_id,
                        error = %err,
                        "Failed to rewrite transcoded locator"
                    );
                    PrepareOutcome::Failure(err)
                }
            };
            self.shared.resolve(outcome);
            return Verdict::Resolved;
        }

        tracing::trace!(
            batch_id = %self.shared.batch_id,
            completed = snapshot.completed_count(),
            total = snapshot.len(),
            "Batch still preparing"
        );
        Verdict::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heartbeat::heartbeat;
    use crate::outcome::ResultSlot;
    use crate::selection::InMemorySelection;
    use crate::status_store::StatusStore;
    use crate::transcode::transcode_queue;
    use pickprep_core::{
        LoadStatus, Locality, Locator, MediaId, MediaItem, MediaKind, NoOpEventSink, Progress,
        StatusPatch,
    };
    use tokio::sync::watch;
    use uuid::Uuid;

    fn remote(id: &str) -> MediaItem {
        let locator: Locator = format!("content://media/picker/0/cloud/media/{}", id)
            .parse()
            .unwrap();
        MediaItem::new(id, MediaKind::Image, Locality::Remote, locator)
    }

    struct Fixture {
        shared: Arc<BatchShared>,
        selection: Arc<InMemorySelection>,
        outcome: watch::Receiver<Option<PrepareOutcome>>,
        scope: CancellationToken,
        task: tokio::task::JoinHandle<()>,
    }

    async fn start(items: Vec<MediaItem>) -> Fixture {
        let batch_id = Uuid::new_v4();
        let store = Arc::new(StatusStore::new());
        let (queue, _rx) = transcode_queue(items.len());
        store
            .initialize(batch_id, &items, |_| false, &queue)
            .await
            .unwrap();
        let (beat, listener) = heartbeat();
        let (result, outcome) = ResultSlot::new();
        let (progress, _) = watch::channel(Progress::new(0, items.len()));
        let shared = Arc::new(BatchShared::new(
            batch_id,
            store,
            beat,
            queue,
            result,
            progress,
            Arc::new(NoOpEventSink),
        ));
        let selection = Arc::new(InMemorySelection::new(items));
        let scope = CancellationToken::new();
        let monitor = Monitor::new(shared.clone(), listener, selection.clone(), scope.clone());
        let task = tokio::spawn(monitor.run(scope.child_token()));

        Fixture {
            shared,
            selection,
            outcome,
            scope,
            task,
        }
    }

    async fn set_load(shared: &BatchShared, id: &str, load: LoadStatus) {
        shared
            .record(&MediaId::new(id), StatusPatch::load(load), None)
            .await
            .unwrap();
        shared.heartbeat.beat();
    }

    #[tokio::test]
    async fn test_resolves_success_once_all_done() {
        let mut fixture = start(vec![remote("a"), remote("b")]).await;

        set_load(&fixture.shared, "a", LoadStatus::Completed).await;
        set_load(&fixture.shared, "b", LoadStatus::Completed).await;

        let outcome = fixture.outcome.wait_for(|o| o.is_some()).await.unwrap().clone();
        assert!(outcome.unwrap().is_success());
        fixture.task.await.unwrap();
        assert!(fixture.scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_failure_prunes_exactly_failed_items() {
        let mut fixture = start(vec![remote("a"), remote("b"), remote("c")]).await;

        set_load(&fixture.shared, "a", LoadStatus::Completed).await;
        set_load(&fixture.shared, "b", LoadStatus::Failed).await;

        let outcome = fixture.outcome.wait_for(|o| o.is_some()).await.unwrap().clone();
        assert_eq!(
            outcome,
            Some(PrepareOutcome::Failure(PrepareError::ItemsFailed {
                items: vec![MediaId::new("b")]
            }))
        );
        fixture.task.await.unwrap();

        assert!(!fixture.selection.contains(&MediaId::new("b")).await);
        assert!(fixture.selection.contains(&MediaId::new("a")).await);
        assert!(fixture.selection.contains(&MediaId::new("c")).await);
    }

    #[tokio::test]
    async fn test_exits_on_cancellation_without_resolving() {
        let fixture = start(vec![remote("a")]).await;
        fixture.scope.cancel();
        fixture.task.await.unwrap();
        assert!(fixture.outcome.borrow().is_none());
    }

    #[tokio::test]
    async fn test_stale_table_stops_monitor() {
        let fixture = start(vec![remote("a")]).await;
        let (queue, _rx) = transcode_queue(1);
        fixture
            .shared
            .store
            .initialize(Uuid::new_v4(), &[remote("z")], |_| false, &queue)
            .await
            .unwrap();
        fixture.shared.heartbeat.beat();

        fixture.task.await.unwrap();
        assert!(fixture.outcome.borrow().is_none());
    }
}
