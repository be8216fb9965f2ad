//! Test helpers: fake collaborators and an orchestrator wired to them.
//!
//! Run from workspace root: `cargo test -p pickprep-worker --test prepare_test`.

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use std::sync::Arc;

use pickprep_core::{PrepareConfig, SelectionMode};
use pickprep_worker::{InMemorySelection, PrepareCollaborators, PrepareOrchestrator};

use fakes::{FakeExecutor, FakeStorage, RecordingEventSink, ScriptedChecker};

/// Orchestrator plus handles on every fake it runs against.
pub struct TestPipeline {
    pub orchestrator: Arc<PrepareOrchestrator>,
    pub storage: Arc<FakeStorage>,
    pub checker: Arc<ScriptedChecker>,
    pub executor: Arc<FakeExecutor>,
    pub selection: Arc<InMemorySelection>,
    pub events: Arc<RecordingEventSink>,
}

pub struct PipelineBuilder {
    config: PrepareConfig,
    storage: FakeStorage,
    checker: ScriptedChecker,
    executor: FakeExecutor,
    selection: Vec<pickprep_core::MediaItem>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PrepareConfig::default(),
            storage: FakeStorage::default(),
            checker: ScriptedChecker::always(true),
            executor: FakeExecutor::succeeding(),
            selection: Vec::new(),
        }
    }

    pub fn config(mut self, config: PrepareConfig) -> Self {
        self.config = config;
        self
    }

    pub fn single_select(mut self) -> Self {
        self.config.selection_mode = SelectionMode::Single;
        self
    }

    pub fn storage(mut self, storage: FakeStorage) -> Self {
        self.storage = storage;
        self
    }

    pub fn checker(mut self, checker: ScriptedChecker) -> Self {
        self.checker = checker;
        self
    }

    pub fn executor(mut self, executor: FakeExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn selected(mut self, items: &[pickprep_core::MediaItem]) -> Self {
        self.selection = items.to_vec();
        self
    }

    pub fn build(self) -> TestPipeline {
        let storage = Arc::new(self.storage);
        let checker = Arc::new(self.checker);
        let executor = Arc::new(self.executor);
        let selection = Arc::new(InMemorySelection::new(self.selection));
        let events = Arc::new(RecordingEventSink::default());

        let collaborators = PrepareCollaborators::new(
            storage.clone(),
            checker.clone(),
            executor.clone(),
            selection.clone(),
        )
        .with_events(events.clone());
        let orchestrator = PrepareOrchestrator::new(self.config, collaborators)
            .expect("valid test config");

        TestPipeline {
            orchestrator: Arc::new(orchestrator),
            storage,
            checker,
            executor,
            selection,
            events,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Await a batch outcome, failing the test instead of hanging.
pub async fn outcome_of(
    handle: &mut pickprep_worker::PrepareHandle,
) -> pickprep_worker::PrepareOutcome {
    tokio::time::timeout(std::time::Duration::from_secs(5), handle.outcome())
        .await
        .expect("batch resolved in time")
}
