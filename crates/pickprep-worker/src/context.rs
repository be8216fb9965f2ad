//! Collaborators a batch runs against.
//!
//! The caller wires these once; every batch started by the orchestrator shares
//! them.

use std::sync::Arc;

use pickprep_core::{
    NoOpEventSink, PrepareEventSink, Selection, TranscodeCapabilityChecker, TranscodeExecutor,
};
use pickprep_storage::Storage;

#[derive(Clone)]
pub struct PrepareCollaborators {
    pub storage: Arc<dyn Storage>,
    pub capability_checker: Arc<dyn TranscodeCapabilityChecker>,
    pub executor: Arc<dyn TranscodeExecutor>,
    pub selection: Arc<dyn Selection>,
    pub events: Arc<dyn PrepareEventSink>,
}

impl PrepareCollaborators {
    /// Collaborators with telemetry disabled.
    pub fn new(
        storage: Arc<dyn Storage>,
        capability_checker: Arc<dyn TranscodeCapabilityChecker>,
        executor: Arc<dyn TranscodeExecutor>,
        selection: Arc<dyn Selection>,
    ) -> Self {
        Self {
            storage,
            capability_checker,
            executor,
            selection,
            events: Arc::new(NoOpEventSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn PrepareEventSink>) -> Self {
        self.events = events;
        self
    }
}
