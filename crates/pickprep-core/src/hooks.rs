//! Hooks into the caller of the pipeline
//!
//! The pipeline prunes the caller's selection when items fail and reports
//! lifecycle events to a telemetry sink. The caller implements these traits;
//! the pipeline never depends on how they are backed.

use async_trait::async_trait;

use crate::models::{MediaItem, PrepareEvent};

/// The caller's live selection.
#[async_trait]
pub trait Selection: Send + Sync {
    /// Remove the given items from the selection
    async fn remove_all(&self, items: &[MediaItem]);

    /// Drop every selected item
    async fn clear(&self);
}

/// Destination for pipeline telemetry.
///
/// Events are dispatched fire-and-forget: an error is logged by the pipeline
/// and never affects the batch result.
#[async_trait]
pub trait PrepareEventSink: Send + Sync {
    async fn dispatch(&self, event: &PrepareEvent) -> Result<(), String>;
}

/// No-op implementation for when telemetry is disabled
pub struct NoOpEventSink;

#[async_trait]
impl PrepareEventSink for NoOpEventSink {
    async fn dispatch(&self, _event: &PrepareEvent) -> Result<(), String> {
        Ok(())
    }
}
