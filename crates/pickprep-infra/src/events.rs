//! Telemetry sink that writes pipeline events to the tracing subscriber.

use async_trait::async_trait;
use pickprep_core::{PrepareEvent, PrepareEventKind, PrepareEventSink};

/// Reports every event as one structured `tracing` record under the
/// `pickprep::events` target.
#[derive(Debug, Default, Clone)]
pub struct TracingEventSink;

#[async_trait]
impl PrepareEventSink for TracingEventSink {
    async fn dispatch(&self, event: &PrepareEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;

        match &event.kind {
            PrepareEventKind::Failed { .. } => tracing::warn!(
                target: "pickprep::events",
                event = event.name(),
                batch_id = %event.batch_id,
                payload = %payload,
                "Preparation event"
            ),
            _ => tracing::info!(
                target: "pickprep::events",
                event = event.name(),
                batch_id = %event.batch_id,
                payload = %payload,
                "Preparation event"
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_dispatch_never_fails_for_valid_events() {
        let sink = TracingEventSink;
        let event = PrepareEvent::new(
            Uuid::new_v4(),
            PrepareEventKind::Cancelled {
                reason: "USER_CANCELLED".to_string(),
                duration_ms: 3,
            },
        );
        assert!(sink.dispatch(&event).await.is_ok());
    }
}
