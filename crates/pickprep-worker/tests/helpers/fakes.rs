//! Fake collaborators with call accounting.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pickprep_core::{
    Locator, MediaId, MediaItem, PrepareEvent, PrepareEventSink, TranscodeCapabilities,
    TranscodeCapabilityChecker, TranscodeExecutor,
};
use pickprep_storage::{Storage, StorageError, StorageResult};

/// Storage that records every open and can be scripted to miss or stall.
#[derive(Default)]
pub struct FakeStorage {
    missing: HashSet<String>,
    delay: Duration,
    opens: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeStorage {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Report `NotFound` for the item whose locator ends in `/{id}`.
    pub fn missing(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn open(&self, locator: &Locator) -> StorageResult<u64> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let id = locator.segments().last().cloned().unwrap_or_default();
        if self.missing.contains(&id) {
            return Err(StorageError::NotFound(locator.to_string()));
        }
        Ok(1024)
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

/// Capability checker answering from a fixed rule.
pub struct ScriptedChecker {
    required: Option<HashSet<MediaId>>,
    default: bool,
    calls: AtomicUsize,
}

impl ScriptedChecker {
    pub fn always(required: bool) -> Self {
        Self {
            required: None,
            default: required,
            calls: AtomicUsize::new(0),
        }
    }

    /// Transcode required only for the listed ids.
    pub fn only(ids: &[&str]) -> Self {
        Self {
            required: Some(ids.iter().map(|id| MediaId::new(*id)).collect()),
            default: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscodeCapabilityChecker for ScriptedChecker {
    async fn is_transcode_required(
        &self,
        _capabilities: &TranscodeCapabilities,
        item: &MediaItem,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.required {
            Some(ids) => ids.contains(&item.id),
            None => self.default,
        }
    }
}

pub enum ExecutorScript {
    Succeed,
    ReportFailure,
    Error,
}

/// Executor that records the locators it was asked to transcode.
pub struct FakeExecutor {
    script: ExecutorScript,
    delay: Duration,
    calls: Mutex<Vec<Locator>>,
}

impl FakeExecutor {
    pub fn succeeding() -> Self {
        Self::scripted(ExecutorScript::Succeed)
    }

    pub fn scripted(script: ExecutorScript) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds after stalling for `delay` on every call.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::succeeding()
        }
    }

    pub fn calls(&self) -> Vec<Locator> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscodeExecutor for FakeExecutor {
    async fn perform_transcode(&self, locator: &Locator) -> anyhow::Result<bool> {
        self.calls.lock().unwrap().push(locator.clone());
        tokio::time::sleep(self.delay).await;
        match self.script {
            ExecutorScript::Succeed => Ok(true),
            ExecutorScript::ReportFailure => Ok(false),
            ExecutorScript::Error => Err(anyhow::anyhow!("codec unavailable")),
        }
    }
}

/// Collects every dispatched event.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<PrepareEvent>>,
}

impl RecordingEventSink {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    /// Wait briefly for fire-and-forget dispatches to land.
    pub async fn wait_for(&self, name: &str) -> bool {
        for _ in 0..100 {
            if self.names().iter().any(|n| *n == name) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

#[async_trait]
impl PrepareEventSink for RecordingEventSink {
    async fn dispatch(&self, event: &PrepareEvent) -> Result<(), String> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
