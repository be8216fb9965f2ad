//! Building blocks of the `pickprep` binary: manifest loading, a copying
//! transcode executor over local storage, and the JSON outcome report.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use pickprep_core::{
    ErrorMetadata, Locator, MediaItem, TranscodeCapabilities, TranscodeExecutor, TranscodeRequest,
};
use pickprep_storage::LocalStorage;
use pickprep_worker::PrepareOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch description read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub items: Vec<MediaItem>,
    #[serde(default)]
    pub capabilities: TranscodeCapabilities,
    #[serde(default = "default_transcode")]
    pub transcode: bool,
}

fn default_transcode() -> bool {
    true
}

impl Manifest {
    pub fn transcode_request(&self) -> TranscodeRequest {
        TranscodeRequest {
            capabilities: self.capabilities.clone(),
            enabled: self.transcode,
        }
    }
}

pub async fn load_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Read manifest {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Parse manifest {}", path.display()))
}

/// Produces the transcoded artifact by copying the source to its rewritten
/// locator. Stands in for a real encoder when running against a local tree.
#[derive(Debug, Clone)]
pub struct CopyTranscoder {
    storage: LocalStorage,
}

impl CopyTranscoder {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TranscodeExecutor for CopyTranscoder {
    async fn perform_transcode(&self, locator: &Locator) -> anyhow::Result<bool> {
        let target = locator.to_transcoded()?;
        self.storage
            .copy(locator, &target)
            .await
            .with_context(|| format!("Copy {} to {}", locator, target))?;
        Ok(true)
    }
}

/// JSON shape printed for a finished batch.
#[derive(Debug, Serialize)]
pub struct OutcomeReport {
    pub batch_id: Uuid,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<MediaItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Selection left after failed items were pruned.
    pub selection: Vec<MediaItem>,
}

impl OutcomeReport {
    pub fn new(batch_id: Uuid, outcome: PrepareOutcome, selection: Vec<MediaItem>) -> Self {
        match outcome {
            PrepareOutcome::Success(items) => Self {
                batch_id,
                status: "success",
                items: Some(items),
                error_code: None,
                error: None,
                selection,
            },
            PrepareOutcome::Failure(err) => Self {
                batch_id,
                status: if err.is_cancellation() {
                    "cancelled"
                } else {
                    "failure"
                },
                items: None,
                error_code: Some(err.error_code()),
                error: Some(err.to_string()),
                selection,
            },
        }
    }
}
