//! Transcoding capability and execution traits.
//!
//! The requesting application declares which formats it can consume
//! ([`TranscodeCapabilities`]). The pipeline hands that descriptor, untouched,
//! to a [`TranscodeCapabilityChecker`] for every candidate and, when
//! conversion is needed, asks a [`TranscodeExecutor`] to produce the artifact.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::models::MediaItem;

/// Formats the requesting application can consume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeCapabilities {
    #[serde(default)]
    pub supported_video_mime_types: Vec<String>,
    #[serde(default)]
    pub supported_hdr_types: Vec<String>,
}

/// Per-batch transcoding request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeRequest {
    pub capabilities: TranscodeCapabilities,
    pub enabled: bool,
}

impl TranscodeRequest {
    pub fn enabled(capabilities: TranscodeCapabilities) -> Self {
        Self {
            capabilities,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Decides whether an item must be converted for the requesting application.
#[async_trait]
pub trait TranscodeCapabilityChecker: Send + Sync {
    async fn is_transcode_required(
        &self,
        capabilities: &TranscodeCapabilities,
        item: &MediaItem,
    ) -> bool;
}

/// Produces the transcoded artifact for an item.
#[async_trait]
pub trait TranscodeExecutor: Send + Sync {
    /// Returns `Ok(true)` once the artifact is available at the rewritten locator.
    async fn perform_transcode(&self, locator: &Locator) -> anyhow::Result<bool>;
}
