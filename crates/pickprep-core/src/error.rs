//! Error types module
//!
//! This module provides the error taxonomy of the preparation pipeline. Per-item
//! failures (preload, transcode) are recorded where they happen; the batch as a
//! whole resolves with [`PrepareError::ItemsFailed`] or one of the cancellation
//! reasons.

use crate::locator::LocatorError;
use crate::models::{MediaId, MediaKind};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like user cancellation
    Debug,
    /// Warning level - for per-item failures the batch absorbs
    Warn,
    /// Error level - for invariant violations and unexpected failures
    Error,
}

/// Static description of an error, used when logging and reporting it.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "PRELOAD_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is a cancellation rather than a failure
    fn is_cancellation(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareError {
    #[error("Remote item {item} could not be resolved")]
    PreloadNotFound { item: MediaId },

    #[error("Preload of {item} failed: {message}")]
    PreloadFailed { item: MediaId, message: String },

    #[error("Transcode scheduled for {item} of unsupported kind {kind}")]
    TranscodeUnsupportedKind { item: MediaId, kind: MediaKind },

    #[error("Transcode of {item} failed: {message}")]
    TranscodeExecutionFailed { item: MediaId, message: String },

    #[error("No transcoded locator for {item}: {reason}")]
    TranscodeTargetInvalid { item: MediaId, reason: LocatorError },

    #[error("{} item(s) could not be prepared", items.len())]
    ItemsFailed { items: Vec<MediaId> },

    #[error("Invalid locator: {0}")]
    InvalidLocator(#[from] LocatorError),

    #[error("Preparation cancelled by the user")]
    UserCancelled,

    #[error("Preparation cancelled because the storage context changed")]
    ContextChanged,

    #[error("Preparation superseded by a newer batch")]
    Superseded,

    #[error("Batch of {size} items exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Transcode queue closed")]
    QueueClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Static metadata for each variant: (error_code, cancellation, log_level).
fn prepare_error_static_metadata(err: &PrepareError) -> (&'static str, bool, LogLevel) {
    match err {
        PrepareError::PreloadNotFound { .. } => ("PRELOAD_NOT_FOUND", false, LogLevel::Warn),
        PrepareError::PreloadFailed { .. } => ("PRELOAD_FAILED", false, LogLevel::Warn),
        PrepareError::TranscodeUnsupportedKind { .. } => {
            ("TRANSCODE_UNSUPPORTED_KIND", false, LogLevel::Error)
        }
        PrepareError::TranscodeExecutionFailed { .. } => {
            ("TRANSCODE_EXECUTION_FAILED", false, LogLevel::Warn)
        }
        PrepareError::TranscodeTargetInvalid { .. } => {
            ("TRANSCODE_TARGET_INVALID", false, LogLevel::Error)
        }
        PrepareError::ItemsFailed { .. } => ("ITEMS_FAILED", false, LogLevel::Warn),
        PrepareError::InvalidLocator(_) => ("INVALID_LOCATOR", false, LogLevel::Error),
        PrepareError::UserCancelled => ("USER_CANCELLED", true, LogLevel::Debug),
        PrepareError::ContextChanged => ("CONTEXT_CHANGED", true, LogLevel::Debug),
        PrepareError::Superseded => ("SUPERSEDED", true, LogLevel::Debug),
        PrepareError::BatchTooLarge { .. } => ("BATCH_TOO_LARGE", false, LogLevel::Debug),
        PrepareError::QueueClosed => ("QUEUE_CLOSED", false, LogLevel::Error),
        PrepareError::Config(_) => ("CONFIG_ERROR", false, LogLevel::Error),
    }
}

impl ErrorMetadata for PrepareError {
    fn error_code(&self) -> &'static str {
        prepare_error_static_metadata(self).0
    }

    fn is_cancellation(&self) -> bool {
        prepare_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        prepare_error_static_metadata(self).2
    }
}

impl PrepareError {
    /// The item this error is about, for per-item failures.
    pub fn item(&self) -> Option<&MediaId> {
        match self {
            PrepareError::PreloadNotFound { item }
            | PrepareError::PreloadFailed { item, .. }
            | PrepareError::TranscodeUnsupportedKind { item, .. }
            | PrepareError::TranscodeExecutionFailed { item, .. }
            | PrepareError::TranscodeTargetInvalid { item, .. } => Some(item),
            _ => None,
        }
    }
}
