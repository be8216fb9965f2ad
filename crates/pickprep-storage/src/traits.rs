//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use pickprep_core::Locator;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The preloader opens every remote item exactly once through this trait. A
/// successful `open` guarantees the item is locally resolvable afterwards.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open and read the resource behind `locator`, returning the bytes read.
    ///
    /// Returns [`StorageError::NotFound`] when the resource cannot be resolved.
    async fn open(&self, locator: &Locator) -> StorageResult<u64>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
