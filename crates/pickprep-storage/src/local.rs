use crate::keys::storage_key;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use pickprep_core::Locator;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding the media tree (e.g., "/var/lib/pickprep")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Every key component must be a plain name, so a key can never escape the
    /// base storage directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains invalid components: {}",
                key
            )));
        }

        Ok(self.base_path.join(relative))
    }

    /// Filesystem path backing `locator`.
    pub fn path_for(&self, locator: &Locator) -> StorageResult<PathBuf> {
        self.key_to_path(&storage_key(locator))
    }

    /// Copy the resource at `from` to `to`, returning the bytes copied.
    pub async fn copy(&self, from: &Locator, to: &Locator) -> StorageResult<u64> {
        let from_path = self.path_for(from)?;
        let to_path = self.path_for(to)?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(from.to_string()));
        }

        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let copied = fs::copy(&from_path, &to_path).await.map_err(|e| {
            StorageError::ReadFailed(format!(
                "Failed to copy {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        tracing::info!(
            from = %from,
            to = %to,
            size_bytes = copied,
            "Local storage copy successful"
        );

        Ok(copied)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn open(&self, locator: &Locator) -> StorageResult<u64> {
        let path = self.path_for(locator)?;
        let start = std::time::Instant::now();

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(locator.to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut stream = tokio_util::io::ReaderStream::new(file);
        let mut size: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                StorageError::ReadFailed(format!("Failed to read chunk of {}: {}", path.display(), e))
            })?;
            size += chunk.len() as u64;
        }

        tracing::debug!(
            path = %path.display(),
            locator = %locator,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage open successful"
        );

        Ok(size)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
