use crate::{LocalStorage, Storage, StorageError, StorageResult};
use pickprep_core::PrepareConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &PrepareConfig) -> StorageResult<Arc<dyn Storage>> {
    let base_path = config.storage_root.clone().ok_or_else(|| {
        StorageError::ConfigError("PICKPREP_STORAGE_ROOT not configured".to_string())
    })?;

    let storage = LocalStorage::new(base_path).await?;
    tracing::info!(
        backend = storage.backend_name(),
        base_path = %storage.base_path().display(),
        "Storage initialized"
    );
    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_storage_requires_root() {
        let config = PrepareConfig::default();
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_create_storage_local() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrepareConfig {
            storage_root: Some(dir.path().display().to_string()),
            ..PrepareConfig::default()
        };
        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_name(), "local");
    }
}
