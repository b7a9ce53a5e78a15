#[cfg(feature = "storage-local")]
use crate::LocalAssetStore;
#[cfg(feature = "storage-postgres")]
use crate::PgAssetStore;
use crate::{AssetStore, InMemoryAssetStore, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use vignette_core::PreviewConfig;

/// Create an asset store based on configuration
pub async fn create_asset_store(config: &PreviewConfig) -> StorageResult<Arc<dyn AssetStore>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let store = LocalAssetStore::new(config.local_storage_path.clone()).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => Ok(Arc::new(InMemoryAssetStore::new())),

        #[cfg(feature = "storage-postgres")]
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StorageError::ConfigError("DATABASE_URL not configured".to_string())
            })?;
            let store = PgAssetStore::connect(url).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-postgres"))]
        StorageBackend::Postgres => Err(StorageError::ConfigError(
            "Postgres storage backend not available (storage-postgres feature not enabled)"
                .to_string(),
        )),
    }
}
