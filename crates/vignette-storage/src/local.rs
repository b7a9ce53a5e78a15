use crate::keys::generate_storage_key;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use vignette_core::{AssetRef, CollectionRef};

/// File inside a collection directory that records the collection's name.
const COLLECTION_MARKER: &str = "collection.json";

/// Local filesystem asset store
///
/// Layout under `base_path`:
/// - `{collection_id}/collection.json` - collection record
/// - `{collection_id}/{asset_id}/{filename}` - asset content
#[derive(Clone)]
pub struct LocalAssetStore {
    base_path: PathBuf,
}

impl LocalAssetStore {
    /// Create a new LocalAssetStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored assets (e.g., "/var/lib/vignette/previews")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalAssetStore { base_path })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys that could escape the base storage directory. Dots inside a
    /// file name are fine; only `..` as a whole path component is refused.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(storage_key);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(relative))
    }

    fn collection_dir(&self, collection_id: Uuid) -> PathBuf {
        self.base_path.join(collection_id.to_string())
    }

    async fn read_collection(&self, marker: &Path) -> StorageResult<CollectionRef> {
        let raw = fs::read(marker).await?;
        serde_json::from_slice(&raw).map_err(|e| {
            StorageError::BackendError(format!(
                "Corrupt collection record {}: {}",
                marker.display(),
                e
            ))
        })
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Get or create the collection `name`, reporting whether this call created it.
    async fn ensure_collection(&self, name: &str) -> StorageResult<(CollectionRef, bool)> {
        if name.trim().is_empty() {
            return Err(StorageError::CollectionFailed(
                "Collection name must not be empty".to_string(),
            ));
        }

        let collection = CollectionRef::named(name);
        let dir = self.collection_dir(collection.id);
        let marker = dir.join(COLLECTION_MARKER);

        if fs::try_exists(&marker).await.unwrap_or(false) {
            return Ok((self.read_collection(&marker).await?, false));
        }

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::CollectionFailed(format!(
                "Failed to create collection directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        // Write the record under a private name, then hard-link it into place. The
        // link fails if the marker already exists, so exactly one racer creates it.
        let staging = dir.join(format!("{}.{}.tmp", COLLECTION_MARKER, Uuid::new_v4()));
        let record = serde_json::to_vec(&collection)
            .map_err(|e| StorageError::CollectionFailed(e.to_string()))?;
        fs::write(&staging, &record).await?;

        let linked = fs::hard_link(&staging, &marker).await;
        let _ = fs::remove_file(&staging).await;

        match linked {
            Ok(()) => {
                tracing::info!(
                    collection = %name,
                    collection_id = %collection.id,
                    path = %dir.display(),
                    "Created collection"
                );
                Ok((collection, true))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Ok((self.read_collection(&marker).await?, false))
            }
            Err(e) => Err(StorageError::CollectionFailed(format!(
                "Failed to record collection {}: {}",
                name, e
            ))),
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    #[tracing::instrument(skip(self), fields(storage.backend = "local"))]
    async fn get_or_create_collection(&self, name: &str) -> StorageResult<CollectionRef> {
        let (collection, _created) = self.ensure_collection(name).await?;
        Ok(collection)
    }

    #[tracing::instrument(skip(self, data, collection), fields(storage.backend = "local", collection = %collection.name, size_bytes = data.len()))]
    async fn create_asset(
        &self,
        data: Bytes,
        filename: &str,
        collection: &CollectionRef,
    ) -> StorageResult<AssetRef> {
        let marker = self.collection_dir(collection.id).join(COLLECTION_MARKER);
        if !fs::try_exists(&marker).await.unwrap_or(false) {
            return Err(StorageError::CollectionFailed(format!(
                "Unknown collection: {}",
                collection.name
            )));
        }

        let id = Uuid::new_v4();
        let key = generate_storage_key(collection.id, id, filename);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local asset store upload successful"
        );

        Ok(AssetRef {
            id,
            collection_id: collection.id,
            filename: filename.to_string(),
            storage_key: key,
            size_bytes: size as u64,
            created_at: Utc::now(),
        })
    }

    async fn read_asset(&self, asset: &AssetRef) -> StorageResult<Bytes> {
        let path = self.key_to_path(&asset.storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(asset.storage_key.clone()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn collections(&self) -> StorageResult<Vec<CollectionRef>> {
        let mut collections = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let marker = entry.path().join(COLLECTION_MARKER);
            if fs::try_exists(&marker).await.unwrap_or(false) {
                collections.push(self.read_collection(&marker).await?);
            }
        }

        Ok(collections)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
