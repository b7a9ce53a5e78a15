//! In-memory asset store, used by tests and the `memory` backend.

use crate::keys::generate_storage_key;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;
use vignette_core::{AssetRef, CollectionRef};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, CollectionRef>,
    assets: HashMap<Uuid, (AssetRef, Bytes)>,
    collection_creates: usize,
}

/// Asset store that keeps everything in process memory
#[derive(Default)]
pub struct InMemoryAssetStore {
    inner: Mutex<Inner>,
    fail_uploads: AtomicBool,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent `create_asset` fail with `UploadFailed`.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn asset_count(&self) -> usize {
        self.lock().assets.len()
    }

    /// Number of times a collection was actually created, not merely fetched
    pub fn collection_creates(&self) -> usize {
        self.lock().collection_creates
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn get_or_create_collection(&self, name: &str) -> StorageResult<CollectionRef> {
        if name.trim().is_empty() {
            return Err(StorageError::CollectionFailed(
                "Collection name must not be empty".to_string(),
            ));
        }

        let mut inner = self.lock();
        if let Some(existing) = inner.collections.get(name) {
            return Ok(existing.clone());
        }

        let collection = CollectionRef::named(name);
        inner
            .collections
            .insert(name.to_string(), collection.clone());
        inner.collection_creates += 1;

        tracing::debug!(collection = %name, collection_id = %collection.id, "Created collection");
        Ok(collection)
    }

    async fn create_asset(
        &self,
        data: Bytes,
        filename: &str,
        collection: &CollectionRef,
    ) -> StorageResult<AssetRef> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(format!(
                "In-memory store rejected {}",
                filename
            )));
        }

        let mut inner = self.lock();
        if !inner.collections.contains_key(&collection.name) {
            return Err(StorageError::CollectionFailed(format!(
                "Unknown collection: {}",
                collection.name
            )));
        }

        let id = Uuid::new_v4();
        let asset = AssetRef {
            id,
            collection_id: collection.id,
            filename: filename.to_string(),
            storage_key: generate_storage_key(collection.id, id, filename),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        };
        inner.assets.insert(id, (asset.clone(), data));

        Ok(asset)
    }

    async fn read_asset(&self, asset: &AssetRef) -> StorageResult<Bytes> {
        self.lock()
            .assets
            .get(&asset.id)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StorageError::NotFound(asset.storage_key.clone()))
    }

    async fn collections(&self) -> StorageResult<Vec<CollectionRef>> {
        Ok(self.lock().collections.values().cloned().collect())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
