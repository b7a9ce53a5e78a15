//! Asset store abstraction trait
//!
//! This module defines the capability the preview pipeline needs from an asset store.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use vignette_core::{AssetRef, CollectionRef, ErrorMetadata, LogLevel};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Collection failed: {0}")]
    CollectionFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "storage-postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorMetadata for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::CollectionFailed(_) => "COLLECTION_ERROR",
            StorageError::UploadFailed(_) => "UPLOAD_ERROR",
            StorageError::NotFound(_) => "NOT_FOUND",
            StorageError::InvalidKey(_) => "INVALID_KEY",
            StorageError::BackendError(_) | StorageError::IoError(_) => "STORAGE_ERROR",
            #[cfg(feature = "storage-postgres")]
            StorageError::Database(_) => "DATABASE_ERROR",
            StorageError::ConfigError(_) => "CONFIGURATION_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            StorageError::InvalidKey(_) | StorageError::ConfigError(_) => false,
            StorageError::NotFound(_) => false,
            _ => true,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StorageError::NotFound(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Asset store trait
///
/// The preview pipeline never talks to a concrete backend. It receives an
/// `Arc<dyn AssetStore>` and only ever creates collections and assets through it.
/// Deleting assets is left to the store's own retention policy.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Return the collection called `name`, creating it if it does not exist yet.
    ///
    /// Must be idempotent under concurrent callers: however many tasks race on the
    /// same name, exactly one collection exists afterwards and all of them get it.
    async fn get_or_create_collection(&self, name: &str) -> StorageResult<CollectionRef>;

    /// Store `data` as a new asset named `filename` inside `collection`.
    async fn create_asset(
        &self,
        data: Bytes,
        filename: &str,
        collection: &CollectionRef,
    ) -> StorageResult<AssetRef>;

    /// Read back the content of a stored asset
    async fn read_asset(&self, asset: &AssetRef) -> StorageResult<Bytes>;

    /// List every collection the store knows about
    async fn collections(&self) -> StorageResult<Vec<CollectionRef>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
