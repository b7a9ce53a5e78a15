//! Vignette Storage Library
//!
//! This crate provides the asset store abstraction the preview pipeline writes
//! generated previews into, plus in-memory, local filesystem and Postgres backends.
//!
//! # Storage key format
//!
//! Every backend lays assets out the same way: `{collection_id}/{asset_id}/{filename}`,
//! where `filename` is sanitized for use as a single path segment. Key generation is
//! centralized in the `keys` module so all backends stay consistent.
//!
//! # Collections
//!
//! `get_or_create_collection` must be safe to race. Collection ids are derived from the
//! collection name, and each backend makes creation idempotent at the storage layer
//! (an exclusive hard link on disk, `ON CONFLICT` in Postgres and a single lock in memory).

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-postgres")]
pub mod postgres;
pub mod traits;

// Re-export commonly used types
pub use factory::create_asset_store;
#[cfg(feature = "storage-local")]
pub use local::LocalAssetStore;
pub use memory::InMemoryAssetStore;
#[cfg(feature = "storage-postgres")]
pub use postgres::PgAssetStore;
pub use traits::{AssetStore, StorageError, StorageResult};
pub use vignette_core::StorageBackend;
