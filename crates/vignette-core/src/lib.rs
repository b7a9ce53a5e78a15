//! Vignette Core Library
//!
//! This crate provides the domain models, configuration and shared error metadata
//! used by the preview pipeline and its storage backends.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::PreviewConfig;
pub use error::{ErrorMetadata, LogLevel};
pub use models::preview::preview_filename;
pub use models::{
    AssetRef, CollectionRef, DerivedAsset, Download, FileRef, InMemorySourceFile,
    LocalSourceFile, PreviewRequest, PreviewResult, SourceFile, SourceReader,
};
pub use storage_types::StorageBackend;
