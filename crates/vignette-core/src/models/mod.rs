//! Domain models for preview generation.

pub mod asset;
pub mod download;
pub mod preview;
pub mod source;

pub use asset::{AssetRef, CollectionRef, DerivedAsset};
pub use download::{Download, FileRef};
pub use preview::{PreviewRequest, PreviewResult};
pub use source::{basename, extension_of, InMemorySourceFile, LocalSourceFile, SourceFile, SourceReader};
