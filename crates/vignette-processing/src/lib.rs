//! Vignette Preview Processing Library
//!
//! This crate turns uploaded files into small JPEG previews. PDFs are rendered with
//! `pdftocairo`, everything else goes through ImageMagick `convert`, and the result
//! is stored as a derived asset in the shared preview collection.

pub mod converter;
pub mod download;
pub mod error;
pub mod orchestrator;
pub mod tools;

// Re-export commonly used types
pub use converter::{ConversionStrategy, ExternalConverter, PreviewConverter};
pub use download::{attach_preview, prepare_download, regenerate_preview, SaveOutcome};
pub use error::{FaultKind, PreviewError};
pub use orchestrator::PreviewOrchestrator;
pub use tools::{check_tools, ToolCheck};
