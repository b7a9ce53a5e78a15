//! Errors raised by the preview pipeline.
//!
//! A conversion tool declining to render a file is not an error; it comes back as
//! `PreviewResult::NotApplicable`. Everything here is a fault the caller must see.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use vignette_core::{ErrorMetadata, LogLevel};
use vignette_storage::StorageError;

/// Broad classification of a [`PreviewError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Temp files, process spawning, output reading, timeouts
    Infrastructure,
    /// The asset store refused or failed a write
    Storage,
    /// The pipeline was built with an unusable configuration
    Configuration,
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to create temporary {what}: {source}")]
    TempResource {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy source file {name} to scratch storage: {source}")]
    Materialize {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("Failed to read preview output {}: {source}", .path.display())]
    OutputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl PreviewError {
    pub fn kind(&self) -> FaultKind {
        match self {
            PreviewError::Storage(_) => FaultKind::Storage,
            PreviewError::Configuration(_) => FaultKind::Configuration,
            _ => FaultKind::Infrastructure,
        }
    }
}

impl ErrorMetadata for PreviewError {
    fn error_code(&self) -> &'static str {
        match self {
            PreviewError::TempResource { .. } => "TEMP_RESOURCE_ERROR",
            PreviewError::Materialize { .. } => "SOURCE_READ_ERROR",
            PreviewError::Spawn { .. } => "TOOL_SPAWN_ERROR",
            PreviewError::Timeout { .. } => "TOOL_TIMEOUT",
            PreviewError::OutputRead { .. } => "OUTPUT_READ_ERROR",
            PreviewError::Storage(e) => e.error_code(),
            PreviewError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            PreviewError::Storage(e) => e.is_recoverable(),
            PreviewError::Configuration(_) | PreviewError::Spawn { .. } => false,
            _ => true,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PreviewError::Timeout { .. } => LogLevel::Warn,
            PreviewError::Storage(e) => e.log_level(),
            _ => LogLevel::Error,
        }
    }
}
