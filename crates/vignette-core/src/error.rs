//! Error metadata shared by the storage and processing layers.
//!
//! Each layer owns its own `thiserror` enum. They all describe themselves through
//! [`ErrorMetadata`] so callers can decide how loudly to report a failure without
//! matching on every variant.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes that are not failures
    Debug,
    /// Warning level - for recoverable issues like a slow or missing tool
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported to operators
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the whole operation may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

impl LogLevel {
    /// Emit `message` through `tracing` at this level.
    pub fn emit(self, code: &'static str, message: &str) {
        match self {
            LogLevel::Debug => tracing::debug!(error_code = code, "{}", message),
            LogLevel::Warn => tracing::warn!(error_code = code, "{}", message),
            LogLevel::Error => tracing::error!(error_code = code, "{}", message),
        }
    }
}
