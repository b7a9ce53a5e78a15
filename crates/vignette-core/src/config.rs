//! Configuration module
//!
//! Preview generation settings are read from the environment. Target size, JPEG
//! quality and the preview collection name are fixed constants and are not
//! configurable.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONVERSION_TIMEOUT_SECS, DEFAULT_IMAGE_TOOL, DEFAULT_PDF_TOOL, SAFE_TOOL_PATH,
};
use crate::storage_types::StorageBackend;

const LOCAL_STORAGE_PATH: &str = "./previews";

/// Characters that must never appear in a configured tool name.
const DANGEROUS_CHARS: [char; 11] = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Preview pipeline configuration
#[derive(Clone, Debug)]
pub struct PreviewConfig {
    /// `PATH` handed to conversion tools; the child process sees nothing else.
    pub tool_path: String,
    pub pdf_tool: String,
    pub image_tool: String,
    pub conversion_timeout: Duration,
    /// Root for scratch files and directories. `None` uses the system temp dir.
    pub temp_dir: Option<PathBuf>,
    pub storage_backend: StorageBackend,
    pub local_storage_path: PathBuf,
    pub database_url: Option<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            tool_path: SAFE_TOOL_PATH.to_string(),
            pdf_tool: DEFAULT_PDF_TOOL.to_string(),
            image_tool: DEFAULT_IMAGE_TOOL.to_string(),
            conversion_timeout: Duration::from_secs(DEFAULT_CONVERSION_TIMEOUT_SECS),
            temp_dir: None,
            storage_backend: StorageBackend::Local,
            local_storage_path: PathBuf::from(LOCAL_STORAGE_PATH),
            database_url: None,
        }
    }
}

impl PreviewConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        let timeout_secs = match lookup("PREVIEW_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                anyhow::anyhow!("PREVIEW_TIMEOUT_SECS must be a whole number of seconds: {}", e)
            })?,
            None => DEFAULT_CONVERSION_TIMEOUT_SECS,
        };

        let config = Self {
            tool_path: lookup("PREVIEW_TOOL_PATH").unwrap_or(defaults.tool_path),
            pdf_tool: lookup("PREVIEW_PDF_TOOL").unwrap_or(defaults.pdf_tool),
            image_tool: lookup("PREVIEW_IMAGE_TOOL").unwrap_or(defaults.image_tool),
            conversion_timeout: Duration::from_secs(timeout_secs),
            temp_dir: lookup("PREVIEW_TEMP_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            storage_backend,
            local_storage_path: lookup("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_storage_path),
            database_url: lookup("DATABASE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.tool_path.trim().is_empty() {
            return Err(anyhow::anyhow!("PREVIEW_TOOL_PATH must not be empty"));
        }

        for (key, tool) in [
            ("PREVIEW_PDF_TOOL", &self.pdf_tool),
            ("PREVIEW_IMAGE_TOOL", &self.image_tool),
        ] {
            if tool.trim().is_empty() {
                return Err(anyhow::anyhow!("{} must not be empty", key));
            }
            if tool.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
                return Err(anyhow::anyhow!(
                    "Invalid {}: contains dangerous characters",
                    key
                ));
            }
        }

        if self.conversion_timeout.is_zero() {
            return Err(anyhow::anyhow!("PREVIEW_TIMEOUT_SECS must be greater than zero"));
        }

        if self.storage_backend == StorageBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string when using the postgres storage backend"
                    ))
                }
            }
        }

        Ok(())
    }

    /// Scratch root for temp files, falling back to the system temp dir.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(env::temp_dir)
    }
}
