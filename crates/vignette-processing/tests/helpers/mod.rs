//! Shared fixtures for preview pipeline integration tests.
//!
//! Conversion tools are replaced with small shell scripts. Each behaviour lives in
//! its own directory, and a test selects one by putting that directory first on
//! the tool `PATH`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tempfile::TempDir;
use vignette_core::{PreviewConfig, StorageBackend};
use vignette_processing::PreviewOrchestrator;
use vignette_storage::AssetStore;

pub const PDF_OUTPUT: &[u8] = b"mock pdf preview";
pub const IMAGE_OUTPUT: &[u8] = b"mock image preview";

/// How the mock tools behave
#[derive(Debug, Clone, Copy)]
pub enum ToolMode {
    /// Write a fixed preview to the requested output
    Ok,
    /// Complain on stderr and exit 1
    Fail,
    /// Exit 0 without writing anything
    Silent,
    /// Sleep well past any test timeout
    Slow,
    /// Write `$HOME` (or `unset`) to the output
    Env,
}

impl ToolMode {
    fn dir_name(self) -> &'static str {
        match self {
            ToolMode::Ok => "ok",
            ToolMode::Fail => "fail",
            ToolMode::Silent => "silent",
            ToolMode::Slow => "slow",
            ToolMode::Env => "env",
        }
    }

    fn pdftocairo(self) -> String {
        let body = match self {
            ToolMode::Ok => format!(
                "printf '%s' '{}' > \"${{last}}.jpg\"",
                String::from_utf8_lossy(PDF_OUTPUT)
            ),
            ToolMode::Env => "printf '%s' \"${HOME:-unset}\" > \"${last}.jpg\"".to_string(),
            other => other.common_body(),
        };
        script(&body)
    }

    fn convert(self) -> String {
        let body = match self {
            ToolMode::Ok => format!(
                "printf '%s' '{}' > \"$last\"",
                String::from_utf8_lossy(IMAGE_OUTPUT)
            ),
            ToolMode::Env => "printf '%s' \"${HOME:-unset}\" > \"$last\"".to_string(),
            other => other.common_body(),
        };
        script(&body)
    }

    fn common_body(self) -> String {
        match self {
            ToolMode::Fail => "echo 'mock: unsupported input' >&2\nexit 1".to_string(),
            ToolMode::Silent => "exit 0".to_string(),
            ToolMode::Slow => "exec sleep 30".to_string(),
            ToolMode::Ok | ToolMode::Env => unreachable!("handled per tool"),
        }
    }
}

fn script(body: &str) -> String {
    format!("#!/bin/sh\nfor last; do :; done\n{}\n", body)
}

/// Directory holding one subdirectory of mock tools per [`ToolMode`].
///
/// Every script is written before the first test spawns anything, so no child
/// process can inherit a script's open write handle.
fn mock_tools_root() -> &'static Path {
    static ROOT: OnceLock<TempDir> = OnceLock::new();
    ROOT.get_or_init(|| {
        let root = tempfile::Builder::new()
            .prefix("vignette-mock-tools-")
            .tempdir()
            .unwrap();
        for mode in [
            ToolMode::Ok,
            ToolMode::Fail,
            ToolMode::Silent,
            ToolMode::Slow,
            ToolMode::Env,
        ] {
            let dir = root.path().join(mode.dir_name());
            std::fs::create_dir(&dir).unwrap();
            write_executable(&dir.join("pdftocairo"), &mode.pdftocairo());
            write_executable(&dir.join("convert"), &mode.convert());
        }
        root
    })
    .path()
}

#[cfg(unix)]
fn write_executable(path: &Path, content: &str) {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.sync_all().unwrap();
    drop(file);
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn mock_tools_dir(mode: ToolMode) -> PathBuf {
    mock_tools_root().join(mode.dir_name())
}

/// Test environment: configuration, scratch root and store root.
pub struct Harness {
    pub config: PreviewConfig,
    pub scratch: TempDir,
    pub storage: TempDir,
}

impl Harness {
    pub fn new(mode: ToolMode) -> Self {
        let tool_path = format!("{}:/usr/bin:/bin", mock_tools_dir(mode).display());
        Self::with_tool_path(tool_path)
    }

    pub fn with_tool_path(tool_path: String) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let storage = tempfile::tempdir().unwrap();
        let config = PreviewConfig {
            tool_path,
            conversion_timeout: Duration::from_secs(10),
            temp_dir: Some(scratch.path().to_path_buf()),
            storage_backend: StorageBackend::Local,
            local_storage_path: storage.path().to_path_buf(),
            ..PreviewConfig::default()
        };
        Self {
            config,
            scratch,
            storage,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.conversion_timeout = timeout;
        self
    }

    pub async fn store(&self) -> Arc<dyn AssetStore> {
        vignette_storage::create_asset_store(&self.config)
            .await
            .unwrap()
    }

    /// Orchestrator over a fresh store, returned alongside for inspection.
    pub async fn orchestrator(&self) -> (PreviewOrchestrator, Arc<dyn AssetStore>) {
        let store = self.store().await;
        let orchestrator = PreviewOrchestrator::from_config(&self.config, store.clone()).unwrap();
        (orchestrator, store)
    }

    /// Whether every scratch file and directory has been cleaned up.
    pub fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.scratch.path())
            .unwrap()
            .next()
            .is_none()
    }
}
