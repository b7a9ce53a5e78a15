//! Conversion selector and invoker.
//!
//! Picks the external tool for a file by its extension, runs it in a scrubbed
//! environment against a private scratch directory, and hands back the JPEG it
//! wrote. A tool that exits non-zero or writes nothing is reported as
//! `PreviewResult::NotApplicable`; only infrastructure problems are errors.

use crate::error::PreviewError;
use async_trait::async_trait;
use bytes::Bytes;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use vignette_core::constants::{
    PREVIEW_EXTENSION, PREVIEW_JPEG_QUALITY, PREVIEW_OUTPUT_STEM, PREVIEW_TARGET_SIZE,
};
use vignette_core::{PreviewConfig, PreviewResult};

/// Longest stderr excerpt kept in logs when a tool declines a file.
const STDERR_LOG_LIMIT: usize = 2048;

/// Which external tool renders a given file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStrategy {
    /// First page of a PDF through `pdftocairo`
    PdfRender,
    /// First frame of anything else through ImageMagick `convert`
    ImageResize,
}

impl ConversionStrategy {
    /// Select a strategy from the lower-cased name of `path`.
    pub fn for_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".pdf") {
            ConversionStrategy::PdfRender
        } else {
            ConversionStrategy::ImageResize
        }
    }

    /// Arguments for rendering `input` into `output`.
    ///
    /// `output` is the JPEG the caller expects to find afterwards. `pdftocairo`
    /// appends the extension itself, so it receives `output` without it.
    pub fn args(self, input: &Path, output: &Path) -> Vec<OsString> {
        let size = PREVIEW_TARGET_SIZE.to_string();

        match self {
            ConversionStrategy::PdfRender => vec![
                input.as_os_str().to_owned(),
                "-jpeg".into(),
                "-singlefile".into(),
                "-scale-to-x".into(),
                size.into(),
                "-scale-to-y".into(),
                "-1".into(),
                output.with_extension("").into_os_string(),
            ],
            ConversionStrategy::ImageResize => {
                let mut first_frame = input.as_os_str().to_owned();
                first_frame.push("[0]");

                vec![
                    "-resize".into(),
                    format!("{size}x{size}>").into(),
                    "-quality".into(),
                    PREVIEW_JPEG_QUALITY.to_string().into(),
                    first_frame,
                    output.as_os_str().to_owned(),
                ]
            }
        }
    }
}

/// Converts a file on disk into preview image bytes
#[async_trait]
pub trait PreviewConverter: Send + Sync {
    /// Render `input` and name the result `output_basename`.
    async fn convert(
        &self,
        input: &Path,
        output_basename: &str,
    ) -> Result<PreviewResult, PreviewError>;
}

/// Converter that shells out to `pdftocairo` and `convert`
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    pdf_tool: String,
    image_tool: String,
    tool_path: String,
    timeout: Duration,
    temp_root: PathBuf,
}

impl ExternalConverter {
    pub fn new(config: &PreviewConfig) -> Result<Self, PreviewError> {
        config
            .validate()
            .map_err(|e| PreviewError::Configuration(e.to_string()))?;

        Ok(Self {
            pdf_tool: config.pdf_tool.clone(),
            image_tool: config.image_tool.clone(),
            tool_path: config.tool_path.clone(),
            timeout: config.conversion_timeout,
            temp_root: config.temp_root(),
        })
    }

    pub fn program(&self, strategy: ConversionStrategy) -> &str {
        match strategy {
            ConversionStrategy::PdfRender => &self.pdf_tool,
            ConversionStrategy::ImageResize => &self.image_tool,
        }
    }

    fn command(&self, strategy: ConversionStrategy, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(self.program(strategy));
        command
            .args(strategy.args(input, output))
            .env_clear()
            .env("PATH", &self.tool_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Collect the tool's output file, if it produced a usable one.
    async fn read_output(
        output: &Path,
        output_basename: &str,
    ) -> Result<PreviewResult, PreviewError> {
        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {}
            Ok(_) => {
                tracing::debug!(output = %output.display(), "Tool produced an empty preview");
                return Ok(PreviewResult::NotApplicable);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(output = %output.display(), "Tool exited cleanly without writing a preview");
                return Ok(PreviewResult::NotApplicable);
            }
            Err(e) => {
                return Err(PreviewError::OutputRead {
                    path: output.to_path_buf(),
                    source: e,
                })
            }
        }

        let data = tokio::fs::read(output)
            .await
            .map_err(|e| PreviewError::OutputRead {
                path: output.to_path_buf(),
                source: e,
            })?;

        if data.is_empty() {
            return Ok(PreviewResult::NotApplicable);
        }

        Ok(PreviewResult::Success {
            image: Bytes::from(data),
            filename: output_basename.to_string(),
        })
    }
}

#[async_trait]
impl PreviewConverter for ExternalConverter {
    #[tracing::instrument(skip(self, input), fields(input = %input.display()))]
    async fn convert(
        &self,
        input: &Path,
        output_basename: &str,
    ) -> Result<PreviewResult, PreviewError> {
        // Removed on drop, on every path out of this function.
        let workdir = tempfile::Builder::new()
            .prefix("vignette-convert-")
            .tempdir_in(&self.temp_root)
            .map_err(|e| PreviewError::TempResource {
                what: "directory",
                source: e,
            })?;

        let strategy = ConversionStrategy::for_path(input);
        let program = self.program(strategy).to_string();
        let output = workdir
            .path()
            .join(format!("{}.{}", PREVIEW_OUTPUT_STEM, PREVIEW_EXTENSION));

        let start = Instant::now();
        let child = self
            .command(strategy, input, &output)
            .spawn()
            .map_err(|e| PreviewError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        // On timeout the child is dropped, and kill_on_drop terminates it.
        let finished = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| PreviewError::Spawn {
                program: program.clone(),
                source: e,
            })?,
            Err(_) => {
                tracing::warn!(
                    program = %program,
                    timeout_secs = self.timeout.as_secs(),
                    "Conversion tool timed out"
                );
                return Err(PreviewError::Timeout {
                    program,
                    timeout: self.timeout,
                });
            }
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&finished.stderr);
            let excerpt: String = stderr.chars().take(STDERR_LOG_LIMIT).collect();
            tracing::debug!(
                program = %program,
                exit_code = ?finished.status.code(),
                duration_ms,
                stderr = %excerpt.trim(),
                "Conversion tool declined file"
            );
            return Ok(PreviewResult::NotApplicable);
        }

        let result = Self::read_output(&output, output_basename).await?;

        if let PreviewResult::Success { image, .. } = &result {
            tracing::debug!(
                program = %program,
                size_bytes = image.len(),
                duration_ms,
                "Conversion tool produced preview"
            );
        }

        Ok(result)
    }
}
