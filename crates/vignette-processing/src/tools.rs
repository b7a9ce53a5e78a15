//! Startup checks for the external conversion tools.

use std::env;
use std::path::PathBuf;
use vignette_core::PreviewConfig;

/// Result of looking up one conversion tool on the configured `PATH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    pub program: String,
    pub purpose: &'static str,
    /// Full path of the executable, if one was found.
    pub resolved: Option<PathBuf>,
}

impl ToolCheck {
    pub fn is_available(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Resolve both conversion tools against `config.tool_path`.
pub fn check_tools(config: &PreviewConfig) -> Vec<ToolCheck> {
    [
        (config.pdf_tool.as_str(), "PDF previews"),
        (config.image_tool.as_str(), "image previews"),
    ]
    .into_iter()
    .map(|(program, purpose)| ToolCheck {
        program: program.to_string(),
        purpose,
        resolved: resolve_program(program, &config.tool_path),
    })
    .collect()
}

/// Log a warning for every conversion tool that cannot be found.
///
/// Missing tools are not fatal: conversions with them fail with a spawn error.
pub(crate) fn warn_missing_tools(config: &PreviewConfig) {
    for check in check_tools(config) {
        if !check.is_available() {
            tracing::warn!(
                program = %check.program,
                purpose = check.purpose,
                tool_path = %config.tool_path,
                "Conversion tool not found; {} will fail",
                check.purpose
            );
        }
    }
}

fn resolve_program(program: &str, search_path: &str) -> Option<PathBuf> {
    let cwd = env::current_dir().unwrap_or_default();
    which::which_in(program, Some(search_path), cwd).ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_tool(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn config_with_path(tool_path: String) -> PreviewConfig {
        PreviewConfig {
            tool_path,
            ..PreviewConfig::default()
        }
    }

    #[test]
    fn finds_tools_on_configured_path() {
        let empty = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let pdf = write_tool(bin.path(), "pdftocairo", 0o755);
        let image = write_tool(bin.path(), "convert", 0o755);

        let config = config_with_path(format!(
            "{}:{}",
            empty.path().display(),
            bin.path().display()
        ));
        let checks = check_tools(&config);

        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].program, "pdftocairo");
        assert_eq!(checks[0].resolved.as_deref(), Some(pdf.as_path()));
        assert_eq!(checks[1].program, "convert");
        assert_eq!(checks[1].resolved.as_deref(), Some(image.as_path()));
    }

    #[test]
    fn missing_or_non_executable_tools_are_reported() {
        let bin = tempfile::tempdir().unwrap();
        write_tool(bin.path(), "convert", 0o644);

        let config = config_with_path(bin.path().display().to_string());
        let checks = check_tools(&config);

        assert!(checks.iter().all(|check| !check.is_available()));
    }

    #[test]
    fn absolute_tool_names_skip_the_search_path() {
        let bin = tempfile::tempdir().unwrap();
        let pdf = write_tool(bin.path(), "render-pdf", 0o755);

        let config = PreviewConfig {
            pdf_tool: pdf.display().to_string(),
            tool_path: "/nonexistent".to_string(),
            ..PreviewConfig::default()
        };
        let checks = check_tools(&config);

        assert!(checks[0].is_available());
        assert!(!checks[1].is_available());
    }
}
