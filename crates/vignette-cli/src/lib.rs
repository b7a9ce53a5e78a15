use vignette_processing::ToolCheck;

/// Render the tool availability report, one line per tool.
pub fn format_tool_report(checks: &[ToolCheck]) -> String {
    checks
        .iter()
        .map(|check| match &check.resolved {
            Some(path) => format!("ok       {:<12} {} ({})", check.program, path.display(), check.purpose),
            None => format!("missing  {:<12} not found ({})", check.program, check.purpose),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn report_lists_found_and_missing_tools() {
        let checks = vec![
            ToolCheck {
                program: "pdftocairo".to_string(),
                purpose: "PDF previews",
                resolved: Some(PathBuf::from("/usr/bin/pdftocairo")),
            },
            ToolCheck {
                program: "convert".to_string(),
                purpose: "image previews",
                resolved: None,
            },
        ];

        let report = format_tool_report(&checks);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ok"));
        assert!(lines[0].contains("/usr/bin/pdftocairo"));
        assert!(lines[1].starts_with("missing"));
        assert!(lines[1].contains("convert"));
    }

    #[test]
    fn empty_report_is_empty() {
        assert_eq!(format_tool_report(&[]), "");
    }
}

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
