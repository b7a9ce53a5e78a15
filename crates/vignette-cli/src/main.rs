//! Vignette CLI: generate download previews from the command line.
//!
//! Configuration is read from the environment (and `.env`); see `PreviewConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use vignette_cli::{format_tool_report, init_tracing};
use vignette_core::{LocalSourceFile, PreviewConfig};
use vignette_processing::{check_tools, PreviewOrchestrator};

#[derive(Parser)]
#[command(name = "vignette", about = "Download preview generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and store a preview for a file
    Generate {
        /// Path to the source file
        file: std::path::PathBuf,
        /// Name the file was uploaded with; the preview is named after it
        #[arg(long)]
        name: Option<String>,
    },
    /// Report whether the conversion tools can be found
    Check,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize asset")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = PreviewConfig::from_env().context("Invalid preview configuration")?;

    match cli.command {
        Commands::Generate { file, name } => {
            anyhow::ensure!(file.is_file(), "{} is not a file", file.display());
            tracing::info!(
                file = %file.display(),
                storage.backend = %config.storage_backend,
                "Generating preview"
            );

            let store = vignette_storage::create_asset_store(&config)
                .await
                .context("Failed to open asset store")?;
            let orchestrator = PreviewOrchestrator::from_config(&config, store)?;

            let mut source = LocalSourceFile::new(&file);
            if let Some(name) = name {
                source = source.with_original_name(name);
            }

            match orchestrator
                .maybe_generate_preview(&source, None, true)
                .await?
            {
                Some(derived) => print_json(&derived.asset)?,
                None => println!("no preview"),
            }
        }
        Commands::Check => {
            let checks = check_tools(&config);
            println!("{}", format_tool_report(&checks));

            let missing = checks.iter().filter(|c| !c.is_available()).count();
            anyhow::ensure!(
                missing == 0,
                "{} conversion tool(s) missing from {}",
                missing,
                config.tool_path
            );
        }
    }

    Ok(())
}
