//! Command-line driver for the enrichment pipeline
//!
//! Replays a captured page and its follow-up pages through the pipeline and
//! prints the enriched tree, or checks a settings file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use enrich_cli::commands::{check_config, replay};
use enrich_core::FeatureConfig;

#[derive(Parser)]
#[command(name = "enrich")]
#[command(about = "Enrich - incremental listing enrichment replay tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured page through the pipeline
    Replay {
        /// Captured page: a JSON node document
        #[arg(long)]
        page: PathBuf,

        /// Directory of follow-up pages named `<cursor>.json`
        #[arg(long)]
        pages: PathBuf,

        /// Settings file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of scroll-to-bottom events to simulate
        #[arg(short, long, default_value = "3")]
        scrolls: u32,
    },

    /// Decode a settings file and print the effective configuration
    CheckConfig {
        /// Settings file (TOML or JSON)
        path: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            page,
            pages,
            config,
            scrolls,
        } => {
            let config = match config {
                Some(path) => check_config::load(&path).await?,
                None => FeatureConfig::default(),
            };
            let summary = replay::run(&page, &pages, config, scrolls).await?;
            print!("{}", summary.outline);
            println!("{summary}");
        }

        Commands::CheckConfig { path } => {
            let config = check_config::load(&path).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
