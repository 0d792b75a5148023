//! Command-line entry point for the fact cache.
//!
//! Run with: `fact-cache <command>`. Paths and intervals come from
//! `--settings` (the producer's `settings.json`) and the environment.

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Latest, Tail, Watch};
use fact_cache::CacheConfig;

/// Snapshot cache over the producer's fact log and minimap
#[derive(Parser)]
#[command(name = "fact-cache")]
#[command(about = "Keep the latest facts from an append-only log", long_about = None)]
#[command(version)]
struct Cli {
    /// Producer settings file (`kFactsPath`, `minimapPath`, `cacheExpirationTime`)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run the cache and report snapshot changes until Ctrl-C
    Watch(Watch),

    /// Refresh once and print the snapshot as JSON
    Latest(Latest),

    /// Print the last lines of the fact log
    Tail(Tail),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = logging::init()?;

    let cli = Cli::parse();
    let config = load_config(cli.settings.as_deref())?;
    tracing::debug!(
        "Configuration: facts={} minimap={} interval={:?} tracked={:?}",
        config.facts_path.display(),
        config.minimap_path.display(),
        config.refresh_interval,
        config.tracked
    );

    match cli.command {
        Command::Watch(cmd) => cmd.execute(config).await,
        Command::Latest(cmd) => cmd.execute(config).await,
        Command::Tail(cmd) => cmd.execute(&config),
    }
}

/// Settings file first (if any), then environment overrides.
fn load_config(settings: Option<&std::path::Path>) -> Result<CacheConfig> {
    let base = match settings {
        Some(path) => CacheConfig::from_settings_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => CacheConfig::default(),
    };

    base.apply_env()
        .context("Invalid cache configuration in environment")
}
