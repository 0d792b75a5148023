//! Run the cache service in the foreground.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use fact_cache::{CacheConfig, CacheSnapshot, Category, FactCache};

/// Run the cache and report snapshot changes until Ctrl-C
#[derive(Parser, Debug)]
pub struct Watch {
    /// How often to check for a newer snapshot, in milliseconds
    #[arg(long, default_value = "250")]
    pub poll_interval: u64,

    /// Fail at startup if the fact log cannot be read
    #[arg(long)]
    pub strict: bool,
}

impl Watch {
    pub async fn execute(self, config: CacheConfig) -> Result<()> {
        println!("{}", style("Watching fact log").green().bold());
        println!("  Facts:   {}", style(config.facts_path.display()).dim());
        println!("  Minimap: {}", style(config.minimap_path.display()).dim());
        println!("  Refresh: {:?}", config.refresh_interval);
        println!();

        let cache = FactCache::builder()
            .config(config)
            .require_initial_snapshot(self.strict)
            .start()
            .await
            .context("Failed to start fact cache")?;
        let handle = cache.handle();

        let mut ticker = tokio::time::interval(Duration::from_millis(self.poll_interval.max(1)));
        let mut last_seen = None;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = ticker.tick() => {
                    let Some(snapshot) = handle.snapshot() else {
                        continue;
                    };
                    if last_seen != Some(snapshot.produced_at_unix_ms) {
                        last_seen = Some(snapshot.produced_at_unix_ms);
                        print_summary(&snapshot);
                    }
                }
            }
        }

        let metrics = handle.metrics();
        cache.shutdown().await.context("Refresh worker did not stop cleanly")?;

        println!();
        println!(
            "{} {} refreshes, {} failed, {} skipped (avg {:?}, peak {:?})",
            style("Stopped:").yellow().bold(),
            metrics.succeeded,
            metrics.failed,
            metrics.skipped,
            metrics.avg_refresh_time,
            metrics.peak_refresh_time
        );

        Ok(())
    }
}

fn print_summary(snapshot: &CacheSnapshot) {
    let categories: Vec<String> = [Category::Player, Category::Train, Category::Turret]
        .into_iter()
        .map(|category| match snapshot.timestamp(category) {
            Some(ts) => format!("{}={}", category, ts),
            None => format!("{}=-", category),
        })
        .collect();

    let map = &snapshot.map().data;
    let minimap = if map.ready {
        style(format!("{}x{}", map.resolution.0, map.resolution.1)).green()
    } else {
        style("not ready".to_string()).red()
    };

    println!(
        "[{}] {}  minimap {}",
        style(snapshot.produced_at_unix_ms).dim(),
        categories.join(" "),
        minimap
    );
}
