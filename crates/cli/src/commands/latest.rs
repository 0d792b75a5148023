//! One-shot refresh.

use anyhow::{Context, Result};
use clap::Parser;
use fact_cache::{CacheConfig, Category, FactCache};

/// Refresh once and print the snapshot as JSON
#[derive(Parser, Debug)]
pub struct Latest {
    /// Print only this category (`player`, `train`, `turret`, `map`)
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

impl Latest {
    pub async fn execute(self, config: CacheConfig) -> Result<()> {
        let cache = FactCache::builder()
            .config(config)
            .require_initial_snapshot(true)
            .start()
            .await
            .context("Failed to build snapshot")?;

        let snapshot = cache
            .snapshot()
            .context("No snapshot was published")?;
        cache.shutdown().await?;

        let value = match self.category {
            Some(Category::Map) => serde_json::to_value(snapshot.map())?,
            Some(category) => serde_json::to_value(snapshot.get(category))?,
            None => serde_json::to_value(&*snapshot)?,
        };

        let rendered = if self.compact {
            serde_json::to_string(&value)?
        } else {
            serde_json::to_string_pretty(&value)?
        };
        println!("{}", rendered);

        Ok(())
    }
}
