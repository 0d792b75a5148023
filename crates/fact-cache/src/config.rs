//! Cache configuration structures and loaders.
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::CategorySet;
use crate::probe::DEFAULT_DEBOUNCE_WINDOW;
use crate::reader::DEFAULT_BLOCK_SIZE;

/// Everything the refresh cycle needs to know.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Append-only fact log written by the producer.
    pub facts_path: PathBuf,
    /// Minimap image rewritten by the producer.
    pub minimap_path: PathBuf,
    /// Period between refreshes.
    pub refresh_interval: Duration,
    /// Minimum time between header reads of an unchanged-size minimap.
    pub debounce_window: Duration,
    /// Categories extracted from the fact log.
    pub tracked: CategorySet,
    /// Block size for backward log reads.
    pub read_block_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            facts_path: PathBuf::from("kFacts.json"),
            minimap_path: PathBuf::from("minimap.png"),
            refresh_interval: Duration::from_millis(1000),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            tracked: CategorySet::all(),
            read_block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// The producer-side `settings.json` keys this crate understands.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    k_facts_path: Option<PathBuf>,
    minimap_path: Option<PathBuf>,
    /// Milliseconds.
    cache_expiration_time: Option<u64>,
}

impl CacheConfig {
    pub fn new(facts_path: impl Into<PathBuf>, minimap_path: impl Into<PathBuf>) -> Self {
        Self {
            facts_path: facts_path.into(),
            minimap_path: minimap_path.into(),
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `FACTS_PATH` - Fact log path (default: `kFacts.json`)
    /// - `MINIMAP_PATH` - Minimap image path (default: `minimap.png`)
    /// - `CACHE_REFRESH_INTERVAL_MS` - Refresh period (default: 1000)
    /// - `MINIMAP_DEBOUNCE_MS` - Minimap debounce window (default: 500)
    /// - `TRACKED_CATEGORIES` - Comma separated categories (default: all)
    /// - `READ_BLOCK_SIZE` - Backward read block size in bytes (default: 65536)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Overlay environment variables on top of `self`.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(path) = env::var("FACTS_PATH") {
            self.facts_path = PathBuf::from(path);
        }

        if let Ok(path) = env::var("MINIMAP_PATH") {
            self.minimap_path = PathBuf::from(path);
        }

        if let Some(ms) = read_env::<u64>("CACHE_REFRESH_INTERVAL_MS") {
            self.refresh_interval = Duration::from_millis(ms);
        }

        if let Some(ms) = read_env::<u64>("MINIMAP_DEBOUNCE_MS") {
            self.debounce_window = Duration::from_millis(ms);
        }

        if let Ok(categories) = env::var("TRACKED_CATEGORIES") {
            self.tracked = categories.parse()?;
        }

        if let Some(size) = read_env::<usize>("READ_BLOCK_SIZE") {
            self.read_block_size = size;
        }

        Ok(self)
    }

    /// Load the producer's `settings.json` (`kFactsPath`, `minimapPath`,
    /// `cacheExpirationTime`). Relative paths resolve against the settings
    /// file's directory.
    pub fn from_settings_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: SettingsFile =
            serde_json::from_str(&raw).map_err(|source| ConfigError::SettingsParse {
                path: path.to_path_buf(),
                source,
            })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut config = Self::default();

        if let Some(facts) = settings.k_facts_path {
            config.facts_path = base_dir.join(facts);
        }
        if let Some(minimap) = settings.minimap_path {
            config.minimap_path = base_dir.join(minimap);
        }
        if let Some(ms) = settings.cache_expiration_time {
            config.refresh_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Reject configurations the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::Zero {
                field: "refresh_interval",
            });
        }
        if self.read_block_size == 0 {
            return Err(ConfigError::Zero {
                field: "read_block_size",
            });
        }
        if self.tracked.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        if self.refresh_interval < self.debounce_window {
            tracing::warn!(
                "Refresh interval {:?} is shorter than the minimap debounce window {:?}; \
                 a steadily rewritten minimap may stay not-ready",
                self.refresh_interval,
                self.debounce_window
            );
        }

        Ok(())
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
