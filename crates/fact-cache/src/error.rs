//! Error types raised by the cache layers.
//!
//! Only [`ReadError`] on the fact log aborts a refresh. [`ProbeError`] is
//! downgraded to `ready = false` by the minimap prober and never escapes a
//! refresh; malformed log lines are counted, not raised.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read the fact log.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {} at offset {offset}: {source}", path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    /// Path of the file that could not be read.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ReadError::Open { path, .. } | ReadError::Read { path, .. } => path,
        }
    }
}

/// Failure to inspect the minimap image.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to stat {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read image header of {}: {reason}", path.display())]
    Header { path: PathBuf, reason: String },
}

/// Failure of a whole refresh cycle. The previous snapshot stays published.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("fact log unreadable: {0}")]
    FactLog(#[from] ReadError),

    #[error("refresh task join failed: {0}")]
    TaskJoin(#[source] tokio::task::JoinError),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {}: {source}", path.display())]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("at least one category must be tracked")]
    NoCategories,
}

/// Errors surfaced by the [`FactCache`](crate::FactCache) service API.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("initial refresh failed: {0}")]
    InitialRefresh(#[source] RefreshError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("refresh worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CacheError>;
