//! In-memory snapshot cache over an append-only fact log.
//!
//! A producer appends JSON records to a fact log and periodically rewrites a
//! minimap image. This crate keeps the newest record per tracked category,
//! plus minimap dimensions, in an immutable [`CacheSnapshot`] that readers
//! fetch without locking. Consumers embed [`FactCache`] and read through
//! [`CacheHandle`].
//!
//! Modules are organized by responsibility:
//! - [`reader`] walks the fact log backward and extracts the latest records
//! - [`probe`] inspects the minimap with a debounced header read
//! - [`engine`] merges one refresh into the previous snapshot
//! - [`store`] holds the published snapshot
//! - [`cache`] and [`handle`] expose the running service
//! - [`config`] and [`model`] provide configuration and data types
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod model;
pub mod probe;
pub mod reader;
pub mod store;

mod workers;

pub use cache::{FactCache, FactCacheBuilder};
pub use config::CacheConfig;
pub use engine::{CacheEngine, MergeReport};
pub use error::{CacheError, ConfigError, ProbeError, ReadError, RefreshError, Result};
pub use handle::CacheHandle;
pub use model::{
    CacheSnapshot, Category, CategoryPayload, CategorySet, LogRecord, MapData, MapInformation,
    SnapshotData,
};
pub use probe::{
    Clock, DimensionReader, ImageHeaderReader, ManualClock, MinimapProber, SystemClock,
};
pub use reader::{Extraction, LatestRecordExtractor, ReverseLineReader, ScanSummary, last_lines};
pub use store::SnapshotStore;
pub use workers::{MetricsSnapshot, RefreshMetrics, RefreshOutcome};
