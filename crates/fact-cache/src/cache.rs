//! High-level cache service.
//!
//! [`FactCache`] owns the refresh worker; [`CacheHandle`] is the cloneable
//! façade readers use. Both are created through [`FactCacheBuilder`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::CacheConfig;
use crate::engine::CacheEngine;
use crate::error::{CacheError, Result};
use crate::handle::CacheHandle;
use crate::model::CacheSnapshot;
use crate::probe::{Clock, DimensionReader, MinimapProber};
use crate::store::SnapshotStore;
use crate::workers::{RefreshMetrics, RefreshWorker, Refresher};

/// Running cache service
///
/// Design: FactCache owns the worker task and its shutdown channel.
/// [`CacheHandle`] provides a cloneable façade for readers.
pub struct FactCache {
    handle: CacheHandle,
    shutdown_tx: watch::Sender<bool>,
    worker_handle: JoinHandle<()>,
}

impl FactCache {
    /// Create a new cache builder
    pub fn builder() -> FactCacheBuilder {
        FactCacheBuilder::new()
    }

    /// Get a cloneable handle to this cache
    pub fn handle(&self) -> CacheHandle {
        self.handle.clone()
    }

    /// Shortcut for `handle().snapshot()`
    pub fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.handle.snapshot()
    }

    /// Stop the refresh worker and wait for it to exit.
    ///
    /// Handles stay usable afterwards; they keep returning the last snapshot.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.worker_handle.await.map_err(CacheError::WorkerJoin)
    }
}

/// Builder for [`FactCache`].
pub struct FactCacheBuilder {
    config: CacheConfig,
    dimension_reader: Option<Arc<dyn DimensionReader>>,
    clock: Option<Arc<dyn Clock>>,
    require_initial_snapshot: bool,
}

impl FactCacheBuilder {
    fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            dimension_reader: None,
            clock: None,
            require_initial_snapshot: false,
        }
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Override how minimap dimensions are read (default: image header).
    pub fn dimension_reader(mut self, reader: impl DimensionReader) -> Self {
        self.dimension_reader = Some(Arc::new(reader));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fail [`start`](Self::start) when the first refresh fails, instead of
    /// starting with no snapshot.
    pub fn require_initial_snapshot(mut self, required: bool) -> Self {
        self.require_initial_snapshot = required;
        self
    }

    /// Validate the configuration, run the first refresh and spawn the
    /// periodic worker. Must be called inside a tokio runtime.
    pub async fn start(self) -> Result<FactCache> {
        self.config.validate()?;

        let period = self.config.refresh_interval;
        let config = Arc::new(self.config);

        let mut prober = MinimapProber::new(config.debounce_window);
        if let Some(reader) = self.dimension_reader {
            prober = prober.with_reader(reader);
        }
        let mut engine = CacheEngine::new(Arc::clone(&config)).with_prober(prober);
        if let Some(clock) = self.clock {
            engine = engine.with_clock(clock);
        }

        let refresher = Arc::new(Refresher::new(
            engine,
            Arc::new(SnapshotStore::new()),
            Arc::new(RefreshMetrics::new()),
        ));

        match refresher.refresh_once().await {
            Ok(_) => info!(
                "Initial snapshot published from {}",
                config.facts_path.display()
            ),
            Err(e) if self.require_initial_snapshot => {
                return Err(CacheError::InitialRefresh(e));
            }
            Err(e) => warn!("Initial refresh failed, starting without a snapshot: {}", e),
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = RefreshWorker::new(Arc::clone(&refresher), period, shutdown_rx);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(FactCache {
            handle: CacheHandle::new(refresher),
            shutdown_tx,
            worker_handle,
        })
    }
}
