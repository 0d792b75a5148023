//! Cloneable façade for reading the cache.
//!
//! [`CacheHandle`] hands out the published snapshot without locking and can
//! request an out-of-band refresh.
use std::sync::Arc;

use crate::error::RefreshError;
use crate::model::CacheSnapshot;
use crate::workers::{MetricsSnapshot, RefreshOutcome, Refresher};

/// Client-facing handle to the cache
#[derive(Clone)]
pub struct CacheHandle {
    refresher: Arc<Refresher>,
}

impl CacheHandle {
    pub(crate) fn new(refresher: Arc<Refresher>) -> Self {
        Self { refresher }
    }

    /// Latest published snapshot, or `None` if no refresh has succeeded yet.
    ///
    /// The returned snapshot is never modified; hold it as long as needed.
    pub fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.refresher.store().load()
    }

    /// Refresh now instead of waiting for the next tick.
    ///
    /// Returns [`RefreshOutcome::Skipped`] when a refresh is already running.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, RefreshError> {
        self.refresher.refresh_once().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_refreshing()
    }

    /// Refresh counters and timings
    pub fn metrics(&self) -> MetricsSnapshot {
        self.refresher.metrics().snapshot()
    }
}
