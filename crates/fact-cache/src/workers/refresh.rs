//! Periodic refresh worker.
//!
//! Runs [`CacheEngine::refresh`] on a fixed interval and publishes the result
//! to the [`SnapshotStore`]. Refreshes never overlap: a tick (or an on-demand
//! request) that arrives while one is running is skipped, not queued.
//!
//! The blocking disk work and the publish both happen on the blocking pool,
//! under the in-flight flag, so an abandoned caller cannot let two refreshes
//! publish out of order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use super::metrics::RefreshMetrics;
use crate::engine::CacheEngine;
use crate::error::RefreshError;
use crate::model::CacheSnapshot;
use crate::store::SnapshotStore;

/// Result of a refresh request.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A new snapshot was built and published.
    Published(Arc<CacheSnapshot>),
    /// Another refresh was already running; nothing was done.
    Skipped,
}

impl RefreshOutcome {
    pub fn snapshot(&self) -> Option<&Arc<CacheSnapshot>> {
        match self {
            RefreshOutcome::Published(snapshot) => Some(snapshot),
            RefreshOutcome::Skipped => None,
        }
    }
}

/// Shared refresh state used by the worker loop and by on-demand callers.
pub struct Refresher {
    engine: CacheEngine,
    store: Arc<SnapshotStore>,
    metrics: Arc<RefreshMetrics>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when dropped, including when the blocking task
/// is discarded before it runs.
struct InFlight(Arc<Refresher>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

impl Refresher {
    pub fn new(
        engine: CacheEngine,
        store: Arc<SnapshotStore>,
        metrics: Arc<RefreshMetrics>,
    ) -> Self {
        Self {
            engine,
            store,
            metrics,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<RefreshMetrics> {
        &self.metrics
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one refresh unless another is in flight.
    ///
    /// On failure the previously published snapshot stays in place.
    pub async fn refresh_once(self: &Arc<Self>) -> Result<RefreshOutcome, RefreshError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.metrics.record_skip();
            debug!("Refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        }

        let guard = InFlight(Arc::clone(self));
        let joined = tokio::task::spawn_blocking(move || {
            let guard = guard;
            guard.0.refresh_and_publish()
        })
        .await;

        match joined {
            Ok(result) => result.map(RefreshOutcome::Published),
            Err(join_error) => {
                self.metrics.record_failure();
                Err(RefreshError::TaskJoin(join_error))
            }
        }
    }

    fn refresh_and_publish(&self) -> Result<Arc<CacheSnapshot>, RefreshError> {
        let started = Instant::now();
        let previous = self.store.load();

        match self.engine.refresh_with_report(previous.as_deref()) {
            Ok((snapshot, report)) => {
                let elapsed = started.elapsed();
                self.metrics
                    .record_success(elapsed, snapshot.produced_at_unix_ms);
                debug!(
                    "Published snapshot at {} in {:?} ({} categories advanced)",
                    snapshot.produced_at_unix_ms,
                    elapsed,
                    report.advanced.len()
                );
                Ok(self.store.publish(snapshot))
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }
}

/// Background task that refreshes on a fixed period until shut down.
pub struct RefreshWorker {
    refresher: Arc<Refresher>,
    period: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl RefreshWorker {
    pub fn new(
        refresher: Arc<Refresher>,
        period: Duration,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            refresher,
            period,
            shutdown_rx,
        }
    }

    /// Main worker loop.
    ///
    /// The first tick fires one period after start; the caller is expected to
    /// have run the initial refresh already.
    pub async fn run(mut self) {
        let mut ticker = interval_at(tokio::time::Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("RefreshWorker started (period: {:?})", self.period);

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        let metrics = self.refresher.metrics().snapshot();
        info!(
            "RefreshWorker stopped (succeeded: {}, failed: {}, skipped: {})",
            metrics.succeeded, metrics.failed, metrics.skipped
        );
    }

    async fn tick(&self) {
        match self.refresher.refresh_once().await {
            Ok(RefreshOutcome::Published(_)) | Ok(RefreshOutcome::Skipped) => {}
            Err(e) => {
                let failures = self.refresher.metrics().consecutive_failures();
                error!(
                    "Refresh failed, keeping previous snapshot ({} in a row): {}",
                    failures, e
                );
            }
        }
    }
}
