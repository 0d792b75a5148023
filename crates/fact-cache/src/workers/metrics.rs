//! Refresh metrics and statistics.
//!
//! Tracks refresh outcomes and timings for monitoring and debugging.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Refresh metrics tracked by the refresh worker.
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    /// Refreshes that published a snapshot
    succeeded: AtomicU64,

    /// Refreshes that failed (previous snapshot kept)
    failed: AtomicU64,

    /// Refresh requests dropped because one was already running
    skipped: AtomicU64,

    /// Sum of successful refresh durations, in nanoseconds
    total_refresh_time_nanos: AtomicU64,

    /// Slowest successful refresh, in nanoseconds
    peak_refresh_time_nanos: AtomicU64,

    /// `produced_at` of the last published snapshot, valid once `has_succeeded`
    last_success_unix_ms: AtomicI64,

    has_succeeded: AtomicBool,

    /// Failures since the last success
    consecutive_failures: AtomicU64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a published snapshot.
    pub fn record_success(&self, elapsed: Duration, produced_at_unix_ms: i64) {
        let nanos = elapsed.as_nanos() as u64;
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_refresh_time_nanos
            .fetch_add(nanos, Ordering::Relaxed);
        self.peak_refresh_time_nanos
            .fetch_max(nanos, Ordering::Relaxed);
        self.last_success_unix_ms
            .store(produced_at_unix_ms, Ordering::Relaxed);
        self.has_succeeded.store(true, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Records a failed refresh.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a refresh that was not started because another was in flight.
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// `produced_at` of the last published snapshot.
    pub fn last_success_unix_ms(&self) -> Option<i64> {
        self.has_succeeded
            .load(Ordering::Acquire)
            .then(|| self.last_success_unix_ms.load(Ordering::Relaxed))
    }

    /// Average duration of successful refreshes.
    pub fn avg_refresh_time(&self) -> Duration {
        let succeeded = self.succeeded();
        if succeeded == 0 {
            Duration::ZERO
        } else {
            let total_nanos = self.total_refresh_time_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / succeeded)
        }
    }

    pub fn peak_refresh_time(&self) -> Duration {
        Duration::from_nanos(self.peak_refresh_time_nanos.load(Ordering::Relaxed))
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Note: individual fields are read atomically but the snapshot as a
    /// whole may be inconsistent if a refresh completes concurrently.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            succeeded: self.succeeded(),
            failed: self.failed(),
            skipped: self.skipped(),
            consecutive_failures: self.consecutive_failures(),
            last_success_unix_ms: self.last_success_unix_ms(),
            avg_refresh_time: self.avg_refresh_time(),
            peak_refresh_time: self.peak_refresh_time(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub consecutive_failures: u64,
    pub last_success_unix_ms: Option<i64>,
    pub avg_refresh_time: Duration,
    pub peak_refresh_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_outcomes() {
        let metrics = RefreshMetrics::new();
        metrics.record_failure();
        metrics.record_failure();
        assert_eq!(metrics.consecutive_failures(), 2);
        assert_eq!(metrics.last_success_unix_ms(), None);

        metrics.record_success(Duration::from_millis(10), 500);
        metrics.record_success(Duration::from_millis(30), 900);
        metrics.record_skip();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.succeeded, 2);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(snapshot.skipped, 1);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.last_success_unix_ms, Some(900));
        assert_eq!(snapshot.avg_refresh_time, Duration::from_millis(20));
        assert_eq!(snapshot.peak_refresh_time, Duration::from_millis(30));
    }

    #[test]
    fn zero_produced_at_counts_as_success() {
        let metrics = RefreshMetrics::new();
        assert_eq!(metrics.last_success_unix_ms(), None);

        metrics.record_success(Duration::from_millis(1), 0);
        assert_eq!(metrics.last_success_unix_ms(), Some(0));
    }
}
