//! Background tasks that keep the published snapshot fresh.

mod metrics;
mod refresh;

pub use metrics::{MetricsSnapshot, RefreshMetrics};
pub use refresh::{RefreshOutcome, RefreshWorker, Refresher};
