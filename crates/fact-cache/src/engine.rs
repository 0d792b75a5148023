//! Cache merge engine.
//!
//! One refresh reads the fact log backward, probes the minimap, and merges
//! both into the previous snapshot:
//!
//! - non-map categories follow keep-newest: a retained payload is replaced
//!   only by one with a strictly greater timestamp, and categories missing
//!   from the log carry forward, so retained timestamps never decrease;
//! - the map category is whatever the prober returns, seeded with the log's
//!   newer `map_information` timestamp and tile count.
//!
//! `previous` is never mutated; a new [`CacheSnapshot`] is built every time.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::CacheConfig;
use crate::error::RefreshError;
use crate::model::{CacheSnapshot, Category, CategoryPayload, MapInformation, SnapshotData};
use crate::probe::{Clock, MinimapProber, SystemClock};
use crate::reader::{Extraction, LatestRecordExtractor};

/// What a merge changed, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Categories whose payload was replaced by a newer one.
    pub advanced: Vec<Category>,
    /// Categories found in the log but older than (or equal to) the retained payload.
    pub stale: Vec<Category>,
    pub map_ready: bool,
}

/// Builds snapshots from the fact log and minimap.
pub struct CacheEngine {
    config: Arc<CacheConfig>,
    extractor: LatestRecordExtractor,
    prober: MinimapProber,
    clock: Arc<dyn Clock>,
}

impl CacheEngine {
    pub fn new(config: Arc<CacheConfig>) -> Self {
        Self {
            extractor: LatestRecordExtractor::new(config.read_block_size),
            prober: MinimapProber::new(config.debounce_window),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the minimap prober (e.g. to inject a dimension reader).
    pub fn with_prober(mut self, prober: MinimapProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Run one refresh cycle on top of `previous`.
    ///
    /// # Errors
    ///
    /// Fails only when the fact log cannot be read. Minimap problems are
    /// reported through `map_information.data.ready`.
    pub fn refresh(
        &self,
        previous: Option<&CacheSnapshot>,
    ) -> Result<CacheSnapshot, RefreshError> {
        self.refresh_with_report(previous).map(|(snapshot, _)| snapshot)
    }

    /// [`refresh`](Self::refresh), also returning what changed.
    pub fn refresh_with_report(
        &self,
        previous: Option<&CacheSnapshot>,
    ) -> Result<(CacheSnapshot, MergeReport), RefreshError> {
        let extraction = self
            .extractor
            .extract(&self.config.facts_path, &self.config.tracked)?;

        let (categories, mut report) =
            merge_categories(previous.map(|s| &s.data.categories), &extraction);

        let baseline = seed_map(previous.map(CacheSnapshot::map), extraction.get(Category::Map));
        let now = self.clock.now_unix_ms();
        let map_information = self
            .prober
            .probe(&self.config.minimap_path, Some(&baseline), now);
        report.map_ready = map_information.data.ready;

        debug!(
            "Refresh merged: advanced={:?} stale={:?} map_ready={}",
            report.advanced, report.stale, report.map_ready
        );

        let data = SnapshotData {
            categories,
            map_information,
        };
        Ok((CacheSnapshot::new(data, now), report))
    }
}

/// Keep-newest merge of every non-map category.
pub fn merge_categories(
    previous: Option<&BTreeMap<Category, CategoryPayload>>,
    extraction: &Extraction,
) -> (BTreeMap<Category, CategoryPayload>, MergeReport) {
    let mut merged = previous.cloned().unwrap_or_default();
    let mut report = MergeReport::default();

    for (&category, payload) in &extraction.payloads {
        if category.is_map() {
            continue;
        }

        let replace = match merged.get(&category) {
            Some(retained) => payload.is_newer_than(retained),
            None => true,
        };

        if replace {
            merged.insert(category, payload.clone());
            report.advanced.push(category);
        } else {
            report.stale.push(category);
        }
    }

    (merged, report)
}

/// Baseline for the minimap probe: the previous map state, advanced to the
/// log's `map_information` record when that record is newer.
pub fn seed_map(
    previous: Option<&MapInformation>,
    logged: Option<&CategoryPayload>,
) -> MapInformation {
    let mut baseline = previous.cloned().unwrap_or_default();

    if let Some(logged) = logged
        && (previous.is_none() || logged.timestamp > baseline.timestamp)
    {
        baseline.timestamp = logged.timestamp;
        if let Some(tiles) = logged.data.get("numTiles").and_then(|v| v.as_u64()) {
            baseline.data.num_tiles = tiles;
        }
    }

    baseline
}

// ============================================================================
// Tests
// ============================================================================
