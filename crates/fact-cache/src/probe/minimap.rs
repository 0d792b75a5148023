//! Debounced minimap probe.
//!
//! The producer rewrites the minimap image in place, often in many small
//! writes. Reading its header on every refresh while that happens both wastes
//! work and reports dimensions of a half-written file, so the prober:
//!
//! 1. short-circuits when size and mtime match the last successful read,
//! 2. otherwise reads the header only if the size moved since the last check
//!    or the debounce window elapsed,
//! 3. reports `ready = false` whenever the result may be stale.
//!
//! All debounce state lives in [`MapData`](crate::model::MapData), carried
//! from one refresh to the next.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::clock::unix_ms;
use super::dimensions::{DimensionReader, ImageHeaderReader};
use crate::error::ProbeError;
use crate::model::MapInformation;

/// Default minimum time between header reads of an unchanged-size file.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Probes the minimap file and derives [`MapInformation`].
#[derive(Clone)]
pub struct MinimapProber {
    reader: Arc<dyn DimensionReader>,
    debounce_window: Duration,
}

impl Default for MinimapProber {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl MinimapProber {
    pub fn new(debounce_window: Duration) -> Self {
        Self {
            reader: Arc::new(ImageHeaderReader),
            debounce_window,
        }
    }

    /// Replace the dimension reader.
    pub fn with_reader(mut self, reader: Arc<dyn DimensionReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce_window
    }

    /// Derive the current minimap state from `previous` and the file at `path`.
    ///
    /// Never fails: an unreadable file or header yields `ready = false` with
    /// the previous resolution kept.
    pub fn probe(
        &self,
        path: &Path,
        previous: Option<&MapInformation>,
        now_unix_ms: i64,
    ) -> MapInformation {
        let mut info = previous.cloned().unwrap_or_default();

        let (size, modified) = match stat(path) {
            Ok(observed) => observed,
            Err(e) => {
                warn!("Minimap unavailable: {}", e);
                info.data.ready = false;
                return info;
            }
        };

        if info.matches_source(size, modified) {
            info.data.ready = true;
        } else if self.should_read(&info, size, now_unix_ms) {
            match self.reader.read_dimensions(path) {
                Ok(resolution) => {
                    debug!(
                        "Minimap {} is {}x{} ({} bytes)",
                        path.display(),
                        resolution.0,
                        resolution.1,
                        size
                    );
                    info.data.resolution = resolution;
                    info.data.size_bytes = size;
                    info.data.source_modified_at_unix_ms = modified;
                    info.data.ready = true;
                }
                Err(e) => {
                    warn!("Minimap not ready: {}", e);
                    info.data.ready = false;
                }
            }
        } else {
            debug!(
                "Minimap read debounced: size={} last_checked_at={}",
                size, info.data.last_checked_at_unix_ms
            );
            info.data.ready = false;
        }

        info.data.last_checked_size_bytes = size;
        info.data.last_checked_at_unix_ms = now_unix_ms;
        info
    }

    fn should_read(&self, info: &MapInformation, size: u64, now_unix_ms: i64) -> bool {
        let elapsed = now_unix_ms.saturating_sub(info.data.last_checked_at_unix_ms);
        size != info.data.last_checked_size_bytes
            || elapsed >= self.debounce_window.as_millis() as i64
    }
}

fn stat(path: &Path) -> Result<(u64, i64), ProbeError> {
    let metadata_error = |source| ProbeError::Metadata {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(metadata_error)?;
    let modified = metadata.modified().map_err(metadata_error)?;
    Ok((metadata.len(), unix_ms(modified)))
}

// ============================================================================
// Tests
// ============================================================================
