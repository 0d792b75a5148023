//! Minimap state carried in the `map_information` category.

use serde::{Deserialize, Serialize};

/// Minimap payload: the producer's timestamp plus fields derived from the
/// image file on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInformation {
    pub timestamp: u64,
    pub data: MapData,
}

/// Derived minimap fields and the prober's debounce state.
///
/// `ready` is true only when `resolution` reflects the file as of
/// `source_modified_at_unix_ms` / `size_bytes`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    /// `(width, height)` in pixels.
    pub resolution: (u32, u32),
    pub num_tiles: u64,
    pub size_bytes: u64,
    pub last_checked_size_bytes: u64,
    pub last_checked_at_unix_ms: i64,
    pub source_modified_at_unix_ms: i64,
    pub ready: bool,
}

impl MapInformation {
    /// Whether dimensions were ever read successfully.
    pub fn has_resolution(&self) -> bool {
        self.data.source_modified_at_unix_ms != 0 || self.data.size_bytes != 0
    }

    /// Whether `size`/`modified` describe the same file state as the last
    /// successful read.
    pub fn matches_source(&self, size: u64, modified_unix_ms: i64) -> bool {
        self.has_resolution()
            && self.data.size_bytes == size
            && self.data.source_modified_at_unix_ms == modified_unix_ms
    }
}
