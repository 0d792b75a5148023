//! Immutable cache snapshot handed to readers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Category, CategoryPayload, MapInformation};

/// A fully-formed view of the cache, published whole and never mutated.
///
/// Serializes as `{ "timestamp": <produced at>, "data": { "<category key>": .. } }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub data: SnapshotData,
    #[serde(rename = "timestamp")]
    pub produced_at_unix_ms: i64,
}

/// Per-category contents of a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SnapshotData {
    /// Every category except `Map`.
    #[serde(flatten)]
    pub categories: BTreeMap<Category, CategoryPayload>,
    pub map_information: MapInformation,
}

impl CacheSnapshot {
    pub fn new(data: SnapshotData, produced_at_unix_ms: i64) -> Self {
        Self {
            data,
            produced_at_unix_ms,
        }
    }

    /// Retained payload for a non-map category.
    pub fn get(&self, category: Category) -> Option<&CategoryPayload> {
        self.data.categories.get(&category)
    }

    /// Retained timestamp for any category, including `Map`.
    pub fn timestamp(&self, category: Category) -> Option<u64> {
        if category.is_map() {
            Some(self.data.map_information.timestamp)
        } else {
            self.get(category).map(|payload| payload.timestamp)
        }
    }

    pub fn map(&self) -> &MapInformation {
        &self.data.map_information
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_categories_under_log_keys() {
        let mut data = SnapshotData::default();
        data.categories
            .insert(Category::Player, CategoryPayload::new(5, "C"));
        let snapshot = CacheSnapshot::new(data, 42);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["timestamp"], json!(42));
        assert_eq!(
            value["data"]["player_information"],
            json!({"timestamp": 5, "data": "C"})
        );
        assert_eq!(value["data"]["map_information"]["timestamp"], json!(0));
        assert!(value["data"].get("train_information").is_none());
    }

    #[test]
    fn timestamp_covers_map() {
        let mut data = SnapshotData::default();
        data.map_information.timestamp = 7;
        let snapshot = CacheSnapshot::new(data, 0);

        assert_eq!(snapshot.timestamp(Category::Map), Some(7));
        assert_eq!(snapshot.timestamp(Category::Train), None);
    }
}
