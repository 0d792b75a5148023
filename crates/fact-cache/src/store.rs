//! Swap-on-publish holder of the current snapshot.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::model::CacheSnapshot;

/// Single published reference shared by all readers.
///
/// Readers get an `Arc` to a complete snapshot and never lock; the refresh
/// worker replaces the whole reference on publish.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<CacheSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot, if any refresh has succeeded yet.
    pub fn load(&self) -> Option<Arc<CacheSnapshot>> {
        self.current.load_full()
    }

    /// Replace the published snapshot. Returns the shared reference.
    pub fn publish(&self, snapshot: CacheSnapshot) -> Arc<CacheSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotData;

    #[test]
    fn readers_keep_their_snapshot_across_publish() {
        let store = SnapshotStore::new();
        assert!(store.is_empty());

        let first = store.publish(CacheSnapshot::new(SnapshotData::default(), 1));
        let held = store.load().unwrap();
        assert!(Arc::ptr_eq(&first, &held));

        store.publish(CacheSnapshot::new(SnapshotData::default(), 2));
        assert_eq!(held.produced_at_unix_ms, 1);
        assert_eq!(store.load().unwrap().produced_at_unix_ms, 2);
    }
}
