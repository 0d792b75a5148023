//! Data carried through a refresh cycle.
//!
//! - [`Category`] / [`CategorySet`] name what is tracked
//! - [`CategoryPayload`] is the producer's `{timestamp, data}` pair
//! - [`MapInformation`] extends the map category with minimap fields
//! - [`CacheSnapshot`] is the immutable view readers receive

mod category;
mod map;
mod payload;
mod snapshot;

pub use category::{Category, CategorySet};
pub use map::{MapData, MapInformation};
pub use payload::{CategoryPayload, LogRecord};
pub use snapshot::{CacheSnapshot, SnapshotData};
