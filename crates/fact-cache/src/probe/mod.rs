//! Minimap probing: dimension readers, clocks and the debounced prober.

mod clock;
mod dimensions;
mod minimap;

pub use clock::{Clock, ManualClock, SystemClock, unix_ms};
pub use dimensions::{DimensionReader, ImageHeaderReader};
pub use minimap::{DEFAULT_DEBOUNCE_WINDOW, MinimapProber};

#[cfg(test)]
pub(crate) use dimensions::tests::png_header;
