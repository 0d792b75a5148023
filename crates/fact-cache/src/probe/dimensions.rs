//! Image dimension readers.

use std::path::Path;

use crate::error::ProbeError;

/// Reads `(width, height)` of an image file. This is the expensive step the
/// minimap prober debounces.
pub trait DimensionReader: Send + Sync + 'static {
    fn read_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError>;
}

/// Reads dimensions from the image header without decoding pixels.
///
/// A file that is mid-write usually has a truncated or inconsistent header
/// and yields [`ProbeError::Header`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageHeaderReader;

impl DimensionReader for ImageHeaderReader {
    fn read_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
        let header_error = |reason: String| ProbeError::Header {
            path: path.to_path_buf(),
            reason,
        };

        let size = imagesize::size(path).map_err(|e| header_error(e.to_string()))?;
        let width = u32::try_from(size.width)
            .map_err(|_| header_error(format!("width {} out of range", size.width)))?;
        let height = u32::try_from(size.height)
            .map_err(|_| header_error(format!("height {} out of range", size.height)))?;

        Ok((width, height))
    }
}
