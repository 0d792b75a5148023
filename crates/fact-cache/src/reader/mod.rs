//! Fact log readers.
//!
//! [`ReverseLineReader`] walks a file backward line by line;
//! [`LatestRecordExtractor`] builds on it to find the newest record per
//! category without reading the whole log.

mod extract;
mod reverse;

pub use extract::{Extraction, LatestRecordExtractor};
pub use reverse::{DEFAULT_BLOCK_SIZE, ReverseLineReader, ScanSummary, last_lines};
