//! Backward line reader for growing, line-delimited logs.
//!
//! Walks the file in fixed-size blocks from end-of-file toward offset 0,
//! prepending each block to the partial line carried over from the block
//! after it. Lines therefore come out in true whole-file reverse order, also
//! when they straddle block boundaries.
//!
//! The reader is format agnostic: it hands out raw line text and leaves
//! parsing to the caller.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ReadError;

/// Default block size for backward reads (64 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Outcome of a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Lines handed to the visitor.
    pub lines_visited: u64,
    /// Bytes read from disk.
    pub bytes_read: u64,
    /// The visitor asked to stop before offset 0 was reached.
    pub stopped_early: bool,
}

/// A single backward pass over one file.
///
/// The file length is captured on open; bytes appended afterwards belong to
/// the next session.
pub struct ReverseLineReader {
    file: File,
    path: PathBuf,
    /// Start offset of the next block to read (everything before is unread).
    position: u64,
    block_size: usize,
}

impl ReverseLineReader {
    /// Open `path` for a backward scan.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|source| ReadError::Open {
            path: path.clone(),
            source,
        })?;
        let file_size = file
            .metadata()
            .map_err(|source| ReadError::Open {
                path: path.clone(),
                source,
            })?
            .len();

        Ok(Self {
            file,
            path,
            position: file_size,
            block_size: DEFAULT_BLOCK_SIZE,
        })
    }

    /// Override the block size. Values below 1 are clamped to 1.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// File length captured when the session was opened.
    pub fn len(&self) -> u64 {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Visit every non-blank line from the last to the first.
    ///
    /// `visit` returns `false` to stop the scan; the file handle is released
    /// as soon as this method returns. A trailing `\r` is stripped and
    /// invalid UTF-8 is replaced lossily.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Read`] if a block cannot be read. Lines already
    /// delivered are not revisited.
    pub fn for_each_line_from_end<F>(mut self, mut visit: F) -> Result<ScanSummary, ReadError>
    where
        F: FnMut(&str) -> bool,
    {
        let mut summary = ScanSummary::default();
        // Fragments of the line that straddles the current block boundary,
        // in reverse file order. None of them contains a newline.
        let mut carry: Vec<Vec<u8>> = Vec::new();
        let buf_len = usize::try_from(self.position)
            .map_or(self.block_size, |len| self.block_size.min(len));
        let mut buf = vec![0u8; buf_len];

        while self.position > 0 {
            let read_len = (self.block_size as u64).min(self.position) as usize;
            let offset = self.position - read_len as u64;

            let block = &mut buf[..read_len];
            self.read_block(offset, block)?;
            self.position = offset;
            summary.bytes_read += read_len as u64;

            let mut end = read_len;
            while let Some(newline) = block[..end].iter().rposition(|b| *b == b'\n') {
                let line = join_line(&block[newline + 1..end], &mut carry);
                if !deliver(&line, &mut visit, &mut summary) {
                    summary.stopped_early = true;
                    self.finish(&summary);
                    return Ok(summary);
                }
                end = newline;
            }

            if end > 0 {
                carry.push(block[..end].to_vec());
            }
        }

        // Whatever precedes the first newline is the first line of the file.
        let first = join_line(&[], &mut carry);
        if !deliver(&first, &mut visit, &mut summary) {
            summary.stopped_early = true;
        }

        self.finish(&summary);
        Ok(summary)
    }

    fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), ReadError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(buf))
            .map_err(|source| ReadError::Read {
                path: self.path.clone(),
                offset,
                source,
            })
    }

    fn finish(&self, summary: &ScanSummary) {
        debug!(
            "Reverse scan of {}: {} lines, {} bytes, stopped_early={}",
            self.path.display(),
            summary.lines_visited,
            summary.bytes_read,
            summary.stopped_early
        );
    }
}

/// Complete a line: `head` followed by the carried fragments in file order.
/// Drains `carry`.
fn join_line<'a>(head: &'a [u8], carry: &mut Vec<Vec<u8>>) -> Cow<'a, [u8]> {
    if carry.is_empty() {
        return Cow::Borrowed(head);
    }

    let total = head.len() + carry.iter().map(Vec::len).sum::<usize>();
    let mut line = Vec::with_capacity(total);
    line.extend_from_slice(head);
    for fragment in carry.drain(..).rev() {
        line.extend_from_slice(&fragment);
    }
    Cow::Owned(line)
}

/// Hand one raw line to the visitor. Blank lines are skipped and count as
/// "continue".
fn deliver<F>(raw: &[u8], visit: &mut F, summary: &mut ScanSummary) -> bool
where
    F: FnMut(&str) -> bool,
{
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line: Cow<'_, str> = String::from_utf8_lossy(raw);
    if line.trim().is_empty() {
        return true;
    }

    summary.lines_visited += 1;
    visit(&line)
}

/// Last `count` non-blank lines of `path`, in forward (file) order.
pub fn last_lines(path: impl AsRef<Path>, count: usize) -> Result<Vec<String>, ReadError> {
    let mut lines = Vec::with_capacity(count);
    if count == 0 {
        return Ok(lines);
    }

    ReverseLineReader::open(path)?.for_each_line_from_end(|line| {
        lines.push(line.to_string());
        lines.len() < count
    })?;

    lines.reverse();
    Ok(lines)
}

// ============================================================================
// Tests
// ============================================================================
