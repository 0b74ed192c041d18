//! Segment Module
//!
//! Immutable on-disk sorted table. Records are laid out back to back, followed
//! by a footer holding one offset per record and the row count, so any row can
//! be reached without a separate index file.
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Record Region (variable)                                      │
//! │   [KeyLen: u32][Key][Timestamp: i64]                          │
//! │   [ValLen: u32][Value]   (only when Timestamp >= 0)           │
//! │   ... repeated for each row, strictly ascending by key ...    │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Offset Table (4 * RowCount)                                   │
//! │   [Offset: u32] start of each record within the region        │
//! ├───────────────────────────────────────────────────────────────┤
//! │ RowCount: u32 (4)                                             │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. A negative timestamp marks a tombstone; its
//! magnitude is the real timestamp and the value fields are omitted.

mod iterator;
mod reader;
mod writer;

use std::path::PathBuf;

pub use iterator::SegmentIter;
pub use reader::Segment;
pub use writer::{write_segment, SegmentWriter};

// =============================================================================
// Shared Constants (used by writer, reader)
// =============================================================================

/// Width of every length, offset and count field
pub(crate) const U32_SIZE: usize = 4;

/// Width of the signed timestamp field
pub(crate) const TIMESTAMP_SIZE: usize = 8;

/// Trailing row count
pub(crate) const FOOTER_SIZE: usize = U32_SIZE;

// =============================================================================
// Segment Metadata
// =============================================================================

/// Summary of a freshly written segment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMeta {
    /// Path the writer produced
    pub path: PathBuf,
    /// Number of records
    pub row_count: u32,
    /// File size in bytes
    pub file_size: u64,
}

// =============================================================================
// Codec Helpers
// =============================================================================

pub(crate) fn get_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at.checked_add(U32_SIZE)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

pub(crate) fn get_i64(buf: &[u8], at: usize) -> Option<i64> {
    let bytes = buf.get(at..at.checked_add(TIMESTAMP_SIZE)?)?;
    Some(i64::from_be_bytes(bytes.try_into().ok()?))
}
