//! Error types for StrataKV
//!
//! Provides a unified error type for all operations. The engine is fail-fast:
//! nothing here is retried internally, every variant reaches the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for StrataKV operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Segment Format Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt segment {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Segment too large: {0} does not fit in a 4-byte field")]
    SegmentTooLarge(u64),

    #[error("Timestamp {0} cannot be encoded for this record")]
    InvalidTimestamp(i64),

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Segments are immutable: {0} is not supported")]
    ReadOnlySegment(&'static str),

    #[error("Tombstone carries no data")]
    TombstoneData,

    #[error("Row {row} out of range for segment with {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("Keys must be written strictly ascending")]
    OutOfOrderKey,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// Shorthand for a corruption error on `path`
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StrataError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
