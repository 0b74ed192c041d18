//! Segment Reader
//!
//! Maps a segment file read-only and decodes rows straight out of the mapping.

use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;

use crate::cell::{Cell, Value};
use crate::error::{Result, StrataError};
use crate::table::{CellIter, Table};

use super::iterator::SegmentIter;
use super::{get_i64, get_u32, FOOTER_SIZE, TIMESTAMP_SIZE, U32_SIZE};

/// An opened, immutable segment
///
/// `records` and `offsets` are slices of one `Bytes` that owns the mapping, so
/// the mapping lives until the segment and every cell decoded from it are gone.
pub struct Segment {
    path: PathBuf,
    /// Record region
    records: Bytes,
    /// Offset table, `rows * 4` bytes
    offsets: Bytes,
    rows: usize,
    file_size: u64,
}

impl Segment {
    /// Open a segment for reading
    ///
    /// Validates the footer and every offset before returning, so later
    /// lookups never index outside the mapping.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < FOOTER_SIZE as u64 {
            return Err(StrataError::corrupt(
                path,
                format!("file is {} bytes, smaller than the footer", file_size),
            ));
        }

        // SAFETY: committed segments are never written again after the rename
        // that publishes them, and the mapping is read-only.
        let mmap = unsafe { Mmap::map(&file)? };
        let data = Bytes::from_owner(mmap);
        let len = data.len();

        let footer_start = len - FOOTER_SIZE;
        let rows = get_u32(&data, footer_start)
            .ok_or_else(|| StrataError::corrupt(path, "unreadable row count"))?
            as usize;

        let index_len = rows
            .checked_mul(U32_SIZE)
            .filter(|&n| n <= footer_start)
            .ok_or_else(|| {
                StrataError::corrupt(path, format!("row count {} exceeds file size {}", rows, len))
            })?;

        let index_start = footer_start - index_len;
        let segment = Self {
            path: path.to_path_buf(),
            records: data.slice(..index_start),
            offsets: data.slice(index_start..footer_start),
            rows,
            file_size,
        };
        segment.validate_offsets()?;

        Ok(segment)
    }

    /// Offsets must start at 0, be strictly ascending and point inside the
    /// record region
    fn validate_offsets(&self) -> Result<()> {
        let mut previous: Option<usize> = None;
        for row in 0..self.rows {
            let offset = self.offset(row)?;
            if row == 0 && offset != 0 {
                return Err(self.corrupt(format!(
                    "first record starts at offset {} instead of 0",
                    offset
                )));
            }
            if offset >= self.records.len() {
                return Err(self.corrupt(format!(
                    "offset {} of row {} outside record region of {} bytes",
                    offset,
                    row,
                    self.records.len()
                )));
            }
            if previous.is_some_and(|p| offset <= p) {
                return Err(self.corrupt(format!("offset of row {} is not ascending", row)));
            }
            previous = Some(offset);
        }
        Ok(())
    }

    // =========================================================================
    // Row Access
    // =========================================================================

    /// Decode only the key of `row`
    pub fn key_at(&self, row: usize) -> Result<&[u8]> {
        let (start, end) = self.span(row)?;
        let record = &self.records[start..end];
        let key_end = self.key_end(record, row)?;
        Ok(&record[U32_SIZE..key_end])
    }

    /// Decode `row` fully. Key and data are zero-copy slices of the mapping.
    pub fn cell_at(&self, row: usize) -> Result<Cell> {
        let (start, end) = self.span(row)?;
        let record = &self.records[start..end];
        let key_end = self.key_end(record, row)?;
        let key = self.records.slice(start + U32_SIZE..start + key_end);

        let timestamp = get_i64(record, key_end)
            .ok_or_else(|| self.corrupt(format!("row {} truncated before timestamp", row)))?;
        let value_start = key_end + TIMESTAMP_SIZE;

        if timestamp < 0 {
            let timestamp = timestamp
                .checked_neg()
                .ok_or_else(|| self.corrupt(format!("row {} has unrepresentable timestamp", row)))?;
            self.expect_end(record, value_start, row)?;
            return Ok(Cell::new(key, Value::tombstone_at(timestamp)));
        }

        let value_len = get_u32(record, value_start)
            .ok_or_else(|| self.corrupt(format!("row {} truncated before value length", row)))?
            as usize;
        let data_start = value_start + U32_SIZE;
        let data_end = data_start
            .checked_add(value_len)
            .filter(|&e| e <= record.len())
            .ok_or_else(|| self.corrupt(format!("row {} value runs past its record", row)))?;
        self.expect_end(record, data_end, row)?;

        let data = self.records.slice(start + data_start..start + data_end);
        Ok(Cell::new(key, Value::present_at(timestamp, data)))
    }

    /// Smallest row whose key is >= `from`, or `row_count()` if none
    pub fn position(&self, from: &[u8]) -> Result<usize> {
        let mut low = 0;
        let mut high = self.rows;
        while low < high {
            let mid = low + (high - low) / 2;
            if self.key_at(mid)? < from {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        Ok(low)
    }

    /// Lazily iterate rows with key >= `from`
    pub fn iter_from(&self, from: &[u8]) -> Result<SegmentIter<'_>> {
        Ok(SegmentIter::new(self, self.position(from)?))
    }

    /// Lazily iterate every row
    pub fn iter(&self) -> SegmentIter<'_> {
        SegmentIter::new(self, 0)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn offset(&self, row: usize) -> Result<usize> {
        get_u32(&self.offsets, row * U32_SIZE)
            .map(|o| o as usize)
            .ok_or_else(|| self.corrupt(format!("missing offset for row {}", row)))
    }

    /// Byte range of `row` within the record region
    fn span(&self, row: usize) -> Result<(usize, usize)> {
        if row >= self.rows {
            return Err(StrataError::RowOutOfRange {
                row,
                rows: self.rows,
            });
        }
        let start = self.offset(row)?;
        let end = if row + 1 < self.rows {
            self.offset(row + 1)?
        } else {
            self.records.len()
        };
        Ok((start, end))
    }

    /// End of the key bytes within `record`
    fn key_end(&self, record: &[u8], row: usize) -> Result<usize> {
        let key_len = get_u32(record, 0)
            .ok_or_else(|| self.corrupt(format!("row {} truncated before key length", row)))?
            as usize;
        U32_SIZE
            .checked_add(key_len)
            .filter(|&e| e <= record.len())
            .ok_or_else(|| self.corrupt(format!("row {} key runs past its record", row)))
    }

    fn expect_end(&self, record: &[u8], end: usize, row: usize) -> Result<()> {
        if end == record.len() {
            Ok(())
        } else {
            Err(self.corrupt(format!(
                "row {} decodes to {} bytes but spans {}",
                row,
                end,
                record.len()
            )))
        }
    }

    fn corrupt(&self, reason: String) -> StrataError {
        StrataError::corrupt(&self.path, reason)
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .field("file_size", &self.file_size)
            .finish()
    }
}

impl Table for Segment {
    /// Segments report their on-disk size
    fn size_in_bytes(&self) -> usize {
        usize::try_from(self.file_size).unwrap_or(usize::MAX)
    }

    fn cells_from<'a>(&'a self, from: &[u8]) -> Result<CellIter<'a>> {
        Ok(Box::new(self.iter_from(from)?))
    }

    fn upsert(&mut self, _key: &[u8], _data: &[u8]) -> Result<()> {
        Err(StrataError::ReadOnlySegment("upsert"))
    }

    fn remove(&mut self, _key: &[u8]) -> Result<()> {
        Err(StrataError::ReadOnlySegment("remove"))
    }
}
