//! Segment Writer
//!
//! Streams sorted cells into a new segment file in a single forward pass.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::cell::{Cell, Value};
use crate::error::{Result, StrataError};

use super::SegmentMeta;

/// Builder for creating new segments from sorted, de-duplicated cells
pub struct SegmentWriter {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Start of each record within the record region
    offsets: Vec<u32>,
    /// Current write position inside the record region
    current_offset: u64,
    /// Last key written, to reject unsorted input
    last_key: Option<Bytes>,
}

impl SegmentWriter {
    /// Create a segment writer, truncating any stale file at `path`.
    ///
    /// Call `add()` in strictly ascending key order, then `finish()` to
    /// append the offset table and row count.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            offsets: Vec::new(),
            current_offset: 0,
            last_key: None,
        })
    }

    /// Append one record
    pub fn add(&mut self, cell: &Cell) -> Result<()> {
        let key = cell.key();
        if let Some(last) = &self.last_key {
            if key <= last {
                return Err(StrataError::OutOfOrderKey);
            }
        }

        // Tombstones are stored negated, so they need a strictly positive stamp
        let stored_timestamp = match cell.value() {
            Value::Present { timestamp, .. } if *timestamp >= 0 => *timestamp,
            Value::Tombstone { timestamp } if *timestamp > 0 => -*timestamp,
            other => return Err(StrataError::InvalidTimestamp(other.timestamp())),
        };

        let offset = to_u32(self.current_offset)?;
        let key_len = to_u32(key.len() as u64)?;

        self.writer.write_all(&key_len.to_be_bytes())?;
        self.writer.write_all(key)?;
        self.writer.write_all(&stored_timestamp.to_be_bytes())?;

        // Record size so far: 4 + key + 8
        let mut record_size = 12 + key.len() as u64;

        if let Value::Present { data, .. } = cell.value() {
            let value_len = to_u32(data.len() as u64)?;
            self.writer.write_all(&value_len.to_be_bytes())?;
            self.writer.write_all(data)?;
            record_size += 4 + data.len() as u64;
        }

        self.offsets.push(offset);
        self.current_offset += record_size;
        self.last_key = Some(key.clone());

        Ok(())
    }

    /// Finish building: write offset table, row count, and fsync
    pub fn finish(mut self) -> Result<SegmentMeta> {
        let row_count = to_u32(self.offsets.len() as u64)?;

        for offset in &self.offsets {
            self.writer.write_all(&offset.to_be_bytes())?;
        }
        self.writer.write_all(&row_count.to_be_bytes())?;

        self.writer.flush()?;
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        Ok(SegmentMeta {
            path: self.path,
            row_count,
            file_size,
        })
    }
}

/// Write a whole ascending cell sequence to `path`
pub fn write_segment<I>(path: &Path, cells: I) -> Result<SegmentMeta>
where
    I: IntoIterator<Item = Cell>,
{
    let mut writer = SegmentWriter::create(path)?;
    for cell in cells {
        writer.add(&cell)?;
    }
    writer.finish()
}

fn to_u32(n: u64) -> Result<u32> {
    u32::try_from(n).map_err(|_| StrataError::SegmentTooLarge(n))
}
