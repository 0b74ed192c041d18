//! Segment Manager
//!
//! Owns the committed segments of one storage directory.
//!
//! ## Responsibilities
//! - Discover existing segment files on startup
//! - Hand out segments newest → oldest for scans
//! - Turn a MemTable into a new segment (temp file + atomic rename)
//! - Assign generation numbers, never reusing one

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};
use crate::memtable::MemTable;

use super::{write_segment, Segment, SegmentMeta};

/// Extension of committed segment files
pub const SEGMENT_EXTENSION: &str = "dat";

/// Extension of segment files still being written
pub const TEMP_EXTENSION: &str = "tmp";

/// Manages the segments of a storage directory
///
/// Single-writer: all mutation goes through `&mut self`, no locking.
#[derive(Debug)]
pub struct SegmentManager {
    /// Directory where segments are stored
    data_dir: PathBuf,

    /// Open segments keyed by generation
    segments: BTreeMap<u64, Segment>,

    /// Generation the next flush will use
    next_generation: u64,
}

impl SegmentManager {
    /// Open the segments stored in `path`
    ///
    /// On startup:
    /// 1. Enumerate files with the committed extension
    /// 2. Parse the generation from each name
    /// 3. Open each (validates footer and offsets)
    /// 4. Next generation = max + 1, or 0 if there are none
    ///
    /// A committed file that fails to open aborts recovery, as does a highest
    /// generation of `u64::MAX`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut segments = BTreeMap::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();

            if !entry.file_type()?.is_file() {
                continue;
            }
            if file_path.extension().and_then(|e| e.to_str()) != Some(SEGMENT_EXTENSION) {
                continue;
            }

            let Some(generation) = Self::parse_generation(&file_path) else {
                tracing::warn!(path = %file_path.display(), "skipping segment with unparsable generation");
                continue;
            };

            let segment = Segment::open(&file_path)?;
            tracing::debug!(
                generation,
                rows = segment.row_count(),
                bytes = segment.file_size(),
                "recovered segment"
            );
            segments.insert(generation, segment);
        }

        let next_generation = match segments.iter().next_back() {
            Some((&generation, segment)) => generation.checked_add(1).ok_or_else(|| {
                StrataError::corrupt(segment.path(), "no generation left after this segment")
            })?,
            None => 0,
        };

        tracing::info!(
            dir = %path.display(),
            segments = segments.len(),
            next_generation,
            "storage recovered"
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            segments,
            next_generation,
        })
    }

    /// Write `memtable` to a new segment and register it
    ///
    /// The file is written under a temporary name, synced, then renamed to its
    /// committed name. On failure nothing is registered, the generation is not
    /// consumed, and a temporary file may be left behind.
    pub fn flush(&mut self, memtable: &MemTable) -> Result<SegmentMeta> {
        let generation = self.next_generation;
        let temp_path = self.temp_path(generation);
        let final_path = self.segment_path(generation);

        let meta = write_segment(&temp_path, memtable.iter())?;

        fs::rename(&temp_path, &final_path)?;
        sync_dir(&self.data_dir)?;
        tracing::debug!(from = %temp_path.display(), to = %final_path.display(), "segment committed");

        let segment = Segment::open(&final_path)?;
        self.segments.insert(generation, segment);
        self.next_generation += 1;

        tracing::info!(
            generation,
            rows = meta.row_count,
            bytes = meta.file_size,
            "flushed memtable"
        );

        Ok(SegmentMeta {
            path: final_path,
            ..meta
        })
    }

    /// Segments ordered newest generation first
    pub fn newest_first(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.values().rev()
    }

    /// Segment registered under `generation`
    pub fn segment(&self, generation: u64) -> Option<&Segment> {
        self.segments.get(&generation)
    }

    /// Registered generations, ascending
    pub fn generations(&self) -> Vec<u64> {
        self.segments.keys().copied().collect()
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Generation the next flush will be written under
    pub fn next_generation(&self) -> u64 {
        self.next_generation
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn segment_path(&self, generation: u64) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", generation, SEGMENT_EXTENSION))
    }

    fn temp_path(&self, generation: u64) -> PathBuf {
        self.data_dir.join(format!("{}.{}", generation, TEMP_EXTENSION))
    }

    /// Parse the generation from a committed filename
    /// "42.dat" → Some(42), "042.dat" / "+4.dat" / "x.dat" → None
    fn parse_generation(path: &Path) -> Option<u64> {
        let stem = path.file_stem()?.to_str()?;
        let generation: u64 = stem.parse().ok()?;
        (generation.to_string() == stem).then_some(generation)
    }
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
