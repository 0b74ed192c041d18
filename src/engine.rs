//! Engine Module
//!
//! The storage engine that coordinates the MemTable and the segments.
//!
//! ## Responsibilities
//! - Route writes to the MemTable and flush inline once it is full
//! - Merge every source into one ascending, de-duplicated, live view
//! - Recover committed segments on startup
//! - Flush whatever is left on close

use std::fs;
use std::path::Path;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::iterator::{MergeIterator, Scan};
use crate::memtable::MemTable;
use crate::storage::{SegmentManager, SegmentMeta};
use crate::table::{CellIter, Table};

/// The main storage engine
///
/// ## Concurrency Model: single logical writer
///
/// - Writes (`upsert`/`remove`/`flush`) take `&mut self`; flushes run
///   synchronously on the calling thread inside the write that triggers them.
/// - Scans take `&self` and borrow the engine for as long as they live, so a
///   write cannot clear the MemTable under a running scan.
/// - No internal locking. Share across threads behind an external mutex.
#[derive(Debug)]
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory table for recent writes
    memtable: MemTable,

    /// Committed segments, keyed by generation
    storage: SegmentManager,
}

impl Engine {
    /// Open an engine over `config.data_dir`
    ///
    /// On startup:
    /// 1. Check (or create) the data directory
    /// 2. Open every committed segment
    /// 3. Start with an empty MemTable
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: The directory must exist unless we were asked to create it
        if config.create_if_missing {
            fs::create_dir_all(&config.data_dir)?;
        } else if !config.data_dir.is_dir() {
            return Err(StrataError::Config(format!(
                "data directory {} does not exist",
                config.data_dir.display()
            )));
        }

        // Step 2: Recover segments (fails on any unreadable segment)
        let storage = SegmentManager::open(&config.data_dir)?;

        tracing::debug!(
            flush_threshold = config.flush_threshold,
            segments = storage.segment_count(),
            "engine opened"
        );

        Ok(Self {
            config,
            memtable: MemTable::new(),
            storage,
        })
    }

    /// Open with a path and flush threshold (convenience method)
    pub fn open_path(path: &Path, flush_threshold: usize) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .flush_threshold(flush_threshold)
            .build();
        Self::open(config)
    }

    /// Insert or overwrite a key
    ///
    /// Steps:
    /// 1. Write to MemTable
    /// 2. Flush if the footprint reached the threshold
    pub fn upsert(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let new_size = self.memtable.upsert(key, data);
        self.flush_if_full(new_size)
    }

    /// Delete a key by writing a tombstone
    ///
    /// Steps:
    /// 1. Write tombstone to MemTable
    /// 2. Flush if the footprint reached the threshold
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let new_size = self.memtable.remove(key);
        self.flush_if_full(new_size)
    }

    /// Live pairs with key >= `from`, ascending
    ///
    /// Sources are the MemTable followed by segments newest → oldest. For
    /// each key the newest timestamp wins; equal timestamps go to the earlier
    /// source. Tombstoned keys are skipped.
    pub fn iter(&self, from: &[u8]) -> Result<Scan<'_>> {
        let mut sources: Vec<CellIter<'_>> = Vec::with_capacity(self.storage.segment_count() + 1);
        sources.push(self.memtable.cells_from(from)?);
        for segment in self.storage.newest_first() {
            sources.push(segment.cells_from(from)?);
        }

        Ok(Scan::new(MergeIterator::new(sources)))
    }

    /// Get the live value of a key
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        match self.iter(key)?.next() {
            Some(Ok((found, data))) if found.as_ref() == key => Ok(Some(data)),
            Some(Err(e)) => Err(e),
            _ => Ok(None),
        }
    }

    /// Flush the MemTable to a new segment (no-op when empty)
    pub fn flush(&mut self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }
        self.flush_internal().map(|_| ())
    }

    /// Close the engine gracefully
    ///
    /// Flushes pending writes once, then drops every segment mapping.
    pub fn close(mut self) -> Result<()> {
        if self.memtable.entry_count() > 0 {
            self.flush_internal()?;
        }
        tracing::debug!(segments = self.storage.segment_count(), "engine closed");
        Ok(())
    }

    fn flush_if_full(&mut self, size: usize) -> Result<()> {
        if size >= self.config.flush_threshold {
            self.flush_internal()?;
        }
        Ok(())
    }

    /// MemTable is cleared only once the segment is committed and registered
    fn flush_internal(&mut self) -> Result<SegmentMeta> {
        let meta = self.storage.flush(&self.memtable)?;
        self.memtable.clear();
        Ok(meta)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.storage.segment_count()
    }

    /// Generation the next flush will use
    pub fn next_generation(&self) -> u64 {
        self.storage.next_generation()
    }

    /// Generations of all registered segments, ascending
    pub fn generations(&self) -> Vec<u64> {
        self.storage.generations()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
