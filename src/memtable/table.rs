//! MemTable implementation
//!
//! BTreeMap-based memtable with an incrementally maintained size counter.

use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

use bytes::Bytes;

use crate::cell::{Cell, Value};
use crate::error::Result;
use crate::table::{CellIter, Table};

/// In-memory table for recent writes
///
/// The footprint counter always equals the sum of key lengths plus the sum of
/// live payload lengths; tombstones contribute their key only.
#[derive(Debug, Default)]
pub struct MemTable {
    data: BTreeMap<Bytes, Value>,
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the latest value for a key (tombstones included)
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.data.get(key)
    }

    /// Insert or overwrite `key` with live data stamped now.
    ///
    /// Returns the footprint after the write.
    pub fn upsert(&mut self, key: &[u8], data: &[u8]) -> usize {
        self.apply(key, Value::present(Bytes::copy_from_slice(data)))
    }

    /// Record a tombstone for `key` stamped now.
    ///
    /// Returns the footprint after the write.
    pub fn remove(&mut self, key: &[u8]) -> usize {
        self.apply(key, Value::tombstone())
    }

    fn apply(&mut self, key: &[u8], value: Value) -> usize {
        let added = value.payload_len();
        match self.data.get_mut(key) {
            Some(existing) => {
                self.size = self.size - existing.payload_len() + added;
                *existing = value;
            }
            None => {
                self.size += key.len() + added;
                self.data.insert(Bytes::copy_from_slice(key), value);
            }
        }
        self.size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of distinct keys held
    pub fn entry_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate cells with key >= `from` in ascending key order
    pub fn iter_from(&self, from: &[u8]) -> MemTableIter<'_> {
        MemTableIter {
            inner: self
                .data
                .range::<[u8], _>((Bound::Included(from), Bound::Unbounded)),
        }
    }

    /// Iterate every cell in ascending key order (flush input)
    pub fn iter(&self) -> MemTableIter<'_> {
        self.iter_from(&[])
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&mut self) {
        self.data.clear();
        self.size = 0;
    }
}

impl Table for MemTable {
    fn size_in_bytes(&self) -> usize {
        self.size
    }

    fn cells_from<'a>(&'a self, from: &[u8]) -> Result<CellIter<'a>> {
        Ok(Box::new(self.iter_from(from).map(Ok)))
    }

    fn upsert(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        MemTable::upsert(self, key, data);
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<()> {
        MemTable::remove(self, key);
        Ok(())
    }
}

/// Iterator over MemTable entries
pub struct MemTableIter<'a> {
    inner: btree_map::Range<'a, Bytes, Value>,
}

impl Iterator for MemTableIter<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| Cell::new(key.clone(), value.clone()))
    }
}
