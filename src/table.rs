//! Table abstraction
//!
//! The capability set shared by the MemTable and on-disk segments. The engine
//! only talks to its sources through this trait when building a scan.

use crate::cell::Cell;
use crate::error::Result;

/// Lazy ascending sequence of cells produced by a table
pub type CellIter<'a> = Box<dyn Iterator<Item = Result<Cell>> + 'a>;

/// A sorted source of cells
pub trait Table {
    /// Approximate footprint in bytes (0 for tables that do not track it)
    fn size_in_bytes(&self) -> usize;

    /// Cells with key >= `from`, ascending by key
    fn cells_from<'a>(&'a self, from: &[u8]) -> Result<CellIter<'a>>;

    /// Insert or overwrite `key` with live `data`
    fn upsert(&mut self, key: &[u8], data: &[u8]) -> Result<()>;

    /// Record a tombstone for `key`
    fn remove(&mut self, key: &[u8]) -> Result<()>;
}
