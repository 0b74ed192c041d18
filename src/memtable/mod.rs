//! MemTable Module
//!
//! In-memory buffer for recent writes.
//!
//! ## Responsibilities
//! - Absorb upserts and removes, newest write per key wins in place
//! - Track an approximate byte footprint for flush triggers
//! - Ordered iteration from any key for scans and segment creation
//!
//! ## Data Structure Choice
//! A `BTreeMap<Bytes, Value>`:
//! - Ordered keys (required for segment generation and range scans)
//! - Byte-wise lexicographic ordering comes for free from `Bytes: Ord`
//! - No internal locking: the engine is single-writer and callers serialize access

mod table;

pub use table::{MemTable, MemTableIter};
