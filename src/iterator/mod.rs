//! Iterator Module
//!
//! Read-path pipeline turning one sorted cell sequence per source into the
//! live `(key, data)` view:
//!
//! ```text
//!   memtable ─┐
//!   gen N ────┤   MergeIterator    Collapse          Scan
//!   gen N-1 ──┼─▶ (key, source) ─▶ one cell per ─▶  drop tombstones,
//!   ...       │   ascending        key, newest      project to pairs
//!   gen 0 ────┘
//! ```
//!
//! Each stage is lazy and single-pass. Only the merge heap holds more than one
//! cell at a time (one per source). The first error ends the pipeline.

mod merge;
mod scan;

pub use merge::MergeIterator;
pub use scan::{Collapse, Scan};
