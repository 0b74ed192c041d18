//! Storage Module
//!
//! Persistent storage layer built from immutable, memory-mapped segments.
//!
//! ## Responsibilities
//! - Serialize a sorted MemTable into a new segment (write temp, then rename)
//! - Binary search and lazy scans over mapped segment bytes
//! - Discover committed segments on startup and track generations
//!
//! ## File Layout
//! ```text
//! {data_dir}/
//!   ├── 0.dat      committed segment, generation 0
//!   ├── 1.dat      committed segment, generation 1
//!   └── 2.tmp      flush in progress (renamed to 2.dat when complete)
//! ```

mod manager;
mod segment;

pub use manager::{SegmentManager, SEGMENT_EXTENSION, TEMP_EXTENSION};
pub use segment::{write_segment, Segment, SegmentIter, SegmentMeta, SegmentWriter};
