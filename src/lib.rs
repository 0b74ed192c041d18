//! # StrataKV
//!
//! An embeddable, single-process, ordered key-value store built on the
//! log-structured-merge pattern:
//! - A mutable in-memory buffer absorbs writes
//! - Full buffers are flushed into immutable, sorted, memory-mapped segments
//! - Reads merge the buffer and every segment into one ascending view
//! - Segments are published by atomic rename, never observed half-written
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                             │
//! │       upsert / remove / iter / get / flush / close          │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │ writes                       │ scans
//!                ▼                              ▼
//!         ┌─────────────┐              ┌─────────────────┐
//!         │  MemTable   │─────────────▶│  MergeIterator  │
//!         │ (BTreeMap)  │              │ Collapse / Scan │
//!         └──────┬──────┘              └────────▲────────┘
//!                │ flush (temp + rename)        │
//!                ▼                              │
//!         ┌─────────────┐                       │
//!         │  Segments   │───────────────────────┘
//!         │ (mmap, gen) │
//!         └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use stratakv::{Config, Engine};
//!
//! # fn main() -> stratakv::Result<()> {
//! let config = Config::builder()
//!     .data_dir("/tmp/strata")
//!     .create_if_missing(true)
//!     .flush_threshold(1024 * 1024)
//!     .build();
//!
//! let mut engine = Engine::open(config)?;
//! engine.upsert(b"apple", b"red")?;
//! engine.remove(b"banana")?;
//!
//! for pair in engine.iter(b"")? {
//!     let (key, data) = pair?;
//!     println!("{:?} => {:?}", key, data);
//! }
//!
//! engine.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod cell;
pub mod table;
pub mod memtable;
pub mod storage;
pub mod iterator;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use cell::{Cell, Timestamp, Value};
pub use config::Config;
pub use engine::Engine;
pub use error::{Result, StrataError};
pub use iterator::Scan;
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
