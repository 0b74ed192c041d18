//! Cell / Value model
//!
//! A [`Cell`] pairs a key with a [`Value`], which is either live data or a
//! tombstone. Both variants carry the wall-clock timestamp of the write that
//! produced them. Cells are the unit stored in the MemTable and in segments.

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::{Result, StrataError};

/// Nanoseconds since the Unix epoch
pub type Timestamp = i64;

/// Current wall-clock time as a [`Timestamp`].
///
/// Never returns less than 1: segments store tombstones as the negated
/// timestamp, so zero must stay reserved for live values.
pub fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(1)
        .max(1)
}

/// A logical update record for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A live payload
    Present { timestamp: Timestamp, data: Bytes },

    /// A deletion marker
    Tombstone { timestamp: Timestamp },
}

impl Value {
    /// Live value stamped with the current time
    pub fn present(data: impl Into<Bytes>) -> Self {
        Self::present_at(now(), data)
    }

    /// Tombstone stamped with the current time
    pub fn tombstone() -> Self {
        Self::tombstone_at(now())
    }

    pub fn present_at(timestamp: Timestamp, data: impl Into<Bytes>) -> Self {
        Value::Present {
            timestamp,
            data: data.into(),
        }
    }

    pub fn tombstone_at(timestamp: Timestamp) -> Self {
        Value::Tombstone { timestamp }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Value::Tombstone { .. })
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Value::Present { timestamp, .. } | Value::Tombstone { timestamp } => *timestamp,
        }
    }

    /// Payload of a live value.
    ///
    /// Asking a tombstone for its data is a usage error.
    pub fn data(&self) -> Result<&Bytes> {
        match self {
            Value::Present { data, .. } => Ok(data),
            Value::Tombstone { .. } => Err(StrataError::TombstoneData),
        }
    }

    /// Payload length, 0 for tombstones
    pub fn payload_len(&self) -> usize {
        match self {
            Value::Present { data, .. } => data.len(),
            Value::Tombstone { .. } => 0,
        }
    }

    /// Recency by timestamp alone.
    ///
    /// `Equal` means the caller must fall back to source precedence.
    pub fn recency(&self, other: &Value) -> Ordering {
        self.timestamp().cmp(&other.timestamp())
    }
}

/// A key paired with its latest known [`Value`] in one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    key: Bytes,
    value: Value,
}

impl Cell {
    pub fn new(key: impl Into<Bytes>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (Bytes, Value) {
        (self.key, self.value)
    }
}
