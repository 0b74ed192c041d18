//! Duplicate collapsing and the live-pair projection.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::cell::{Cell, Value};
use crate::error::{Result, StrataError};

use super::MergeIterator;

/// Keeps one cell per run of equal keys.
///
/// The winner is the cell with the highest timestamp; on a timestamp tie the
/// first cell of the run wins, which is the highest-precedence source when fed
/// by [`MergeIterator`].
///
/// An error from `inner` discards the unfinished run and ends the sequence.
pub struct Collapse<I> {
    inner: I,
    /// First cell of the next run, already pulled from `inner`
    pending: Option<Cell>,
    done: bool,
}

impl<I> Collapse<I>
where
    I: Iterator<Item = Result<Cell>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: None,
            done: false,
        }
    }
}

impl<I> Collapse<I> {
    fn fail(&mut self, e: StrataError) -> Result<Cell> {
        self.done = true;
        self.pending = None;
        Err(e)
    }
}

impl<I> Iterator for Collapse<I>
where
    I: Iterator<Item = Result<Cell>>,
{
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut best = match self.pending.take() {
            Some(cell) => cell,
            None => match self.inner.next()? {
                Ok(cell) => cell,
                Err(e) => return Some(self.fail(e)),
            },
        };

        loop {
            match self.inner.next() {
                None => return Some(Ok(best)),
                // A later cell of this run may have been lost with the error
                Some(Err(e)) => return Some(self.fail(e)),
                Some(Ok(cell)) if cell.key() == best.key() => {
                    if cell.value().recency(best.value()) == Ordering::Greater {
                        best = cell;
                    }
                }
                Some(Ok(cell)) => {
                    self.pending = Some(cell);
                    return Some(Ok(best));
                }
            }
        }
    }
}

/// Live `(key, data)` pairs in ascending key order
///
/// Returned by [`Engine::iter`](crate::Engine::iter). Borrows the engine, so
/// no write can happen while a scan is alive.
pub struct Scan<'a> {
    inner: Collapse<MergeIterator<'a>>,
}

impl<'a> Scan<'a> {
    pub fn new(merged: MergeIterator<'a>) -> Self {
        Self {
            inner: Collapse::new(merged),
        }
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<(Bytes, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(cell) => match cell.into_parts() {
                    (key, Value::Present { data, .. }) => return Some(Ok((key, data))),
                    (_, Value::Tombstone { .. }) => continue,
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
