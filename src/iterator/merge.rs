//! K-way merge over sorted cell sources.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cell::Cell;
use crate::error::{Result, StrataError};
use crate::table::CellIter;

/// Head of one source waiting in the heap
struct HeapEntry<'a> {
    cell: Cell,
    /// Position in the source list; lower means higher precedence
    source: usize,
    iterator: CellIter<'a>,
}

impl PartialEq for HeapEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cell.key() == other.cell.key() && self.source == other.source
    }
}

impl Eq for HeapEntry<'_> {}

impl PartialOrd for HeapEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry<'_> {
    // BinaryHeap is a max-heap: smallest key, then lowest source, must compare greatest
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cell
            .key()
            .cmp(self.cell.key())
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Merges sorted sources into one sequence ordered by `(key, source)`.
///
/// Sources are given in precedence order (memtable first, then segments from
/// newest to oldest), so equal keys come out in that order. Duplicates are
/// kept; collapsing them is the next stage's job.
///
/// The first source error is yielded in place of the next cell and ends the
/// merge: every later call returns `None`.
pub struct MergeIterator<'a> {
    heap: BinaryHeap<HeapEntry<'a>>,
    /// Error hit while priming the sources
    error: Option<StrataError>,
    done: bool,
}

impl<'a> MergeIterator<'a> {
    pub fn new(sources: Vec<CellIter<'a>>) -> Self {
        let mut merge = Self {
            heap: BinaryHeap::with_capacity(sources.len()),
            error: None,
            done: false,
        };

        for (source, iterator) in sources.into_iter().enumerate() {
            if let Err(e) = merge.advance(source, iterator) {
                merge.error = Some(e);
                break;
            }
        }

        merge
    }

    /// Pull the next cell of `source` into the heap
    fn advance(&mut self, source: usize, mut iterator: CellIter<'a>) -> Result<()> {
        match iterator.next() {
            Some(Ok(cell)) => self.heap.push(HeapEntry {
                cell,
                source,
                iterator,
            }),
            Some(Err(e)) => return Err(e),
            None => {}
        }
        Ok(())
    }

    fn fail(&mut self, e: StrataError) -> Result<Cell> {
        self.done = true;
        self.heap.clear();
        Err(e)
    }
}

impl Iterator for MergeIterator<'_> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(e) = self.error.take() {
            return Some(self.fail(e));
        }

        let HeapEntry {
            cell,
            source,
            iterator,
        } = self.heap.pop()?;

        // The failed source may hold a newer version of `cell`, so it is dropped too
        if let Err(e) = self.advance(source, iterator) {
            return Some(self.fail(e));
        }

        Some(Ok(cell))
    }
}
