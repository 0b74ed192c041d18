//! Segment Iterator
//!
//! Sequential iteration over a segment, one row decoded per step.

use crate::cell::Cell;
use crate::error::Result;

use super::reader::Segment;

/// Iterator over segment rows in ascending key order
///
/// Single pass; call [`Segment::iter_from`] again to restart. Stops after the
/// first decode error.
pub struct SegmentIter<'a> {
    segment: &'a Segment,
    /// Next row to decode
    next: usize,
}

impl<'a> SegmentIter<'a> {
    pub(super) fn new(segment: &'a Segment, start: usize) -> Self {
        Self {
            segment,
            next: start,
        }
    }
}

impl Iterator for SegmentIter<'_> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.segment.row_count() {
            return None;
        }

        let row = self.next;
        let cell = self.segment.cell_at(row);
        self.next = if cell.is_ok() {
            row + 1
        } else {
            self.segment.row_count()
        };

        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segment.row_count().saturating_sub(self.next);
        (0, Some(remaining))
    }
}
