//! Selection ranges over the document
//!
//! Positions are UTF-16 code unit offsets into the document text.

use serde::{Deserialize, Serialize};

/// A selection `{ start, length }`; `length == 0` is a caret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub length: usize,
}

impl SelectionRange {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a zero-length range at a position
    pub fn caret(pos: usize) -> Self {
        Self { start: pos, length: 0 }
    }

    /// Create a range from start (inclusive) to end (exclusive)
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            length: end.abs_diff(start),
        }
    }

    /// End offset (exclusive)
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_caret(&self) -> bool {
        self.length == 0
    }

    /// Check if a position is contained within this range
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end()
    }

    /// Check that the range fits in a document of `len` units
    pub fn fits(&self, len: usize) -> bool {
        self.start
            .checked_add(self.length)
            .is_some_and(|end| end <= len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_range_contains() {
        let range = SelectionRange::new(2, 3);

        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5)); // Exclusive end
        assert!(!range.contains(1));
    }

    #[test]
    fn test_from_bounds_orders_endpoints() {
        assert_eq!(SelectionRange::from_bounds(5, 2), SelectionRange::new(2, 3));
        assert!(SelectionRange::from_bounds(4, 4).is_caret());
    }

    #[test]
    fn test_fits() {
        assert!(SelectionRange::new(0, 5).fits(5));
        assert!(SelectionRange::caret(5).fits(5));
        assert!(!SelectionRange::new(3, 3).fits(5));
        assert!(!SelectionRange::new(usize::MAX, 2).fits(5));
    }
}
