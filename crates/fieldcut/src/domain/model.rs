//! Domain models for field selections.

use std::collections::BTreeSet;
use std::fmt;

/// A contiguous run of 1-based field positions. At least one bound is always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRange {
    /// `start-end`, both inclusive.
    Closed { start: usize, end: usize },
    /// `-end`: every position from 1 through `end`.
    UpTo { end: usize },
    /// `start-`: every position from `start` onwards.
    From { start: usize },
}

impl FieldRange {
    pub fn contains(&self, index: usize) -> bool {
        match *self {
            FieldRange::Closed { start, end } => (start..=end).contains(&index),
            FieldRange::UpTo { end } => index <= end,
            FieldRange::From { start } => index >= start,
        }
    }
}

impl fmt::Display for FieldRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRange::Closed { start, end } => write!(f, "{start}-{end}"),
            FieldRange::UpTo { end } => write!(f, "-{end}"),
            FieldRange::From { start } => write!(f, "{start}-"),
        }
    }
}

/// Parsed `-f` list answering whether a 1-based field position is selected.
///
/// Exact indices and ranges are kept apart because open ranges have no
/// finite extent; they are only combined inside [`FieldSelection::includes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    exact: BTreeSet<usize>,
    ranges: Vec<FieldRange>,
}

impl FieldSelection {
    pub(crate) fn from_parts(exact: BTreeSet<usize>, ranges: Vec<FieldRange>) -> Self {
        Self { exact, ranges }
    }

    /// Returns true if the given 1-based position is selected. Position 0 never is.
    pub fn includes(&self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        self.exact.contains(&index) || self.ranges.iter().any(|range| range.contains(index))
    }

    pub fn exact(&self) -> impl Iterator<Item = usize> + '_ {
        self.exact.iter().copied()
    }

    pub fn ranges(&self) -> &[FieldRange] {
        &self.ranges
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exact = self.exact.iter().map(ToString::to_string);
        let ranges = self.ranges.iter().map(ToString::to_string);
        let parts: Vec<String> = exact.chain(ranges).collect();
        f.write_str(&parts.join(","))
    }
}
