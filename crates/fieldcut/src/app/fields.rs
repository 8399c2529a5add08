//! Parsing of `-f` field lists.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::domain::errors::{IndexError, SelectionError};
use crate::domain::model::{FieldRange, FieldSelection};

/// Parse a field list like `1,3-5,7-, -4`.
///
/// Tokens are comma separated and trimmed. A token containing `-` is a range
/// split at its first `-`; either side may be empty but not both. Indices are
/// 1-based and must be positive.
pub fn parse(spec: &str) -> Result<FieldSelection, SelectionError> {
    if spec.trim().is_empty() {
        return Err(SelectionError::Empty);
    }

    let mut exact = BTreeSet::new();
    let mut ranges = Vec::new();

    for part in spec.split(',') {
        let token = part.trim();
        if token.is_empty() {
            return Err(SelectionError::EmptyToken);
        }

        match token.split_once('-') {
            Some((start, end)) => ranges.push(parse_range(token, start, end)?),
            None => {
                let index = parse_index(token).map_err(|reason| SelectionError::InvalidField {
                    token: token.to_owned(),
                    reason,
                })?;
                exact.insert(index);
            }
        }
    }

    Ok(FieldSelection::from_parts(exact, ranges))
}

fn parse_range(token: &str, start: &str, end: &str) -> Result<FieldRange, SelectionError> {
    let start = parse_bound(start).map_err(|reason| SelectionError::InvalidRangeStart {
        token: token.to_owned(),
        reason,
    })?;
    let end = parse_bound(end).map_err(|reason| SelectionError::InvalidRangeEnd {
        token: token.to_owned(),
        reason,
    })?;

    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(SelectionError::DescendingRange {
            token: token.to_owned(),
        }),
        (Some(start), Some(end)) => Ok(FieldRange::Closed { start, end }),
        (None, Some(end)) => Ok(FieldRange::UpTo { end }),
        (Some(start), None) => Ok(FieldRange::From { start }),
        (None, None) => Err(SelectionError::UnboundedRange {
            token: token.to_owned(),
        }),
    }
}

fn parse_bound(raw: &str) -> Result<Option<usize>, IndexError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_index(raw).map(Some)
}

fn parse_index(raw: &str) -> Result<usize, IndexError> {
    match raw.trim().parse::<usize>()? {
        0 => Err(IndexError::NotPositive),
        index => Ok(index),
    }
}

impl FromStr for FieldSelection {
    type Err = SelectionError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        parse(spec)
    }
}
