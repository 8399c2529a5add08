//! Domain-specific errors.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single index in a fields spec was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("must be positive integer")]
    NotPositive,
    #[error(transparent)]
    NotANumber(#[from] ParseIntError),
}

/// Failure to parse a fields spec such as `1,3-5,7-`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("empty fields spec")]
    Empty,
    #[error("empty token in fields spec")]
    EmptyToken,
    #[error("invalid field {token:?}: {reason}")]
    InvalidField { token: String, reason: IndexError },
    #[error("invalid range start in {token:?}: {reason}")]
    InvalidRangeStart { token: String, reason: IndexError },
    #[error("invalid range end in {token:?}: {reason}")]
    InvalidRangeEnd { token: String, reason: IndexError },
    #[error("range end < start in {token:?}")]
    DescendingRange { token: String },
    #[error("invalid open range '-' in {token:?}")]
    UnboundedRange { token: String },
}

/// Failure while streaming lines through the processor.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("line {line} exceeds the {limit} byte limit")]
    LineTooLong { line: u64, limit: usize },
}

/// Top-level failure of a command-line run.
#[derive(Debug, Error)]
pub enum CutError {
    #[error("{0}")]
    Usage(#[from] clap::Error),
    #[error("invalid -f: {0}")]
    Selection(#[from] SelectionError),
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl CutError {
    /// Process exit code: 1 for failures while processing input, 2 for
    /// anything detected before the first line is read.
    pub fn exit_code(&self) -> u8 {
        match self {
            CutError::Process(_) => 1,
            CutError::Usage(_) | CutError::Selection(_) | CutError::Config(_) => 2,
        }
    }
}
