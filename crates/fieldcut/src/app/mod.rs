//! Field selection parsing and line processing.

pub mod fields;
pub mod process;
