//! Select delimited fields from each line of text, in the manner of `cut -f`.

pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

pub use app::fields::parse;
pub use app::process::{ProcessStats, Processor, split_fields};
pub use domain::errors::{CutError, IndexError, ProcessError, SelectionError};
pub use domain::model::{FieldRange, FieldSelection};
