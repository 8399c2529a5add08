//! Domain types for field selections and the errors raised around them.

pub mod errors;
pub mod model;
