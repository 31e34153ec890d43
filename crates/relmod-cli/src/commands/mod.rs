//! CLI command implementations.

pub mod compile;
pub mod tables;
pub mod validate;
