//! CLI command implementations

pub mod write;

pub use write::{run_write, RunOutcome, WriteOptions};
