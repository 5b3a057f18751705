//! CLI module
//!
//! Command-line interface for running the projection job.
//!
//! # Commands
//!
//! - `run` - Run the micro-batch job over a JSON Lines stream
//! - `validate` - Validate a selector document
//! - `project` - Project JSON Lines once, to stdout
//! - `partition` - Print the partition path for a time

mod commands;
mod runner;

pub use commands::{Cli, Commands, JobArgs, OutputFormat};
pub use runner::Runner;
