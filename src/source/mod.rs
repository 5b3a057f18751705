//! Source module
//!
//! Delivers the record stream to the driver as micro-batches.
//!
//! # Overview
//!
//! The source module provides:
//! - `Batch` - records delivered together, with batch id and stream position
//! - `BatchSource` - "next batch within a bounded wait" abstraction
//! - `WindowedSource` - windowed batching over any async record stream
//! - `jsonl_records` - JSON Lines decoding from any async reader

mod jsonl;
mod types;
mod windowed;

pub use jsonl::jsonl_records;
pub use types::{Batch, BatchSource, RecordStream};
pub use windowed::WindowedSource;
