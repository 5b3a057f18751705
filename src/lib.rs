// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # streamproj
//!
//! A streaming field-projection job: records arrive from a stream, are grouped
//! into time-windowed micro-batches, narrowed to a configured set of output
//! columns, and written as newline-delimited JSON under hour partitions of an
//! object store.
//!
//! ## Features
//!
//! - **Selector documents**: JSON or YAML `selected-fields` lists, validated at load
//! - **Restricted expressions**: paths, literals and a few pure combinators
//! - **Micro-batching**: bounded wait window with an optional record cap
//! - **Hour partitions**: `ingest_year=/ingest_month=/ingest_day=/ingest_hour=`
//! - **At-least-once output**: checkpoints move only after a batch is written
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use streamproj::driver::{JobContext, MicroBatchDriver};
//! use streamproj::output::ObjectStoreWriter;
//! use streamproj::selector::load_selectors_from_str;
//! use streamproj::source::{jsonl_records, WindowedSource};
//! use streamproj::state::CheckpointManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> streamproj::Result<()> {
//!     let selectors = load_selectors_from_str(
//!         r#"{"selected-fields": [{"id": "$.id"}, {"topic": "$.topic"}]}"#,
//!     )?;
//!     let context = JobContext::new("events", Arc::new(selectors), "s3://bucket/out");
//!     let writer = Arc::new(ObjectStoreWriter::from_url(&context.output_root)?);
//!     let checkpoints = CheckpointManager::new("/tmp/events/checkpoint");
//!
//!     let mut driver = MicroBatchDriver::initialize(context, writer, checkpoints).await?;
//!     let checkpoint = driver.checkpoint().await;
//!     let input = tokio::io::BufReader::new(tokio::io::stdin());
//!     let mut source = WindowedSource::new(jsonl_records(input, checkpoint.position))
//!         .resume_from(checkpoint.next_batch_id(), checkpoint.position);
//!
//!     driver.run_to_completion(&mut source).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   Batch    ┌──────────────────┐  ProjectedRecord  ┌────────────────┐
//! │ BatchSource  │──────────▶│ MicroBatchDriver │─────────────────▶│ PartitionWriter│
//! │ (windowed)   │            │  project, retry  │                   │ (object_store) │
//! └──────────────┘            └────────┬─────────┘                   └────────────────┘
//!                                      │ commit after write
//!                             ┌────────▼─────────┐
//!                             │ CheckpointManager│
//!                             └──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Restricted expression language
pub mod expression;

/// Field-selector documents
pub mod selector;

/// Field extraction and batch projection
pub mod projection;

/// Record stream and micro-batch sources
pub mod source;

/// Partition layout and object store output
pub mod output;

/// Checkpointing of the committed stream position
pub mod state;

/// Micro-batch driver
pub mod driver;

/// Job parameters
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::JobParameters;
pub use driver::{DriverState, JobContext, MicroBatchDriver};
pub use selector::{load_selectors, load_selectors_from_str, SelectorSet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
