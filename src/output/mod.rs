//! Output module
//!
//! Computes hour partitions and writes projected batches to object storage.
//!
//! # Overview
//!
//! This module provides:
//! - `OutputPartition` - `ingest_year=/ingest_month=/ingest_day=/ingest_hour=` layout
//! - `Clock` - wall-clock source used to pick the partition
//! - `CloudDestination` - object store wrapper (S3, GCS, Azure, local, memory)
//! - `PartitionWriter` / `ObjectStoreWriter` - NDJSON batch writer

mod cloud;
mod partition;
mod writer;

pub use cloud::CloudDestination;
pub use partition::{partition_path, Clock, FixedClock, OutputPartition, SystemClock};
pub use writer::{encode_ndjson, object_name, ObjectStoreWriter, PartitionWriter, WriteReceipt};

#[cfg(test)]
mod tests;
