//! Source types and traits
//!
//! Defines the micro-batch abstraction handed to the driver.

use crate::error::Result;
use crate::types::{BatchId, InputRecord};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

/// Boxed stream of decoded input records
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<InputRecord>> + Send>>;

/// A group of records delivered together by the stream
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Monotonically increasing batch identifier
    pub id: BatchId,
    /// Records in arrival order
    pub records: Vec<InputRecord>,
    /// Stream position (records consumed) once this batch is committed
    pub position: u64,
}

impl Batch {
    /// Create a new batch
    pub fn new(id: BatchId, records: Vec<InputRecord>, position: u64) -> Self {
        Self {
            id,
            records,
            position,
        }
    }

    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the batch carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A source of micro-batches
///
/// Implementations must keep undelivered records in their own state so that a
/// pending `next_batch` call can be dropped without losing data.
#[async_trait]
pub trait BatchSource: Send {
    /// Wait up to `max_wait` and return whatever has accumulated
    ///
    /// Returns `Ok(None)` once the underlying stream has ended and every
    /// record has been delivered.
    async fn next_batch(&mut self, max_wait: Duration) -> Result<Option<Batch>>;
}
