//! Time-windowed batch source
//!
//! Groups an async record stream into micro-batches bounded by a wait window
//! and an optional record cap.

use super::types::{Batch, BatchSource};
use crate::error::Result;
use crate::types::{BatchId, InputRecord};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Micro-batch source over any record stream
pub struct WindowedSource<S> {
    stream: S,
    buffer: Vec<InputRecord>,
    next_batch_id: BatchId,
    position: u64,
    max_batch_records: Option<usize>,
    exhausted: bool,
}

impl<S> WindowedSource<S>
where
    S: Stream<Item = Result<InputRecord>> + Unpin + Send,
{
    /// Create a source starting at batch 0, position 0
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            next_batch_id: 0,
            position: 0,
            max_batch_records: None,
            exhausted: false,
        }
    }

    /// Resume numbering after a committed checkpoint
    ///
    /// The stream itself must already be positioned at `position`.
    #[must_use]
    pub fn resume_from(mut self, next_batch_id: BatchId, position: u64) -> Self {
        self.next_batch_id = next_batch_id;
        self.position = position;
        self
    }

    /// Cap the number of records per batch
    #[must_use]
    pub fn with_max_batch_records(mut self, max: usize) -> Self {
        self.max_batch_records = Some(max.max(1));
        self
    }

    /// Id the next batch will carry
    pub fn next_batch_id(&self) -> BatchId {
        self.next_batch_id
    }

    /// Records consumed so far, including undelivered buffered records
    pub fn position(&self) -> u64 {
        self.position
    }

    fn is_full(&self) -> bool {
        self.max_batch_records
            .is_some_and(|max| self.buffer.len() >= max)
    }

    fn take_batch(&mut self) -> Batch {
        let records = std::mem::take(&mut self.buffer);
        self.position += records.len() as u64;
        let batch = Batch::new(self.next_batch_id, records, self.position);
        self.next_batch_id += 1;
        batch
    }
}

#[async_trait]
impl<S> BatchSource for WindowedSource<S>
where
    S: Stream<Item = Result<InputRecord>> + Unpin + Send,
{
    async fn next_batch(&mut self, max_wait: Duration) -> Result<Option<Batch>> {
        let deadline = Instant::now() + max_wait;

        while !self.exhausted && !self.is_full() {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => break,
                Ok(Some(Ok(record))) => self.buffer.push(record),
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => {
                    debug!("Record stream ended");
                    self.exhausted = true;
                }
            }
        }

        if self.exhausted && self.buffer.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.take_batch()))
    }
}
