//! Micro-batch driver module
//!
//! Main job loop: wait for a batch, project it, write it, commit it.
//!
//! # Overview
//!
//! The driver module provides:
//! - `MicroBatchDriver` - sequential batch loop with bounded write retry
//! - `JobContext` - job name, selectors, output root, window and retry policy
//! - `RetryPolicy` - attempt budget and backoff between write attempts
//! - `DriverState` / `DriverStats` - lifecycle and counters
//!
//! Output is at-least-once: the checkpoint only moves after a batch has been
//! written, so a failed or interrupted batch is delivered again on restart.

mod types;

pub use types::{DriverState, DriverStats, JobContext, RetryPolicy};

use crate::error::{Error, Result};
use crate::output::{Clock, OutputPartition, PartitionWriter, SystemClock, WriteReceipt};
use crate::projection::{project_batch, ProjectedRecord};
use crate::source::{Batch, BatchSource};
use crate::state::{Checkpoint, CheckpointManager};
use crate::types::{BatchId, TransformationContext};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Sequential micro-batch driver
pub struct MicroBatchDriver {
    context: JobContext,
    writer: Arc<dyn PartitionWriter>,
    checkpoints: CheckpointManager,
    clock: Arc<dyn Clock>,
    state: DriverState,
    stats: DriverStats,
}

impl MicroBatchDriver {
    /// Create a driver whose checkpoint has not been loaded yet
    pub fn new(
        context: JobContext,
        writer: Arc<dyn PartitionWriter>,
        checkpoints: CheckpointManager,
    ) -> Self {
        Self {
            context,
            writer,
            checkpoints,
            clock: Arc::new(SystemClock),
            state: DriverState::Initializing,
            stats: DriverStats::new(),
        }
    }

    /// Load the checkpoint and return a running driver
    pub async fn initialize(
        context: JobContext,
        writer: Arc<dyn PartitionWriter>,
        checkpoints: CheckpointManager,
    ) -> Result<Self> {
        let mut driver = Self::new(context, writer, checkpoints);
        driver.load_checkpoint().await?;
        Ok(driver)
    }

    /// Load the committed checkpoint, moving from `Initializing` to `Running`
    ///
    /// A checkpoint that cannot be read leaves the driver `Failed`.
    pub async fn load_checkpoint(&mut self) -> Result<()> {
        if self.state != DriverState::Initializing {
            return Err(Error::Other(format!("Driver already {}", self.state)));
        }

        if let Err(e) = self.checkpoints.load().await {
            error!(job = %self.context.job_name, error = %e, "Checkpoint load failed");
            self.state = DriverState::Failed;
            return Err(e);
        }

        let checkpoint = self.checkpoints.checkpoint().await;
        info!(
            job = %self.context.job_name,
            columns = self.context.selectors.len(),
            next_batch_id = checkpoint.next_batch_id(),
            position = checkpoint.position,
            "Driver initialized"
        );
        self.state = DriverState::Running;
        Ok(())
    }

    /// Replace the clock used to pick output partitions
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Counters so far
    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    /// Job context
    pub fn context(&self) -> &JobContext {
        &self.context
    }

    /// Committed checkpoint, used to position the source on start
    pub async fn checkpoint(&self) -> Checkpoint {
        self.checkpoints.checkpoint().await
    }

    /// Run until the source ends or the stream errors, without a shutdown signal
    pub async fn run_to_completion(&mut self, source: &mut dyn BatchSource) -> Result<DriverState> {
        let (_tx, rx) = watch::channel(false);
        self.run(source, rx).await
    }

    /// Run the batch loop
    ///
    /// `shutdown` is only observed between batches; a batch that is being
    /// processed always runs to commit or failure.
    pub async fn run(
        &mut self,
        source: &mut dyn BatchSource,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<DriverState> {
        if self.state.is_terminal() {
            return Err(Error::Other(format!("Driver already {}", self.state)));
        }
        if self.state == DriverState::Initializing {
            self.load_checkpoint().await?;
        }

        let start = Instant::now();
        let window = self.context.window_size;

        loop {
            if *shutdown.borrow_and_update() {
                info!("Shutdown requested");
                break;
            }

            self.state = DriverState::Idle;
            let next = tokio::select! {
                biased;
                () = shutdown_signalled(&mut shutdown) => {
                    info!("Shutdown requested while waiting for batch");
                    break;
                }
                next = source.next_batch(window) => next,
            };

            let batch = match next {
                Ok(Some(batch)) => batch,
                Ok(None) => {
                    info!("Source exhausted");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Source failed");
                    self.state = DriverState::Failed;
                    return Err(e);
                }
            };

            if let Err(e) = self.process_batch(&batch).await {
                self.state = DriverState::Failed;
                return Err(e);
            }
        }

        self.state = DriverState::Stopped;
        info!(
            batches = self.stats.batches_processed,
            empty_batches = self.stats.empty_batches,
            records = self.stats.records_written,
            retries = self.stats.write_retries,
            duration_ms = start.elapsed().as_millis() as u64,
            "Driver stopped"
        );
        Ok(self.state)
    }

    /// Project, write and commit a single batch
    ///
    /// Errors leave the checkpoint untouched.
    pub async fn process_batch(&mut self, batch: &Batch) -> Result<()> {
        let span = info_span!(
            "batch",
            batch_id = batch.id,
            records = batch.len(),
            transformation_ctx = %TransformationContext::new("output", batch.id),
        );
        self.process_batch_inner(batch).instrument(span).await
    }

    async fn process_batch_inner(&mut self, batch: &Batch) -> Result<()> {
        if batch.is_empty() {
            debug!("Empty window, nothing to write");
            self.stats.add_empty_batch();
            self.state = DriverState::Idle;
            return Ok(());
        }

        self.state = DriverState::Processing;

        let projection_ctx = TransformationContext::new("projection", batch.id);
        let projected = project_batch(batch, &self.context.selectors);
        debug!(transformation_ctx = %projection_ctx, rows = projected.len(), "Projected batch");

        let output_ctx = TransformationContext::new("output", batch.id);
        let partition = OutputPartition::current(&self.context.output_root, self.clock.as_ref());
        let receipt = self
            .write_with_retry(batch.id, &projected, &partition, &output_ctx)
            .await?;

        self.checkpoints
            .commit(batch.id, batch.position)
            .await
            .inspect_err(|e| error!(error = %e, "Checkpoint commit failed"))?;

        self.stats.add_batch(receipt.records, receipt.bytes);
        self.state = DriverState::Idle;
        info!(path = %receipt.path, records = receipt.records, "Batch committed");
        Ok(())
    }

    async fn write_with_retry(
        &mut self,
        batch_id: BatchId,
        records: &[ProjectedRecord],
        partition: &OutputPartition,
        ctx: &TransformationContext,
    ) -> Result<WriteReceipt> {
        let policy = self.context.retry.clone();
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.writer.write(records, partition, ctx).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = policy.calculate_backoff(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Write failed, retrying"
                    );
                    self.stats.add_retry();
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(attempt, error = %e, "Write failed, giving up on batch");
                    return Err(Error::BatchFailed {
                        batch_id,
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for MicroBatchDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroBatchDriver")
            .field("context", &self.context)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Resolves once the flag is set; never resolves if the sender is gone
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
