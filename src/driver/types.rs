//! Driver types

use crate::selector::SelectorSet;
use crate::types::BackoffType;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle state of the micro-batch driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Loading checkpoint
    Initializing,
    /// Checkpoint loaded, loop not yet waiting
    Running,
    /// Waiting for the next batch
    Idle,
    /// Projecting and writing a batch
    Processing,
    /// Stopped on shutdown signal or end of stream
    Stopped,
    /// Stopped on an unrecoverable error
    Failed,
}

impl DriverState {
    /// Whether the driver can no longer make progress
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Bounded retry of batch writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// How the delay grows
    pub backoff_type: BackoffType,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_type: BackoffType::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Set the retry count
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set initial and maximum backoff
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the backoff strategy
    #[must_use]
    pub fn with_backoff_type(mut self, backoff_type: BackoffType) -> Self {
        self.backoff_type = backoff_type;
        self
    }

    /// Total write attempts per batch
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .initial_backoff
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_backoff)
    }
}

// ============================================================================
// Job Context
// ============================================================================

/// Everything the driver needs to know about the job
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job name
    pub job_name: String,
    /// Validated, shared selector set
    pub selectors: Arc<SelectorSet>,
    /// Output root used for partition paths
    pub output_root: String,
    /// Maximum wait per micro-batch
    pub window_size: Duration,
    /// Write retry policy
    pub retry: RetryPolicy,
}

impl JobContext {
    /// Create a context with default window and retry policy
    pub fn new(
        job_name: impl Into<String>,
        selectors: Arc<SelectorSet>,
        output_root: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            selectors,
            output_root: output_root.into(),
            window_size: Duration::from_secs(100),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the batch window
    #[must_use]
    pub fn with_window(mut self, window_size: Duration) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters accumulated by a driver run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Non-empty batches written and committed
    pub batches_processed: u64,
    /// Empty windows skipped
    pub empty_batches: u64,
    /// Records written
    pub records_written: u64,
    /// Write attempts that were retried
    pub write_retries: u64,
    /// Objects written
    pub objects_written: u64,
    /// Bytes written
    pub bytes_written: u64,
}

impl DriverStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed batch
    pub fn add_batch(&mut self, records: usize, bytes: usize) {
        self.batches_processed += 1;
        self.objects_written += 1;
        self.records_written += records as u64;
        self.bytes_written += bytes as u64;
    }

    /// Record a skipped empty window
    pub fn add_empty_batch(&mut self) {
        self.empty_batches += 1;
    }

    /// Record a retried write
    pub fn add_retry(&mut self) {
        self.write_retries += 1;
    }
}
