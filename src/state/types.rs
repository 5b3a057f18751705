//! Checkpoint types
//!
//! Serialized to JSON under the checkpoint location and read back on restart.

use crate::types::BatchId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Committed stream position of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last batch whose output was committed
    #[serde(default)]
    pub last_batch_id: Option<BatchId>,

    /// Records consumed from the stream up to and including that batch
    #[serde(default)]
    pub position: u64,

    /// When the last commit happened
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Create an empty checkpoint (nothing committed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next batch should carry
    pub fn next_batch_id(&self) -> BatchId {
        self.last_batch_id.map_or(0, |id| id + 1)
    }

    /// Record a successful batch commit
    pub fn commit(&mut self, batch_id: BatchId, position: u64) {
        self.last_batch_id = Some(batch_id);
        self.position = position;
        self.committed_at = Some(Utc::now());
    }
}
