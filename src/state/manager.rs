//! Checkpoint manager implementation
//!
//! Provides file-based checkpoint persistence with atomic writes.

use super::types::Checkpoint;
use crate::error::{Error, Result};
use crate::types::BatchId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// File name of the checkpoint inside the checkpoint directory
pub const CHECKPOINT_FILE: &str = "offsets.json";

/// Checkpoint manager for persisting and loading the committed position
#[derive(Debug)]
pub struct CheckpointManager {
    /// Path to the checkpoint file (empty for in-memory mode)
    path: PathBuf,
    /// Current checkpoint (cached)
    checkpoint: Arc<RwLock<Checkpoint>>,
}

impl CheckpointManager {
    /// Create a checkpoint manager writing into `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CHECKPOINT_FILE),
            checkpoint: Arc::new(RwLock::new(Checkpoint::new())),
        }
    }

    /// Create an in-memory checkpoint manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            checkpoint: Arc::new(RwLock::new(Checkpoint::new())),
        }
    }

    /// Create a checkpoint manager for `dir`, loading an existing checkpoint if present
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CHECKPOINT_FILE);
        let checkpoint = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::checkpoint(format!("Failed to read checkpoint file: {e}")))?;
            serde_json::from_str(&contents)
                .map_err(|e| Error::checkpoint(format!("Failed to parse checkpoint file: {e}")))?
        } else {
            Checkpoint::new()
        };

        Ok(Self {
            path,
            checkpoint: Arc::new(RwLock::new(checkpoint)),
        })
    }

    /// Load checkpoint from file
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to read checkpoint file: {e}")))?;

        let loaded: Checkpoint = serde_json::from_str(&contents)
            .map_err(|e| Error::checkpoint(format!("Failed to parse checkpoint file: {e}")))?;

        *self.checkpoint.write().await = loaded;
        Ok(())
    }

    /// Save current checkpoint to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let checkpoint = self.checkpoint.read().await;
            serde_json::to_string_pretty(&*checkpoint)
                .map_err(|e| Error::checkpoint(format!("Failed to serialize checkpoint: {e}")))?
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::checkpoint(format!("Failed to create checkpoint directory: {e}"))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to write checkpoint file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to rename checkpoint file: {e}")))?;

        Ok(())
    }

    /// Commit a batch and persist the new position
    pub async fn commit(&self, batch_id: BatchId, position: u64) -> Result<()> {
        {
            let mut checkpoint = self.checkpoint.write().await;
            checkpoint.commit(batch_id, position);
        }
        self.save().await?;
        debug!(batch_id, position, "Committed checkpoint");
        Ok(())
    }

    /// Snapshot of the current checkpoint
    pub async fn checkpoint(&self) -> Checkpoint {
        self.checkpoint.read().await.clone()
    }

    /// Get the checkpoint file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for CheckpointManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            checkpoint: Arc::clone(&self.checkpoint),
        }
    }
}
