//! Checkpoint module
//!
//! Tracks the committed stream position so a restarted job resumes after the
//! last successfully written batch.
//!
//! # Overview
//!
//! The state module provides:
//! - `Checkpoint` - last committed batch id and stream position
//! - `CheckpointManager` - file-based persistence with atomic writes

mod manager;
mod types;

pub use manager::{CheckpointManager, CHECKPOINT_FILE};
pub use types::Checkpoint;
