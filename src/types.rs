//! Common types used throughout streamproj
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
///
/// This is the tagged value every record field carries: string, number,
/// boolean, null, nested object or list.
pub type JsonValue = serde_json::Value;

/// One semi-structured record as delivered by the stream
pub type InputRecord = JsonValue;

/// Monotonically increasing identifier of a micro-batch
pub type BatchId = u64;

// ============================================================================
// Backoff Configuration
// ============================================================================

/// Backoff strategy between batch write attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

impl std::str::FromStr for BackoffType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!("unknown backoff type '{other}'")),
        }
    }
}

// ============================================================================
// Transformation Context
// ============================================================================

/// Batch-scoped transformation-tracking identifier
///
/// Handed to the projector and the writer for every batch. The storage layer
/// uses it for object naming and the logs use it to correlate a batch's
/// stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformationContext {
    /// Name of the processing stage (e.g. `projection`, `output`)
    pub stage: String,
    /// Batch this context belongs to
    pub batch_id: BatchId,
}

impl TransformationContext {
    /// Create a new transformation context
    pub fn new(stage: impl Into<String>, batch_id: BatchId) -> Self {
        Self {
            stage: stage.into(),
            batch_id,
        }
    }
}

impl fmt::Display for TransformationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-batch-{}", self.stage, self.batch_id)
    }
}
