//! Job parameters
//!
//! The values the surrounding platform hands the job at start, plus the
//! derivations the driver needs from them.

use crate::driver::{JobContext, RetryPolicy};
use crate::error::{Error, Result};
use crate::selector::{load_selectors, load_selectors_from_str, SelectorSet};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default number of write retries per batch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// ============================================================================
// Job Parameters
// ============================================================================

/// Parameters supplied when the job starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParameters {
    /// Job name, used for the checkpoint location and logs
    pub job_name: String,

    /// Maximum wait per micro-batch, in seconds
    pub window_size: u64,

    /// Selector document (inline JSON, or `@path` to a JSON/YAML file)
    pub selected_fields: String,

    /// Source catalog database
    #[serde(default)]
    pub source_database: Option<String>,

    /// Source catalog table
    #[serde(default)]
    pub source_table: Option<String>,

    /// Output root (URL, local path, or bare bucket name)
    pub output_root: String,

    /// Temporary directory holding checkpoints
    pub temp_dir: String,

    /// Write retries per batch before the job fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay growth between write retries
    #[serde(default)]
    pub backoff_type: BackoffType,

    /// Optional cap on records per batch
    #[serde(default)]
    pub max_batch_records: Option<usize>,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl JobParameters {
    /// Validate parameter values
    pub fn validate(&self) -> Result<()> {
        if self.job_name.trim().is_empty() {
            return Err(Error::missing_field("job_name"));
        }
        if self.job_name.contains('/') {
            return Err(Error::invalid_value("job_name", "must not contain '/'"));
        }
        if self.window_size == 0 {
            return Err(Error::invalid_value(
                "window_size",
                "must be at least 1 second",
            ));
        }
        if self.selected_fields.trim().is_empty() {
            return Err(Error::missing_field("selected_fields"));
        }
        if self.output_root.trim().is_empty() {
            return Err(Error::missing_field("output_root"));
        }
        if self.temp_dir.trim().is_empty() {
            return Err(Error::missing_field("temp_dir"));
        }
        let temp_dir = self.temp_dir.strip_prefix("file://").unwrap_or(&self.temp_dir);
        if temp_dir.contains("://") {
            return Err(Error::invalid_value(
                "temp_dir",
                "checkpoint location must be a local path",
            ));
        }
        if self.max_batch_records == Some(0) {
            return Err(Error::invalid_value(
                "max_batch_records",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Micro-batch window
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_size)
    }

    /// Checkpoint directory: `<temp_dir>/<job_name>/checkpoint/`
    pub fn checkpoint_location(&self) -> PathBuf {
        let temp_dir = self.temp_dir.strip_prefix("file://").unwrap_or(&self.temp_dir);
        PathBuf::from(temp_dir)
            .join(&self.job_name)
            .join("checkpoint")
    }

    /// Output root as a destination URL
    ///
    /// A bare name without scheme or path separator is taken as an S3 bucket.
    pub fn output_url(&self) -> String {
        normalize_output_root(&self.output_root)
    }

    /// Source stream identifier for logs (`database.table`)
    pub fn source_name(&self) -> String {
        match (&self.source_database, &self.source_table) {
            (Some(db), Some(table)) => format!("{db}.{table}"),
            (None, Some(table)) => table.clone(),
            (Some(db), None) => db.clone(),
            (None, None) => "stream".to_string(),
        }
    }

    /// Load and validate the selector document
    pub fn load_selectors(&self) -> Result<SelectorSet> {
        parse_selected_fields(&self.selected_fields)
    }

    /// Validate everything and build the driver context
    pub fn into_context(self) -> Result<JobContext> {
        self.validate()?;
        let selectors = self.load_selectors()?;
        let retry = RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_backoff_type(self.backoff_type);
        Ok(JobContext::new(
            self.job_name.clone(),
            Arc::new(selectors),
            self.output_url(),
        )
        .with_window(self.window())
        .with_retry(retry))
    }
}

/// Turn an output root into a destination URL; bare names are S3 buckets
pub fn normalize_output_root(root: &str) -> String {
    let root = root.trim();
    if root.contains("://") || root.contains('/') || root.starts_with('.') {
        root.to_string()
    } else {
        format!("s3://{root}")
    }
}

/// Load a selector document given inline or as `@path`
pub fn parse_selected_fields(value: &str) -> Result<SelectorSet> {
    match value.trim().strip_prefix('@') {
        Some(path) => load_selectors(path),
        None => load_selectors_from_str(value),
    }
}
