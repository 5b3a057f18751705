//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, JobArgs, OutputFormat};
use crate::config::{normalize_output_root, parse_selected_fields};
use crate::driver::MicroBatchDriver;
use crate::error::{Error, Result, ResultExt};
use crate::output::{partition_path, ObjectStoreWriter};
use crate::projection::project_record;
use crate::source::{jsonl_records, RecordStream, WindowedSource};
use crate::state::CheckpointManager;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { job, input } => self.run_job(job, input.as_deref()).await,
            Commands::Validate { selected_fields } => self.validate(selected_fields),
            Commands::Project {
                selected_fields,
                input,
            } => self.project(selected_fields, input.as_deref()).await,
            Commands::Partition { output_root, at } => self.partition(output_root, at.as_deref()),
        }
    }

    /// Run the streaming job until the input ends or an interrupt arrives
    async fn run_job(&self, job: &JobArgs, input: Option<&Path>) -> Result<()> {
        let params = job.to_parameters();
        let source_name = params.source_name();
        let checkpoint_dir = params.checkpoint_location();
        let max_batch_records = params.max_batch_records;
        let context = params.into_context()?;

        info!(
            job = %context.job_name,
            source = %source_name,
            output = %context.output_root,
            checkpoint = %checkpoint_dir.display(),
            "Starting job"
        );

        let writer = Arc::new(ObjectStoreWriter::from_url(&context.output_root)?);
        let checkpoints = CheckpointManager::new(&checkpoint_dir);
        let mut driver = MicroBatchDriver::initialize(context, writer, checkpoints).await?;

        let checkpoint = driver.checkpoint().await;
        let records = open_input(input, checkpoint.position).await?;
        let mut source = WindowedSource::new(records)
            .resume_from(checkpoint.next_batch_id(), checkpoint.position);
        if let Some(max) = max_batch_records {
            source = source.with_max_batch_records(max);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping after current batch");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
            }
        });

        let state = driver.run(&mut source, shutdown_rx).await?;
        let stats = driver.stats();

        self.output_message(&json!({
            "type": "STATS",
            "job": driver.context().job_name,
            "state": state.to_string(),
            "stats": {
                "batchesProcessed": stats.batches_processed,
                "emptyBatches": stats.empty_batches,
                "recordsWritten": stats.records_written,
                "objectsWritten": stats.objects_written,
                "bytesWritten": stats.bytes_written,
                "writeRetries": stats.write_retries,
            }
        }));

        Ok(())
    }

    /// Validate a selector document
    fn validate(&self, selected_fields: &str) -> Result<()> {
        let selectors = parse_selected_fields(selected_fields)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Selector document is valid with {} columns", selectors.len()),
                "columns": selectors.columns(),
            }
        }));

        Ok(())
    }

    /// Project every input record once and print the results
    async fn project(&self, selected_fields: &str, input: Option<&Path>) -> Result<()> {
        let selectors = parse_selected_fields(selected_fields)?;
        let mut records = open_input(input, 0).await?;

        while let Some(record) = records.next().await {
            let projected = project_record(&record?, &selectors);
            let line = serde_json::to_string(&projected)
                .context("Failed to encode projected record")?;
            println!("{line}");
        }

        Ok(())
    }

    /// Print a partition path
    fn partition(&self, output_root: &str, at: Option<&str>) -> Result<()> {
        self.output_message(&json!({
            "type": "PARTITION",
            "path": resolve_partition(output_root, at)?,
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Partition path for a root as the job would write it, at `at` or now
fn resolve_partition(output_root: &str, at: Option<&str>) -> Result<String> {
    let time = match at {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map_err(|e| Error::invalid_value("at", e.to_string()))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(partition_path(&normalize_output_root(output_root), time))
}

/// Open the JSON Lines input, skipping already committed records
async fn open_input(input: Option<&Path>, skip: u64) -> Result<RecordStream> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                Error::stream(format!("Failed to open input {}: {e}", path.display()))
            })?;
            Ok(jsonl_records(BufReader::new(file), skip))
        }
        None => Ok(jsonl_records(BufReader::new(tokio::io::stdin()), skip)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_partition_normalizes_bare_bucket() {
        let path = resolve_partition("acme-bucket", Some("2024-03-05T07:15:00Z")).unwrap();
        assert_eq!(
            path,
            "s3://acme-bucket/ingest_year=2024/ingest_month=03/ingest_day=05/ingest_hour=07/"
        );
    }

    #[test]
    fn test_resolve_partition_converts_to_utc() {
        let path = resolve_partition("gs://b/out", Some("2024-03-05T23:30:00-02:00")).unwrap();
        assert_eq!(
            path,
            "gs://b/out/ingest_year=2024/ingest_month=03/ingest_day=06/ingest_hour=01/"
        );
    }

    #[test]
    fn test_resolve_partition_rejects_bad_time() {
        assert!(resolve_partition("bucket", Some("yesterday")).is_err());
    }
}
