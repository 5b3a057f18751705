//! CLI commands and argument parsing

use crate::config::{JobParameters, DEFAULT_MAX_RETRIES};
use crate::types::BackoffType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Streaming field-projection job
#[derive(Parser, Debug)]
#[command(name = "streamproj")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for command results
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the micro-batch job over a JSON Lines stream
    Run {
        #[command(flatten)]
        job: JobArgs,

        /// Input file (JSON Lines); reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Validate a selector document
    Validate {
        /// Selector document (inline JSON, or `@path`)
        #[arg(long, alias = "selectedFields")]
        selected_fields: String,
    },

    /// Project JSON Lines from a file or stdin to stdout, once
    Project {
        /// Selector document (inline JSON, or `@path`)
        #[arg(long, alias = "selectedFields")]
        selected_fields: String,

        /// Input file (JSON Lines); reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the partition path for a root and time
    Partition {
        /// Output root
        #[arg(long, alias = "s3OutputBucket")]
        output_root: String,

        /// RFC 3339 timestamp (default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

/// Job parameters, accepted in kebab-case or under the job argument names
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Job name
    #[arg(long, alias = "JOB_NAME")]
    pub job_name: String,

    /// Micro-batch window in seconds
    #[arg(long, alias = "windowSize", default_value = "100")]
    pub window_size: u64,

    /// Selector document (inline JSON, or `@path`)
    #[arg(long, alias = "selectedFields")]
    pub selected_fields: String,

    /// Source catalog database
    #[arg(long, alias = "kinesisDB")]
    pub source_database: Option<String>,

    /// Source catalog table
    #[arg(long, alias = "kinesisTable")]
    pub source_table: Option<String>,

    /// Output root: s3://bucket/path, gs://bucket/path, az://container/path,
    /// a local path, or a bare S3 bucket name
    #[arg(long, alias = "s3OutputBucket")]
    pub output_root: String,

    /// Temporary directory for checkpoints
    #[arg(long, alias = "TempDir")]
    pub temp_dir: String,

    /// Write retries per batch
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Delay growth between write retries (constant, linear, exponential)
    #[arg(long, default_value = "exponential")]
    pub backoff_type: BackoffType,

    /// Maximum records per batch
    #[arg(long)]
    pub max_batch_records: Option<usize>,
}

impl JobArgs {
    /// Convert to job parameters
    pub fn to_parameters(&self) -> JobParameters {
        JobParameters {
            job_name: self.job_name.clone(),
            window_size: self.window_size,
            selected_fields: self.selected_fields.clone(),
            source_database: self.source_database.clone(),
            source_table: self.source_table.clone(),
            output_root: self.output_root.clone(),
            temp_dir: self.temp_dir.clone(),
            max_retries: self.max_retries,
            backoff_type: self.backoff_type,
            max_batch_records: self.max_batch_records,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_job_argument_names() {
        let cli = Cli::try_parse_from([
            "streamproj",
            "run",
            "--JOB_NAME",
            "orders",
            "--windowSize",
            "60",
            "--selectedFields",
            r#"{"selected-fields": [{"id": "$.id"}]}"#,
            "--kinesisDB",
            "db",
            "--kinesisTable",
            "events",
            "--s3OutputBucket",
            "bucket",
            "--TempDir",
            "/tmp",
        ])
        .unwrap();

        let Commands::Run { job, input } = cli.command else {
            panic!("expected run command");
        };
        let params = job.to_parameters();
        assert_eq!(params.job_name, "orders");
        assert_eq!(params.window_size, 60);
        assert_eq!(params.source_database.as_deref(), Some("db"));
        assert_eq!(params.source_table.as_deref(), Some("events"));
        assert_eq!(params.output_url(), "s3://bucket");
        assert_eq!(params.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(params.backoff_type, BackoffType::Exponential);
        assert!(input.is_none());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_parse_run_with_kebab_flags() {
        let cli = Cli::try_parse_from([
            "streamproj",
            "--verbose",
            "run",
            "--job-name",
            "orders",
            "--selected-fields",
            "@fields.yaml",
            "--output-root",
            "./out",
            "--temp-dir",
            "/tmp",
            "--max-retries",
            "5",
            "--max-batch-records",
            "1000",
            "--backoff-type",
            "Linear",
            "--input",
            "events.jsonl",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Run { job, input } = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(job.window_size, 100);
        assert_eq!(job.max_retries, 5);
        assert_eq!(job.max_batch_records, Some(1000));
        assert_eq!(job.backoff_type, BackoffType::Linear);
        assert_eq!(input, Some(PathBuf::from("events.jsonl")));
    }

    #[test]
    fn test_run_requires_job_name() {
        let result = Cli::try_parse_from([
            "streamproj",
            "run",
            "--selected-fields",
            "{}",
            "--output-root",
            "b",
            "--temp-dir",
            "/tmp",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_partition() {
        let cli = Cli::try_parse_from([
            "streamproj",
            "partition",
            "--output-root",
            "s3://bucket/out",
            "--at",
            "2024-03-05T07:15:00Z",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Partition { .. }));
    }
}
