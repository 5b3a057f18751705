//! Integration tests for the projection pipeline
//!
//! Tests the full end-to-end flow: selector document → JSON Lines input →
//! micro-batches → NDJSON objects under hour partitions → checkpoint

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use streamproj::driver::{DriverState, MicroBatchDriver, RetryPolicy};
use streamproj::output::{CloudDestination, FixedClock, ObjectStoreWriter};
use streamproj::source::{jsonl_records, WindowedSource};
use streamproj::state::{CheckpointManager, CHECKPOINT_FILE};
use streamproj::{BackoffType, JobParameters};
use tempfile::TempDir;
use tokio::io::BufReader;

const PARTITION: &str = "ingest_year=2024/ingest_month=11/ingest_day=02/ingest_hour=23/";

const SELECTORS_YAML: &str = r#"
selected-fields:
  - event_id: "$.msg_id"
  - topic: "$.topic"
  - region: "$.meta.region"
  - label: "concat(upper(topic), lit('-'), msg_id)"
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn params(&self) -> JobParameters {
        let selectors = self.path("selected_fields.yaml");
        std::fs::write(&selectors, SELECTORS_YAML).unwrap();

        JobParameters {
            job_name: "events-projection".to_string(),
            window_size: 1,
            selected_fields: format!("@{}", selectors.display()),
            source_database: Some("stream_db".to_string()),
            source_table: Some("events".to_string()),
            output_root: self.path("out").display().to_string(),
            temp_dir: self.path("tmp").display().to_string(),
            max_retries: 1,
            backoff_type: BackoffType::Constant,
            max_batch_records: Some(2),
        }
    }

    fn write_input(&self, lines: &[&str]) -> std::path::PathBuf {
        let path = self.path("input.jsonl");
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }
}

/// Run the job once over `input` the way the binary does
async fn run_job(params: &JobParameters, input: &Path) -> (DriverState, u64) {
    let checkpoint_dir = params.checkpoint_location();
    let max_batch_records = params.max_batch_records;
    let context = params
        .clone()
        .into_context()
        .unwrap()
        .with_window(Duration::from_millis(50))
        .with_retry(RetryPolicy::none());

    let writer = Arc::new(ObjectStoreWriter::from_url(&context.output_root).unwrap());
    let clock = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 11, 2, 23, 59, 59).unwrap(),
    ));
    let mut driver =
        MicroBatchDriver::initialize(context, writer, CheckpointManager::new(&checkpoint_dir))
            .await
            .unwrap()
            .with_clock(clock);

    let checkpoint = driver.checkpoint().await;
    let file = tokio::fs::File::open(input).await.unwrap();
    let mut source = WindowedSource::new(jsonl_records(BufReader::new(file), checkpoint.position))
        .resume_from(checkpoint.next_batch_id(), checkpoint.position);
    if let Some(max) = max_batch_records {
        source = source.with_max_batch_records(max);
    }

    let state = driver.run_to_completion(&mut source).await.unwrap();
    (state, driver.stats().records_written)
}

async fn read_output(root: &Path) -> Vec<Value> {
    let destination = CloudDestination::parse(&root.display().to_string()).unwrap();
    let mut rows = Vec::new();
    for object in destination.list(PARTITION).await.unwrap() {
        let data = destination.read(&object).await.unwrap();
        for line in std::str::from_utf8(&data).unwrap().lines() {
            rows.push(serde_json::from_str(line).unwrap());
        }
    }
    rows
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_pipeline_projects_into_hour_partition() {
    let ws = Workspace::new();
    let params = ws.params();
    let input = ws.write_input(&[
        r#"{"msg_id": "m1", "topic": "orders", "meta": {"region": "eu"}, "payload": "x"}"#,
        r#"{"msg_id": "m2", "topic": "refunds"}"#,
        r#"{"msg_id": "m3", "topic": "orders", "meta": {"region": "us"}}"#,
    ]);

    let (state, written) = run_job(&params, &input).await;
    assert_eq!(state, DriverState::Stopped);
    assert_eq!(written, 3);

    let rows = read_output(&ws.path("out")).await;
    assert_eq!(
        rows,
        vec![
            json!({"event_id": "m1", "topic": "orders", "region": "eu", "label": "ORDERS-m1"}),
            json!({"event_id": "m2", "topic": "refunds", "region": null, "label": "REFUNDS-m2"}),
            json!({"event_id": "m3", "topic": "orders", "region": "us", "label": "ORDERS-m3"}),
        ]
    );

    let checkpoint_file = ws
        .path("tmp")
        .join("events-projection")
        .join("checkpoint")
        .join(CHECKPOINT_FILE);
    assert!(checkpoint_file.exists());
}

#[tokio::test]
async fn test_pipeline_preserves_column_order() {
    let ws = Workspace::new();
    let params = ws.params();
    let input = ws.write_input(&[r#"{"topic": "t", "msg_id": "m"}"#]);

    run_job(&params, &input).await;

    let destination = CloudDestination::parse(&ws.path("out").display().to_string()).unwrap();
    let objects = destination.list(PARTITION).await.unwrap();
    assert_eq!(objects.len(), 1);
    let data = destination.read(&objects[0]).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&data).unwrap(),
        "{\"event_id\":\"m\",\"topic\":\"t\",\"region\":null,\"label\":\"T-m\"}\n"
    );
}

#[tokio::test]
async fn test_pipeline_skips_malformed_lines() {
    let ws = Workspace::new();
    let params = ws.params();
    let input = ws.write_input(&[
        r#"{"msg_id": "m1", "topic": "a"}"#,
        "{not json",
        "",
        r#"{"msg_id": "m2", "topic": "b"}"#,
    ]);

    let (_, written) = run_job(&params, &input).await;
    assert_eq!(written, 2);
    assert_eq!(read_output(&ws.path("out")).await.len(), 2);
}

#[tokio::test]
async fn test_pipeline_resumes_after_committed_position() {
    let ws = Workspace::new();
    let params = ws.params();
    let mut lines = vec![
        r#"{"msg_id": "m1", "topic": "a"}"#,
        r#"{"msg_id": "m2", "topic": "a"}"#,
        r#"{"msg_id": "m3", "topic": "a"}"#,
    ];
    let input = ws.write_input(&lines);
    let (_, first) = run_job(&params, &input).await;
    assert_eq!(first, 3);

    lines.push(r#"{"msg_id": "m4", "topic": "b"}"#);
    lines.push(r#"{"msg_id": "m5", "topic": "b"}"#);
    let input = ws.write_input(&lines);
    let (_, second) = run_job(&params, &input).await;
    assert_eq!(second, 2);

    let mut ids: Vec<String> = read_output(&ws.path("out"))
        .await
        .iter()
        .map(|row| row["event_id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["m1", "m2", "m3", "m4", "m5"]);

    let checkpoint = CheckpointManager::from_dir(params.checkpoint_location())
        .unwrap()
        .checkpoint()
        .await;
    assert_eq!(checkpoint.position, 5);
    // 2 + 1 records in the first run, 2 in the second
    assert_eq!(checkpoint.last_batch_id, Some(2));
}

#[tokio::test]
async fn test_pipeline_empty_input_writes_nothing() {
    let ws = Workspace::new();
    let params = ws.params();
    let input = ws.write_input(&[]);

    let (state, written) = run_job(&params, &input).await;
    assert_eq!(state, DriverState::Stopped);
    assert_eq!(written, 0);
    assert!(read_output(&ws.path("out")).await.is_empty());
    assert!(!params.checkpoint_location().join(CHECKPOINT_FILE).exists());
}

#[test]
fn test_invalid_selector_document_fails_before_run() {
    let ws = Workspace::new();
    let mut params = ws.params();
    params.selected_fields = r#"{"selected-fields": [{"a": "x"}, {"a": "y"}]}"#.to_string();
    assert!(params.into_context().unwrap_err().is_config());
}
