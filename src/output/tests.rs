//! Tests for output module

use super::*;
use crate::error::Error;
use crate::projection::ProjectedRecord;
use crate::types::TransformationContext;
use chrono::{TimeZone, Utc};
use serde_json::json;

fn record(id: &str, topic: &str) -> ProjectedRecord {
    ProjectedRecord::new(vec![
        ("id".to_string(), json!(id)),
        ("topic".to_string(), json!(topic)),
    ])
}

fn partition() -> OutputPartition {
    let time = Utc.with_ymd_and_hms(2024, 3, 7, 5, 30, 0).unwrap();
    OutputPartition::at("memory://", time)
}

// ============================================================================
// NDJSON Encoding Tests
// ============================================================================

#[test]
fn test_encode_ndjson_one_object_per_line() {
    let data = encode_ndjson(&[record("a", "x"), record("b", "y")]).unwrap();
    let text = std::str::from_utf8(&data).unwrap();
    assert_eq!(
        text,
        "{\"id\":\"a\",\"topic\":\"x\"}\n{\"id\":\"b\",\"topic\":\"y\"}\n"
    );
    assert!(!text.starts_with('['));
}

#[test]
fn test_encode_ndjson_nulls_and_nested() {
    let rec = ProjectedRecord::new(vec![
        ("missing".to_string(), json!(null)),
        ("nested".to_string(), json!({"k": [1, 2]})),
    ]);
    let data = encode_ndjson(&[rec]).unwrap();
    assert_eq!(&data[..], b"{\"missing\":null,\"nested\":{\"k\":[1,2]}}\n");
}

#[test]
fn test_encode_ndjson_empty() {
    assert!(encode_ndjson(&[]).unwrap().is_empty());
}

#[test]
fn test_object_name_is_unique() {
    let ctx = TransformationContext::new("output", 12);
    let a = object_name(&ctx);
    let b = object_name(&ctx);
    assert!(a.starts_with("part-00000012-"));
    assert!(a.ends_with(".json"));
    assert_ne!(a, b);
}

// ============================================================================
// ObjectStoreWriter Tests
// ============================================================================

#[tokio::test]
async fn test_writer_places_object_in_partition() {
    let writer = ObjectStoreWriter::new(CloudDestination::in_memory());
    let ctx = TransformationContext::new("output", 3);

    let receipt = writer
        .write(&[record("a", "x"), record("b", "y")], &partition(), &ctx)
        .await
        .unwrap();

    assert_eq!(receipt.records, 2);
    assert!(receipt
        .path
        .starts_with("memory://ingest_year=2024/ingest_month=03/ingest_day=07/ingest_hour=05/part-00000003-"));

    let objects = writer
        .destination()
        .list(&partition().prefix())
        .await
        .unwrap();
    assert_eq!(objects.len(), 1);

    let body = writer.destination().read(&objects[0]).await.unwrap();
    assert_eq!(body.len(), receipt.bytes);
    let lines: Vec<serde_json::Value> = std::str::from_utf8(&body)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![json!({"id": "a", "topic": "x"}), json!({"id": "b", "topic": "y"})]
    );
}

#[tokio::test]
async fn test_repeated_writes_to_same_partition_do_not_overwrite() {
    let writer = ObjectStoreWriter::new(CloudDestination::in_memory());

    for batch_id in 0..3 {
        let ctx = TransformationContext::new("output", batch_id);
        writer.write(&[record("a", "x")], &partition(), &ctx).await.unwrap();
    }
    // Same batch id twice still yields distinct objects
    let ctx = TransformationContext::new("output", 2);
    writer.write(&[record("a", "x")], &partition(), &ctx).await.unwrap();

    let objects = writer
        .destination()
        .list(&partition().prefix())
        .await
        .unwrap();
    assert_eq!(objects.len(), 4);
}

#[tokio::test]
async fn test_writer_rejects_empty_batch() {
    let writer = ObjectStoreWriter::new(CloudDestination::in_memory());
    let ctx = TransformationContext::new("output", 0);
    let err = writer.write(&[], &partition(), &ctx).await.unwrap_err();
    assert!(matches!(err, Error::Write { .. }));
}

#[tokio::test]
async fn test_writer_local_filesystem() {
    let temp_dir = tempfile::tempdir().unwrap();
    let writer = ObjectStoreWriter::from_url(temp_dir.path().to_str().unwrap()).unwrap();
    let ctx = TransformationContext::new("output", 1);

    writer.write(&[record("a", "x")], &partition(), &ctx).await.unwrap();

    let dir = temp_dir
        .path()
        .join("ingest_year=2024/ingest_month=03/ingest_day=07/ingest_hour=05");
    let files: Vec<_> = std::fs::read_dir(dir).unwrap().collect();
    assert_eq!(files.len(), 1);
}
