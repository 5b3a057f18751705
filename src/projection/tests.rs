//! Tests for projection module

use super::*;
use crate::selector::{load_selectors_from_value, SelectorSet};
use crate::source::Batch;
use pretty_assertions::assert_eq;
use serde_json::json;

fn selectors(doc: serde_json::Value) -> SelectorSet {
    load_selectors_from_value(&doc).unwrap()
}

fn id_topic() -> SelectorSet {
    selectors(json!({"selected-fields": [{"id": "$.msg_id"}, {"topic": "$.msg_topic"}]}))
}

// ============================================================================
// Single Record Tests
// ============================================================================

#[test]
fn test_projection_drops_unselected_fields() {
    let record = json!({"msg_id": "abc", "msg_topic": "x", "extra": 1});
    let projected = project_record(&record, &id_topic());

    assert_eq!(projected.column_names(), vec!["id", "topic"]);
    assert_eq!(projected.get("id"), Some(&json!("abc")));
    assert_eq!(projected.get("topic"), Some(&json!("x")));
    assert_eq!(projected.get("extra"), None);
    assert_eq!(serde_json::to_value(&projected).unwrap(), json!({"id": "abc", "topic": "x"}));
}

#[test]
fn test_projection_missing_field_is_null() {
    let record = json!({"msg_id": "abc"});
    let projected = project_record(&record, &id_topic());

    assert_eq!(projected.len(), 2);
    assert_eq!(projected.get("topic"), Some(&json!(null)));
}

#[test]
fn test_projection_serializes_in_column_order() {
    let set = selectors(json!({
        "selected-fields": [{"zeta": "z"}, {"alpha": "a"}, {"mid": "concat(a, '-', z)"}]
    }));
    let projected = project_record(&json!({"a": "A", "z": "Z", "q": 0}), &set);

    let line = serde_json::to_string(&projected).unwrap();
    assert_eq!(line, r#"{"zeta":"Z","alpha":"A","mid":"A-Z"}"#);
}

#[test]
fn test_projection_same_source_into_two_columns() {
    let set = selectors(json!({
        "selected-fields": [{"raw": "msg_topic"}, {"normalized": "lower(msg_topic)"}]
    }));
    let projected = project_record(&json!({"msg_topic": "Orders"}), &set);
    assert_eq!(serde_json::to_value(&projected).unwrap(), json!({"raw": "Orders", "normalized": "orders"}));
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn test_project_batch_preserves_length_and_order() {
    let batch = Batch::new(
        1,
        vec![
            json!({"msg_id": "1", "msg_topic": "a"}),
            json!({"msg_topic": "b"}),
            json!("not an object"),
            json!({"msg_id": "4", "msg_topic": "d", "payload": {"x": 1}}),
        ],
        4,
    );
    let set = id_topic();
    let projected = project_batch(&batch, &set);

    assert_eq!(projected.len(), batch.len());
    for record in &projected {
        assert_eq!(record.column_names(), set.columns());
    }
    let ids: Vec<_> = projected.iter().map(|r| r.get("id").cloned()).collect();
    assert_eq!(
        ids,
        vec![
            Some(json!("1")),
            Some(json!(null)),
            Some(json!(null)),
            Some(json!("4"))
        ]
    );
}

#[test]
fn test_project_empty_batch() {
    let batch = Batch::new(0, vec![], 0);
    assert!(project_batch(&batch, &id_topic()).is_empty());
}

#[test]
fn test_projection_is_pure() {
    let batch = Batch::new(2, vec![json!({"msg_id": "x", "msg_topic": "y"})], 1);
    let set = id_topic();
    let first = project_batch(&batch, &set);
    let second = project_batch(&batch, &set);
    assert_eq!(first, second);
    assert_eq!(batch.records[0], json!({"msg_id": "x", "msg_topic": "y"}));
}

#[test]
fn test_projected_record_iter() {
    let projected = ProjectedRecord::new(vec![
        ("a".to_string(), json!(1)),
        ("b".to_string(), json!(null)),
    ]);
    let pairs: Vec<_> = projected.iter().collect();
    assert_eq!(pairs, vec![("a", &json!(1)), ("b", &json!(null))]);
    assert!(!projected.is_empty());
}
