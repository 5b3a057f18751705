//! Batch projector
//!
//! Applies every selector to every record of a batch.

use super::extractor::extract_field;
use crate::selector::SelectorSet;
use crate::source::Batch;
use crate::types::JsonValue;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A record narrowed to the configured columns, in configured order
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRecord {
    columns: Vec<(String, JsonValue)>,
}

impl ProjectedRecord {
    /// Create a projected record from ordered column values
    pub fn new(columns: Vec<(String, JsonValue)>) -> Self {
        Self { columns }
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Get a column value by name
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the record has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over (column, value) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

// Serializes as a JSON object with keys in column order
impl Serialize for ProjectedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Project a single record
pub fn project_record(record: &JsonValue, selectors: &SelectorSet) -> ProjectedRecord {
    ProjectedRecord::new(
        selectors
            .iter()
            .map(|selector| (selector.column.clone(), extract_field(record, selector)))
            .collect(),
    )
}

/// Project every record of a batch, preserving order
pub fn project_batch(batch: &Batch, selectors: &SelectorSet) -> Vec<ProjectedRecord> {
    project_records(&batch.records, selectors)
}

/// Project a slice of records, preserving order
pub fn project_records(records: &[JsonValue], selectors: &SelectorSet) -> Vec<ProjectedRecord> {
    records
        .iter()
        .map(|record| project_record(record, selectors))
        .collect()
}
