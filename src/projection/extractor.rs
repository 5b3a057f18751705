//! Field extractor
//!
//! Resolves one selector against one record.

use crate::selector::FieldSelector;
use crate::types::JsonValue;
use tracing::trace;

/// Extract the value of one selector from a record
///
/// A field missing from the record yields null. Records are schema-on-read,
/// so absence is expected and never aborts the batch.
pub fn extract_field(record: &JsonValue, selector: &FieldSelector) -> JsonValue {
    selector
        .expression
        .try_evaluate(record)
        .unwrap_or_else(|e| {
            trace!(column = %selector.column, error = %e, "Field not present, using null");
            JsonValue::Null
        })
}
