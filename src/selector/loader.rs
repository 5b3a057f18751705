//! Loader for the `selected-fields` configuration document
//!
//! Accepts the JSON document handed to the job as a parameter, or a file in
//! JSON or YAML form.

use super::types::{FieldSelector, SelectorSet};
use crate::error::{Error, Result};
use crate::expression::parse_expression;
use crate::types::JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Top-level key holding the selector list
pub const SELECTED_FIELDS_KEY: &str = "selected-fields";

/// Load selectors from a file
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else as JSON.
pub fn load_selectors(path: impl AsRef<Path>) -> Result<SelectorSet> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read selector config '{}': {e}",
            path.display()
        ))
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        let document: JsonValue = serde_yaml::from_str(&content)?;
        load_selectors_from_value(&document)
    } else {
        load_selectors_from_str(&content)
    }
}

/// Load selectors from a JSON document string
pub fn load_selectors_from_str(document: &str) -> Result<SelectorSet> {
    let document: JsonValue = serde_json::from_str(document)
        .map_err(|e| Error::config(format!("Malformed selector document: {e}")))?;
    load_selectors_from_value(&document)
}

/// Load selectors from a parsed document
pub fn load_selectors_from_value(document: &JsonValue) -> Result<SelectorSet> {
    let root = document
        .as_object()
        .ok_or_else(|| Error::config("Selector document must be a mapping"))?;

    let entries = root
        .get(SELECTED_FIELDS_KEY)
        .ok_or_else(|| Error::missing_field(SELECTED_FIELDS_KEY))?
        .as_array()
        .ok_or_else(|| Error::invalid_value(SELECTED_FIELDS_KEY, "must be a list"))?;

    if entries.is_empty() {
        return Err(Error::invalid_value(
            SELECTED_FIELDS_KEY,
            "must contain at least one field",
        ));
    }

    let mut seen = HashSet::new();
    let mut selectors = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let field = format!("{SELECTED_FIELDS_KEY}[{idx}]");

        let map = entry
            .as_object()
            .filter(|m| m.len() == 1)
            .ok_or_else(|| Error::invalid_value(&field, "must be a single-key mapping"))?;

        // Exactly one entry, checked above
        let Some((column, source)) = map.iter().next() else {
            continue;
        };

        if column.trim().is_empty() {
            return Err(Error::invalid_value(&field, "output column name is empty"));
        }

        let source = source.as_str().ok_or_else(|| {
            Error::invalid_value(&field, "source-expression must be a string")
        })?;

        if !seen.insert(column.clone()) {
            return Err(Error::DuplicateColumn {
                column: column.clone(),
            });
        }

        let expression = parse_expression(source)?;
        debug!(column = %column, expression = %expression, "Compiled field selector");
        selectors.push(FieldSelector::new(column.clone(), source, expression));
    }

    Ok(SelectorSet::from_validated(selectors))
}
