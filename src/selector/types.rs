//! Field selector types
//!
//! A validated, ordered list of output columns and their compiled
//! source-expressions.

use crate::expression::Expression;

/// One configured output column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelector {
    /// Output column name
    pub column: String,
    /// Source-expression as written in the configuration
    pub source: String,
    /// Compiled expression
    pub expression: Expression,
}

impl FieldSelector {
    /// Create a selector from an already compiled expression
    pub fn new(column: impl Into<String>, source: impl Into<String>, expression: Expression) -> Self {
        Self {
            column: column.into(),
            source: source.into(),
            expression,
        }
    }
}

/// Ordered, validated set of field selectors
///
/// Column names are unique and the order defines the output schema.
/// Built only by the loader, so every instance has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSet {
    selectors: Vec<FieldSelector>,
}

impl SelectorSet {
    pub(crate) fn from_validated(selectors: Vec<FieldSelector>) -> Self {
        Self { selectors }
    }

    /// Output column names in order
    pub fn columns(&self) -> Vec<&str> {
        self.selectors.iter().map(|s| s.column.as_str()).collect()
    }

    /// Number of output columns
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Check if there are no selectors
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Get a selector by output column name
    pub fn get(&self, column: &str) -> Option<&FieldSelector> {
        self.selectors.iter().find(|s| s.column == column)
    }

    /// Iterate over selectors in output order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldSelector> {
        self.selectors.iter()
    }
}

impl<'a> IntoIterator for &'a SelectorSet {
    type Item = &'a FieldSelector;
    type IntoIter = std::slice::Iter<'a, FieldSelector>;

    fn into_iter(self) -> Self::IntoIter {
        self.selectors.iter()
    }
}
