//! Field selector module
//!
//! Loads and validates the `selected-fields` configuration document.
//!
//! # Overview
//!
//! The document has the shape
//!
//! ```json
//! {"selected-fields": [{"id": "$.msg_id"}, {"topic": "$.msg_topic"}]}
//! ```
//!
//! Each entry maps one output column to a source-expression. Loading compiles
//! every expression, so an unsupported expression fails the job before any
//! batch is read.

mod loader;
mod types;

pub use loader::{
    load_selectors, load_selectors_from_str, load_selectors_from_value, SELECTED_FIELDS_KEY,
};
pub use types::{FieldSelector, SelectorSet};
