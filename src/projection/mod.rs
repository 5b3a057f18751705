//! Projection module
//!
//! Narrows and renames records according to the selector set.
//!
//! # Overview
//!
//! - `extract_field` - resolve one selector against one record (missing → null)
//! - `project_record` / `project_batch` - apply all selectors, keeping only the
//!   configured columns in configured order
//!
//! Projection is a pure function of its inputs. Field-level failures never
//! escape this module.

mod extractor;
mod projector;

pub use extractor::extract_field;
pub use projector::{project_batch, project_record, project_records, ProjectedRecord};

#[cfg(test)]
mod tests;
