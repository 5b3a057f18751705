//! Expression module
//!
//! The restricted expression language used by field selectors.
//!
//! # Overview
//!
//! Source-expressions are parsed once, when the selector configuration is
//! loaded, into a closed set of [`Expression`] variants:
//! - field references and dotted/indexed paths (`msg_id`, `$.payload.user.id`,
//!   `items[0]`, `col("payload.id")`)
//! - literals (`'text'`, `42`, `true`, `null`, `lit(...)`)
//! - the combinators `concat`, `coalesce`, `lower`, `upper`, `trim`
//!
//! Nothing is ever executed dynamically; an expression outside this language
//! fails with [`crate::Error::Expression`] at load time.

mod parser;
mod types;

pub use parser::{parse_expression, parse_path};
pub use types::{Expression, FieldPath, PathSegment};
