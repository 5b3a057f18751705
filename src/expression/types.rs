//! Expression types
//!
//! The compiled form of a source-expression. Every variant evaluates against a
//! record without side effects.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::fmt;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member access (`.name` or `['name']`)
    Key(String),
    /// Array element access (`[0]`)
    Index(usize),
}

/// Dotted path into a semi-structured record
///
/// An empty path refers to the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Create a path from segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Resolve the path against a record
    pub fn resolve<'a>(&self, record: &'a JsonValue) -> Option<&'a JsonValue> {
        let mut current = record;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), JsonValue::Object(map)) => map.get(key)?,
                (PathSegment::Index(idx), JsonValue::Array(items)) => items.get(*idx)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => write!(f, ".{key}")?,
                PathSegment::Key(key) => write!(f, "['{}']", escape_quoted(key, '\''))?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// A compiled source-expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Field reference or nested path
    Path(FieldPath),
    /// Constant value
    Literal(JsonValue),
    /// String concatenation; null if any argument is null
    Concat(Vec<Expression>),
    /// First non-null argument
    Coalesce(Vec<Expression>),
    /// Lowercase the string form of the argument
    Lower(Box<Expression>),
    /// Uppercase the string form of the argument
    Upper(Box<Expression>),
    /// Trim surrounding whitespace from the string form of the argument
    Trim(Box<Expression>),
}

impl Expression {
    /// Evaluate against a record, surfacing unresolved top-level paths
    ///
    /// Only a bare path reports [`Error::Extraction`]. Inside combinators an
    /// unresolved path is treated as null.
    pub fn try_evaluate(&self, record: &JsonValue) -> Result<JsonValue> {
        match self {
            Self::Path(path) => path
                .resolve(record)
                .cloned()
                .ok_or_else(|| Error::extraction(path.to_string())),
            other => Ok(other.evaluate(record)),
        }
    }

    /// Evaluate against a record; anything unresolvable yields null
    pub fn evaluate(&self, record: &JsonValue) -> JsonValue {
        match self {
            Self::Path(path) => path.resolve(record).cloned().unwrap_or(JsonValue::Null),
            Self::Literal(value) => value.clone(),
            Self::Concat(args) => {
                let mut out = String::new();
                for arg in args {
                    match stringify(&arg.evaluate(record)) {
                        Some(part) => out.push_str(&part),
                        None => return JsonValue::Null,
                    }
                }
                JsonValue::String(out)
            }
            Self::Coalesce(args) => args
                .iter()
                .map(|arg| arg.evaluate(record))
                .find(|value| !value.is_null())
                .unwrap_or(JsonValue::Null),
            Self::Lower(arg) => map_string(&arg.evaluate(record), |s| s.to_lowercase()),
            Self::Upper(arg) => map_string(&arg.evaluate(record), |s| s.to_uppercase()),
            Self::Trim(arg) => map_string(&arg.evaluate(record), |s| s.trim().to_string()),
        }
    }

    /// All field paths this expression reads
    pub fn referenced_paths(&self) -> Vec<&FieldPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Self::Path(path) => out.push(path),
            Self::Literal(_) => {}
            Self::Concat(args) | Self::Coalesce(args) => {
                for arg in args {
                    arg.collect_paths(out);
                }
            }
            Self::Lower(arg) | Self::Upper(arg) | Self::Trim(arg) => arg.collect_paths(out),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{path}"),
            Self::Literal(JsonValue::String(s)) => write!(f, "'{}'", escape_quoted(s, '\'')),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Concat(args) => write_call(f, "concat", args),
            Self::Coalesce(args) => write_call(f, "coalesce", args),
            Self::Lower(arg) => write!(f, "lower({arg})"),
            Self::Upper(arg) => write!(f, "upper({arg})"),
            Self::Trim(arg) => write!(f, "trim({arg})"),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expression]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

/// String form used by the string combinators; `None` for null
fn stringify(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        // Compact JSON for nested values
        other => Some(other.to_string()),
    }
}

fn map_string(value: &JsonValue, f: impl FnOnce(&str) -> String) -> JsonValue {
    match stringify(value) {
        Some(s) => JsonValue::String(f(&s)),
        None => JsonValue::Null,
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn escape_quoted(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
