//! Error types for streamproj
//!
//! This module defines the error hierarchy for the whole job.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for streamproj
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Duplicate output column '{column}' in selected-fields")]
    DuplicateColumn { column: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Expression Errors
    // ============================================================================
    #[error("Unsupported expression '{expression}' at position {position}: {message}")]
    Expression {
        expression: String,
        position: usize,
        message: String,
    },

    #[error("Field '{path}' not found in record")]
    Extraction { path: String },

    // ============================================================================
    // Stream Errors
    // ============================================================================
    #[error("Source error: {message}")]
    Source { message: String },

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Batch {batch_id} failed after {attempts} attempts: {source}")]
    BatchFailed {
        batch_id: u64,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Checkpoint Errors
    // ============================================================================
    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an expression error
    pub fn expression(
        expression: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Expression {
            expression: expression.into(),
            position,
            message: message.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<String>) -> Self {
        Self::Extraction { path: path.into() }
    }

    /// Create a stream source error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a checkpoint error
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Check if this error belongs to the configuration class (fatal at startup)
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::DuplicateColumn { .. }
                | Error::YamlParse(_)
                | Error::JsonParse(_)
                | Error::Expression { .. }
        )
    }

    /// Check if this error is retryable at the batch level
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Write { .. } | Error::Io(_))
    }
}

/// Result type alias for streamproj
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("selected-fields");
        assert_eq!(
            err.to_string(),
            "Missing required config field: selected-fields"
        );

        let err = Error::expression("eval(x)", 0, "unknown function 'eval'");
        assert_eq!(
            err.to_string(),
            "Unsupported expression 'eval(x)' at position 0: unknown function 'eval'"
        );
    }

    #[test]
    fn test_batch_failed_display() {
        let err = Error::BatchFailed {
            batch_id: 7,
            attempts: 4,
            source: Box::new(Error::write("out/part.json", "disk full")),
        };
        assert_eq!(
            err.to_string(),
            "Batch 7 failed after 4 attempts: Failed to write out/part.json: disk full"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::write("p", "timeout").is_retryable());
        assert!(Error::Io(std::io::Error::other("broken pipe")).is_retryable());

        assert!(!Error::config("test").is_retryable());
        assert!(!Error::checkpoint("test").is_retryable());
        assert!(!Error::extraction("a.b").is_retryable());
    }

    #[test]
    fn test_is_config() {
        assert!(Error::config("x").is_config());
        assert!(Error::DuplicateColumn {
            column: "id".to_string()
        }
        .is_config());
        assert!(Error::expression("x +", 2, "bad").is_config());
        assert!(!Error::write("p", "m").is_config());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
