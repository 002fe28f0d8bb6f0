//! Error types for the synchronization library.

use thiserror::Error;

/// Main error type for synchronization operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid pattern, bad batch bound, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table has no primary key (required for the merge-join)
    #[error("Table {0} has no primary key - differential synchronization requires one")]
    NoPrimaryKey(String),

    /// Catalog metadata is internally inconsistent
    #[error("Catalog inconsistency: {0}")]
    Catalog(String),

    /// Database driver error with context about where it occurred
    #[error("Driver error: {message}\n  Context: {context}")]
    Driver { message: String, context: String },

    /// Primary-key values with no defined total order
    #[error("Primary key values of kind {left} and {right} have no defined ordering")]
    Incomparable {
        left: &'static str,
        right: &'static str,
    },

    /// Background cursor task died before producing a result
    #[error("Background task failed: {0}")]
    Task(String),

    /// Synchronization was cancelled cooperatively
    #[error("Synchronization cancelled")]
    Cancelled,

    /// IO error (config file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a Driver error with context about where it occurred
    pub fn driver(message: impl Into<String>, context: impl Into<String>) -> Self {
        SyncError::Driver {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
