//! Error types for the model-store crate.
//!
//! Every load failure is fatal: there is no partial or degraded store for a
//! required artifact. The one optional artifact (the quality-weighted
//! interaction matrix) never produces an error when absent.

use thiserror::Error;

/// Errors that can occur while loading or assembling a [`crate::ModelStore`]
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required artifact file is missing from the model directory
    #[error("Required artifact not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Line in an artifact file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field parsed but holds a value outside its domain
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Embedding dimensions must be uniform across one load
    #[error("Embedding for article {article_id} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        article_id: u32,
        expected: usize,
        found: usize,
    },

    /// Cross-artifact consistency check failed
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Convenience alias for results in this crate
pub type Result<T> = std::result::Result<T, LoadError>;
