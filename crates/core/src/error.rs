//! Error types for the graph tokenization library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenization library.
///
/// Every variant is a programmer or input error; nothing here is transient,
/// so callers should surface them rather than retry.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Input cannot be decomposed at the requested granularity
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Training was invoked on a corpus without a single mergeable boundary
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// A merge table was applied to a sequence it was not trained for
    #[error("Incompatible merge table: {0}")]
    IncompatibleTable(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid merge rule
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),

    /// Error loading a merge table
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving a merge table
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
