//! Error types for skilltree-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for JSONL reading and writing.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be serialized to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A specific line could not be parsed.
    #[error("line {line_number}: {source}")]
    Parse {
        /// 1-based line number of the offending line.
        line_number: usize,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid JSONL format.
    #[error("Invalid JSONL format: {0}")]
    InvalidFormat(String),
}

/// A specialized Result type for skilltree-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
