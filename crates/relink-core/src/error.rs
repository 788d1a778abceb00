//! Core error types for relink.

use relink_indexer::IndexerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Mapping file missing, unreadable or malformed
    #[error("Mapping file error: {0}")]
    Mapping(#[source] IndexerError),

    /// Source file could not be parsed or rewritten
    #[error("Failed to rewrite {path}: {message}")]
    Rewrite { path: PathBuf, message: String },

    /// Configuration missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ini::Error> for CoreError {
    fn from(e: ini::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
