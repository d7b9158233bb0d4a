//! Error types for verification runs.

use std::path::PathBuf;

use noderack_core::{GraphError, ProcessError};
use thiserror::Error;

/// Errors that can occur while loading settings or running cases.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A case's graph could not be built
    #[error("failed to build graph: {0}")]
    Graph(#[from] GraphError),

    /// The processor rejected its settings or stalled
    #[error("processing failed: {0}")]
    Process(#[from] ProcessError),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings are out of range
    #[error("invalid render settings: {0}")]
    InvalidSettings(String),

    /// No case with this name is registered
    #[error("unknown verification case: {0}")]
    UnknownCase(String),

    /// A case with this name is already registered
    #[error("verification case already registered: {0}")]
    DuplicateCase(String),
}

impl VerifyError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VerifyError::ReadFile {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
