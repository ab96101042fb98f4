//! Error types for the canvas engine

use thiserror::Error;

/// Result type alias using CanvasError
pub type Result<T> = std::result::Result<T, CanvasError>;

/// Errors that can occur while editing, snapshotting or persisting a canvas
///
/// Illegal edits (self-loops, duplicate edges) are not errors; they are
/// dropped by the store. See [`crate::validation::ConnectionRejection`].
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// History entry index out of range
    #[error("History entry {index} out of range (length {len})")]
    HistoryOutOfRange { index: usize, len: usize },

    /// Snapshot persistence error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CanvasError {
    /// Create a persistence error with a message
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
