//! Error types for generation jobs

use thiserror::Error;

/// Result type alias using GenerationError
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors that can occur while submitting, tracking or approving a job
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation needed a current job but there is none
    #[error("No active generation job")]
    NoActiveJob,

    /// An operation needed an open review gate
    #[error("No review pending for job {0}")]
    NoPendingReview(String),

    /// A job is already being generated
    #[error("Job {0} is already in progress")]
    AlreadyGenerating(String),

    /// Canvas error while preparing a submission
    #[error("Canvas error: {0}")]
    Canvas(#[from] blueprint_canvas::CanvasError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Create an API error from a status code and body
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the same request might succeed
    ///
    /// Transport failures and 5xx responses are transient; everything else
    /// will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder() && !e.is_decode(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
