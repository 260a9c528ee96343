//! Classifier error types.

use thiserror::Error;

/// Errors an emotion classifier can report.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Nothing to classify.
    #[error("Cannot classify empty text")]
    EmptyInput,

    /// The classifier backend could not be reached.
    #[error("Emotion classifier unavailable: {0}")]
    Unavailable(String),

    /// The classifier answered with something unusable.
    #[error("Malformed classifier output: {0}")]
    Malformed(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SignalError>;
