//! Orchestrator error types.

use thiserror::Error;

use veon_core::VeonError;

/// Errors surfaced by a conversational turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The retention subsystem rejected or failed the turn.
    #[error(transparent)]
    Memory(#[from] VeonError),

    /// The blocking worker running the turn panicked or was cancelled.
    #[error("Turn worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Serialising a turn outcome failed.
    #[error("Failed to encode turn outcome: {0}")]
    Encode(#[from] serde_json::Error),

    /// The tracing subscriber could not be installed.
    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ChatError>;
