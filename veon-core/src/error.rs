//! Error types for the VEON memory core.

use thiserror::Error;

use crate::types::MemoryId;

/// Top-level error type for all memory retention operations.
#[derive(Error, Debug)]
pub enum VeonError {
    /// Input rejected before any store mutation (NaN signal, empty content, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A store adapter failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite adapter failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The addressed record no longer exists (e.g. pruned concurrently).
    #[error("Memory not found: {0}")]
    NotFound(MemoryId),

    /// A conditional write found the record changed since it was read.
    #[error("Write conflict on memory {0}: record changed since it was read")]
    Conflict(MemoryId),

    /// A prune sweep stopped part-way. Earlier deletions are not rolled back.
    #[error("Prune stopped after {deleted} deletions: {source}")]
    PruneIncomplete {
        /// Records actually deleted before the failure.
        deleted: usize,
        /// The failure that stopped the sweep.
        source: Box<VeonError>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VeonError {
    /// Whether this error originated in a store adapter.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_))
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, VeonError>;
