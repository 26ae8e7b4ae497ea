//! Storage error types for ransim-storage.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// No run with the given id is stored.
    #[error("run not found: {0}")]
    RunNotFound(String),

    /// A stored row could not be decoded.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}
