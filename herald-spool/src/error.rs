//! Error types for the herald-spool crate.

use std::io;

use thiserror::Error;

use crate::RecordId;

/// Top-level spool error type.
#[derive(Debug, Error)]
pub enum SpoolError {
    /// I/O operation failed (file read/write/rename/delete).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Record not found in the store.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Spool directory validation failed.
    #[error("Spool validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal error (lock poisoning, injected faults, etc.).
    #[error("Internal error: {0}")]
    Internal(String),

    /// A record with this id already exists.
    #[error("Record already exists: {0}")]
    AlreadyExists(RecordId),

    /// The store holds as many records as it is allowed to.
    #[error("Spool capacity exceeded: {0} records")]
    CapacityExceeded(usize),
}

impl SpoolError {
    /// Whether the stored record itself is unreadable, as opposed to the store
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}

/// Serialization and deserialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The document is not valid JSON for a record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but breaks a record invariant.
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

/// Spool directory validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Spool path is not a directory.
    #[error("Spool path is not a directory: {0}")]
    NotDirectory(String),

    /// Invalid spool configuration.
    #[error("Invalid spool configuration: {0}")]
    InvalidConfiguration(String),
}

/// Specialized `Result` type for spool operations.
pub type Result<T> = std::result::Result<T, SpoolError>;

impl<T> From<std::sync::PoisonError<T>> for SpoolError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
