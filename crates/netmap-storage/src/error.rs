//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No entry under the requested key.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Backend(String),

    /// A stored value could not be interpreted.
    #[error("corrupt entry under {key:?}: {reason}")]
    Corrupt {
        /// Key of the unreadable entry.
        key: String,
        /// What went wrong decoding it.
        reason: String,
    },
}

impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// A specialized Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
