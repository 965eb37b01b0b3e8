//! Processor error types.

use thiserror::Error;

/// Errors surfaced by processor operations.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// A document failed validation or signature checks.
    #[error("invalid document: {0}")]
    Invalid(#[from] netmap_core::CoreError),

    /// A served artifact failed signature verification.
    #[error("artifact verification failed: {0}")]
    Artifact(#[from] netmap_identity::IdentityError),

    /// A published node claims a legal name already owned by another key.
    #[error("identity name(s) already registered to a different key: {}", names.join(", "))]
    NameConflict {
        /// The names in conflict.
        names: Vec<String>,
    },

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] netmap_storage::StorageError),

    /// A stored pointer did not resolve to a usable document.
    #[error("broken pointer {key:?}: {reason}")]
    BrokenPointer {
        /// The pointer key.
        key: String,
        /// Why it could not be followed.
        reason: String,
    },

    /// The processor has shut down and no longer accepts work.
    #[error("processor is stopped")]
    Stopped,
}

/// A specialized Result type for processor operations.
pub type Result<T> = std::result::Result<T, ProcessorError>;
