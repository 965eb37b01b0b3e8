//! Error types for domain documents.

use thiserror::Error;

/// Errors arising from document decoding and validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document failed to encode or decode.
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A signed node info carried the wrong number of signatures.
    #[error("expected {expected} identity signatures, got {actual}")]
    SignatureCount {
        /// Number of legal identities in the node info.
        expected: usize,
        /// Number of signatures supplied.
        actual: usize,
    },

    /// A node info signature did not verify against its identity key.
    #[error("invalid signature for identity {name:?}")]
    InvalidIdentitySignature {
        /// The identity whose signature failed.
        name: String,
    },

    /// A whitelist line was not of the form `<fqn>:<sha256>`.
    #[error("malformed whitelist line: {0:?}")]
    BadWhitelistLine(String),
}

/// A specialized Result type for document operations.
pub type Result<T> = std::result::Result<T, CoreError>;
