//! Error types for identity operations.

use thiserror::Error;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The signature does not match the payload.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The public key bytes are malformed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The secret key bytes are malformed.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// The certificate does not chain to the expected root.
    #[error("certificate for {subject:?} is not signed by the trusted root")]
    UntrustedCertificate {
        /// Subject named in the rejected certificate.
        subject: String,
    },

    /// A signed blob could not be decoded.
    #[error("malformed signed blob: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A specialized Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
