//! # Netmap Identity
//!
//! Cryptographic identity for the network map service: Ed25519 key
//! material, a minimal certificate chain rooted in the network root CA,
//! and the signer that turns service artifacts into [`SignedBlob`]s.
//!
//! ## Example
//!
//! ```rust
//! use netmap_identity::CertificateAuthority;
//!
//! let ca = CertificateAuthority::generate("Netmap Dev Root");
//! let signer = ca.network_map_signer();
//!
//! let blob = signer.sign(b"payload".to_vec());
//! assert_eq!(signer.verify(&blob).unwrap(), b"payload");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod certificate;
mod error;
mod keypair;
mod signer;

pub use certificate::{Certificate, CertificateAuthority};
pub use error::{IdentityError, Result};
pub use keypair::{Keypair, PublicKey, Signature};
pub use signer::{NetworkMapSigner, SignedBlob};
