//! Request and response bodies.

use netmap_core::{NodeInfo, SecureHash};
use netmap_identity::{PublicKey, Result as IdentityResult, Signature};
use serde::{Deserialize, Serialize};

/// A participant's acknowledgement that it adopted a parameters hash,
/// signed by its identity key.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignedParametersAck {
    /// The acknowledged parameters hash.
    pub hash: SecureHash,
    /// The acknowledging identity key.
    pub public_key: PublicKey,
    /// Signature over the hash bytes.
    pub signature: Signature,
}

impl SignedParametersAck {
    /// Checks the signature against the embedded key.
    ///
    /// # Errors
    ///
    /// Returns an error when the signature does not verify.
    pub fn verify(&self) -> IdentityResult<()> {
        self.public_key.verify(self.hash.as_bytes(), &self.signature)
    }
}

/// Summary of a stored node descriptor for the admin listing.
#[derive(Debug, Serialize)]
pub struct NodeView {
    /// Content address of the descriptor.
    pub hash: String,
    /// Legal names hosted by the node.
    pub names: Vec<String>,
    /// Advertised addresses.
    pub addresses: Vec<String>,
    /// Platform version the node runs.
    pub platform_version: u32,
}

impl NodeView {
    /// Builds the view from a stored descriptor.
    #[must_use]
    pub fn new(hash: String, info: &NodeInfo) -> Self {
        Self {
            hash,
            names: info
                .legal_identities
                .iter()
                .map(|id| id.name.as_str().to_string())
                .collect(),
            addresses: info.addresses.clone(),
            platform_version: info.platform_version,
        }
    }
}
