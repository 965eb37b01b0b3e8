//! Signing of served artifacts.

use crate::{Certificate, IdentityError, Keypair, PublicKey, Result, Signature};
use serde::{Deserialize, Serialize};

/// A payload signed by the network map key, carrying the leaf certificate
/// so clients can verify against the well-known root alone.
///
/// This is the wire format of every artifact the service serves; the
/// payload bytes are opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlob {
    /// Raw payload bytes.
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    /// Signature over the payload by the certificate's subject key.
    pub signature: Signature,
    /// Leaf certificate chaining to the root CA.
    pub certificate: Certificate,
}

impl SignedBlob {
    /// Serializes the blob for storage or transport.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a blob previously produced by [`SignedBlob::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid blob encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Verifies the certificate chain and the payload signature, returning
    /// the payload on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate is not rooted in `root` or the
    /// payload signature is invalid.
    pub fn verify(&self, root: &PublicKey) -> Result<&[u8]> {
        self.certificate.verify(root)?;
        self.certificate
            .subject_key
            .verify(&self.payload, &self.signature)?;
        Ok(&self.payload)
    }
}

/// Holds the network map signing key and its certificate.
///
/// The processor captures one of these at start and never re-reads key
/// material afterwards.
pub struct NetworkMapSigner {
    keypair: Keypair,
    certificate: Certificate,
    root: PublicKey,
}

impl NetworkMapSigner {
    /// Creates a signer from a keypair, its certificate, and the root key.
    #[must_use]
    pub fn new(keypair: Keypair, certificate: Certificate, root: PublicKey) -> Self {
        Self {
            keypair,
            certificate,
            root,
        }
    }

    /// Signs a payload, producing a servable blob.
    #[must_use]
    pub fn sign(&self, payload: Vec<u8>) -> SignedBlob {
        let signature = self.keypair.sign(&payload);
        SignedBlob {
            payload,
            signature,
            certificate: self.certificate.clone(),
        }
    }

    /// Verifies a blob against this signer's root, returning the payload.
    ///
    /// # Errors
    ///
    /// Returns an error on an untrusted certificate or bad signature.
    pub fn verify<'a>(&self, blob: &'a SignedBlob) -> Result<&'a [u8]> {
        blob.verify(&self.root)
    }

    /// Returns the leaf certificate.
    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Returns the well-known root key.
    #[must_use]
    pub fn root(&self) -> PublicKey {
        self.root
    }

    /// Returns the signing keypair, for persistence at first boot.
    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for NetworkMapSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkMapSigner")
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CertificateAuthority;
    use pretty_assertions::assert_eq;

    #[test]
    fn signed_blob_roundtrip() {
        let signer = CertificateAuthority::generate("Dev Root").network_map_signer();
        let blob = signer.sign(b"parameters".to_vec());

        let bytes = blob.to_bytes().unwrap();
        let decoded = SignedBlob::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.verify(&signer.root()).unwrap(), b"parameters");
    }

    #[test]
    fn tampered_payload_rejected() {
        let signer = CertificateAuthority::generate("Dev Root").network_map_signer();
        let mut blob = signer.sign(b"parameters".to_vec());
        blob.payload[0] ^= 0xff;
        assert!(blob.verify(&signer.root()).is_err());
    }

    #[test]
    fn foreign_root_rejected() {
        let signer = CertificateAuthority::generate("Dev Root").network_map_signer();
        let other = CertificateAuthority::generate("Other Root");
        let blob = signer.sign(b"parameters".to_vec());
        assert!(blob.verify(&other.root_key()).is_err());
    }
}
