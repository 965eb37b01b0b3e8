//! Certificates rooted in the network root CA.
//!
//! The service does not need full X.509: a certificate here is a subject
//! name plus a subject key, signed by the root. Participants verify served
//! artifacts against the well-known root key.

use crate::{IdentityError, Keypair, NetworkMapSigner, PublicKey, Result, Signature};
use serde::{Deserialize, Serialize};

/// The subject name used for the network map signing certificate.
pub const NETWORK_MAP_SUBJECT: &str = "Network Map";

/// A subject key endorsed by the root CA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Human-readable subject name.
    pub subject: String,
    /// The endorsed key.
    pub subject_key: PublicKey,
    /// Root signature over the to-be-signed bytes.
    pub signature: Signature,
}

impl Certificate {
    /// Verifies that this certificate was issued by `root`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UntrustedCertificate`] if the root
    /// signature does not check out.
    pub fn verify(&self, root: &PublicKey) -> Result<()> {
        root.verify(&tbs_bytes(&self.subject, &self.subject_key), &self.signature)
            .map_err(|_| IdentityError::UntrustedCertificate {
                subject: self.subject.clone(),
            })
    }
}

/// Deterministic to-be-signed encoding: subject length, subject bytes, key bytes.
fn tbs_bytes(subject: &str, key: &PublicKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + subject.len() + PublicKey::LEN);
    out.extend_from_slice(&(subject.len() as u64).to_be_bytes());
    out.extend_from_slice(subject.as_bytes());
    out.extend_from_slice(key.as_bytes());
    out
}

/// The root certificate authority.
///
/// Holds the root keypair and issues leaf certificates. In development the
/// root is generated at first boot and persisted next to the service state;
/// in production the keypair is provisioned out of band.
pub struct CertificateAuthority {
    name: String,
    root: Keypair,
}

impl CertificateAuthority {
    /// Generates a fresh root CA.
    #[must_use]
    pub fn generate(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: Keypair::generate(),
        }
    }

    /// Restores a root CA from an existing keypair.
    #[must_use]
    pub fn from_keypair(name: impl Into<String>, root: Keypair) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Returns the CA name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the well-known root public key.
    #[must_use]
    pub fn root_key(&self) -> PublicKey {
        self.root.public_key()
    }

    /// Returns the root keypair, for persistence at first boot.
    #[must_use]
    pub fn root_keypair(&self) -> &Keypair {
        &self.root
    }

    /// Issues a certificate endorsing `subject_key` under `subject`.
    #[must_use]
    pub fn issue(&self, subject: impl Into<String>, subject_key: &PublicKey) -> Certificate {
        let subject = subject.into();
        let signature = self.root.sign(&tbs_bytes(&subject, subject_key));
        Certificate {
            subject,
            subject_key: *subject_key,
            signature,
        }
    }

    /// Generates a network map signing key and wraps it in a signer.
    #[must_use]
    pub fn network_map_signer(&self) -> NetworkMapSigner {
        self.network_map_signer_for(Keypair::generate())
    }

    /// Wraps an existing network map keypair in a signer.
    #[must_use]
    pub fn network_map_signer_for(&self, keypair: Keypair) -> NetworkMapSigner {
        let certificate = self.issue(NETWORK_MAP_SUBJECT, &keypair.public_key());
        NetworkMapSigner::new(keypair, certificate, self.root_key())
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("name", &self.name)
            .field("root_key", &self.root_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_certificate_verifies() {
        let ca = CertificateAuthority::generate("Dev Root");
        let leaf = Keypair::generate();
        let cert = ca.issue("Network Map", &leaf.public_key());
        assert!(cert.verify(&ca.root_key()).is_ok());
    }

    #[test]
    fn certificate_rejects_wrong_root() {
        let ca = CertificateAuthority::generate("Dev Root");
        let other = CertificateAuthority::generate("Other Root");
        let cert = ca.issue("Network Map", &Keypair::generate().public_key());
        assert!(cert.verify(&other.root_key()).is_err());
    }

    #[test]
    fn tampered_subject_fails() {
        let ca = CertificateAuthority::generate("Dev Root");
        let mut cert = ca.issue("Network Map", &Keypair::generate().public_key());
        cert.subject = "Impostor".to_string();
        assert!(cert.verify(&ca.root_key()).is_err());
    }
}
