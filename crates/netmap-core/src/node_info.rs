//! Participant node descriptors.

use crate::{CoreError, LegalIdentity, Result, SecureHash};
use netmap_identity::{Keypair, Signature};
use serde::{Deserialize, Serialize};

/// A participant's self-description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Legal identities hosted by the node, in signing order.
    pub legal_identities: Vec<LegalIdentity>,
    /// Network addresses, `host:port`.
    pub addresses: Vec<String>,
    /// Platform version the node runs.
    pub platform_version: u32,
}

impl NodeInfo {
    /// Canonical serialized form; the bytes the node signs.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A node descriptor with one signature per hosted identity.
///
/// Content-addressed by the SHA-256 of its serialized bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedNodeInfo {
    /// Canonical [`NodeInfo`] bytes.
    #[serde(with = "hex::serde")]
    pub raw: Vec<u8>,
    /// Signatures over `raw`, one per identity, in identity order.
    pub signatures: Vec<Signature>,
}

impl SignedNodeInfo {
    /// Signs `info` with the owning keys of its identities, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn sign(info: &NodeInfo, keys: &[&Keypair]) -> Result<Self> {
        let raw = info.to_canonical_bytes()?;
        let signatures = keys.iter().map(|k| k.sign(&raw)).collect();
        Ok(Self { raw, signatures })
    }

    /// Decodes the inner descriptor without checking signatures.
    ///
    /// For descriptors already admitted to storage; inbound descriptors go
    /// through [`SignedNodeInfo::verified`].
    ///
    /// # Errors
    ///
    /// Returns an error on malformed bytes.
    pub fn decode(&self) -> Result<NodeInfo> {
        Ok(serde_json::from_slice(&self.raw)?)
    }

    /// Decodes the inner descriptor and checks every identity signature.
    ///
    /// # Errors
    ///
    /// Fails on malformed bytes, a signature-count mismatch, or any
    /// signature that does not verify against the identity key at the
    /// same position.
    pub fn verified(&self) -> Result<NodeInfo> {
        let info: NodeInfo = serde_json::from_slice(&self.raw)?;
        if info.legal_identities.len() != self.signatures.len() {
            return Err(CoreError::SignatureCount {
                expected: info.legal_identities.len(),
                actual: self.signatures.len(),
            });
        }
        for (identity, signature) in info.legal_identities.iter().zip(&self.signatures) {
            identity
                .owning_key
                .verify(&self.raw, signature)
                .map_err(|_| CoreError::InvalidIdentitySignature {
                    name: identity.name.as_str().to_string(),
                })?;
        }
        Ok(info)
    }

    /// Serialized wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes the wire form.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The content address: SHA-256 of the wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn hash(&self) -> Result<SecureHash> {
        Ok(SecureHash::compute(&self.to_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(keys: &[&Keypair]) -> NodeInfo {
        NodeInfo {
            legal_identities: keys
                .iter()
                .enumerate()
                .map(|(i, k)| LegalIdentity::new(format!("O=Party {i}, C=GB"), k.public_key()))
                .collect(),
            addresses: vec!["node.example.com:10000".to_string()],
            platform_version: 4,
        }
    }

    #[test]
    fn verified_accepts_valid_descriptor() {
        let key = Keypair::generate();
        let info = sample(&[&key]);
        let signed = SignedNodeInfo::sign(&info, &[&key]).unwrap();
        assert_eq!(signed.verified().unwrap(), info);
    }

    #[test]
    fn verified_rejects_wrong_signer() {
        let key = Keypair::generate();
        let impostor = Keypair::generate();
        let info = sample(&[&key]);
        let signed = SignedNodeInfo::sign(&info, &[&impostor]).unwrap();
        assert!(matches!(
            signed.verified(),
            Err(CoreError::InvalidIdentitySignature { .. })
        ));
    }

    #[test]
    fn verified_rejects_missing_signature() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let info = sample(&[&a, &b]);
        let mut signed = SignedNodeInfo::sign(&info, &[&a, &b]).unwrap();
        signed.signatures.pop();
        assert!(matches!(
            signed.verified(),
            Err(CoreError::SignatureCount { .. })
        ));
    }

    #[test]
    fn hash_is_stable_across_decode() {
        let key = Keypair::generate();
        let signed = SignedNodeInfo::sign(&sample(&[&key]), &[&key]).unwrap();
        let bytes = signed.to_bytes().unwrap();
        let decoded = SignedNodeInfo::from_bytes(&bytes).unwrap();
        assert_eq!(signed.hash().unwrap(), decoded.hash().unwrap());
    }
}
