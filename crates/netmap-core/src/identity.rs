//! Legal identities of network participants.

use crate::SecureHash;
use netmap_identity::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An X.500-style distinguished name, e.g. `O=Notary A, L=London, C=GB`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LegalName(String);

impl LegalName {
    /// Wraps a distinguished name string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA-256 over the UTF-8 name bytes; used to address notaries in
    /// removal requests.
    #[must_use]
    pub fn hash(&self) -> SecureHash {
        SecureHash::compute(self.0.as_bytes())
    }
}

impl fmt::Debug for LegalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegalName({})", self.0)
    }
}

impl fmt::Display for LegalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LegalName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A participant identity: a legal name bound to its owning key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalIdentity {
    /// The distinguished name.
    pub name: LegalName,
    /// The key that owns the name.
    pub owning_key: PublicKey,
}

impl LegalIdentity {
    /// Creates an identity from a name and owning key.
    #[must_use]
    pub fn new(name: impl Into<LegalName>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }
}

impl From<String> for LegalName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn name_hash_is_stable() {
        let a = LegalName::new("O=Notary A, L=London, C=GB");
        let b = LegalName::new("O=Notary A, L=London, C=GB");
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn distinct_names_hash_differently() {
        assert_ne!(
            LegalName::new("O=A, C=GB").hash(),
            LegalName::new("O=B, C=GB").hash()
        );
    }
}
