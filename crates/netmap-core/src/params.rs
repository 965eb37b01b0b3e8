//! The network parameters document.

use crate::{LegalIdentity, Result, SecureHash, Timestamp, Whitelist};
use serde::{Deserialize, Serialize};

/// Largest message the network will carry, in bytes.
const DEFAULT_MAX_MESSAGE_SIZE: u64 = 10_485_760;

/// A notary entry in the parameters: an identity plus its validating flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryInfo {
    /// The notary's legal identity.
    pub identity: LegalIdentity,
    /// Whether the notary validates transaction contents.
    pub validating: bool,
}

impl NotaryInfo {
    /// Creates a notary entry.
    #[must_use]
    pub fn new(identity: LegalIdentity, validating: bool) -> Self {
        Self {
            identity,
            validating,
        }
    }
}

/// The protocol constitution all participants agree on.
///
/// Mutations only happen through epoch-advancing constructors
/// ([`NetworkParameters::evolve`] and the change algebra built on it), so
/// `epoch` is strictly monotonic and `modified_time` always reflects the
/// last mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
    /// Minimum platform version nodes must run.
    pub min_platform_version: u32,
    /// Ordered notary entries.
    pub notaries: Vec<NotaryInfo>,
    /// Maximum message size in bytes.
    pub max_message_size: u64,
    /// Maximum transaction size in bytes.
    pub max_transaction_size: u64,
    /// Instant of the last mutation.
    pub modified_time: Timestamp,
    /// Monotonically increasing document version.
    pub epoch: u64,
    /// Whitelisted contract implementations.
    pub whitelist: Whitelist,
}

impl NetworkParameters {
    /// The first-boot template: epoch 1, no notaries, empty whitelist.
    #[must_use]
    pub fn template(now: Timestamp) -> Self {
        Self {
            min_platform_version: 1,
            notaries: Vec::new(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_transaction_size: i32::MAX as u64,
            modified_time: now,
            epoch: 1,
            whitelist: Whitelist::new(),
        }
    }

    /// Applies `mutate` to a copy of this document, advancing the epoch by
    /// one and stamping `modified_time`.
    ///
    /// This is the single path through which parameters change.
    #[must_use]
    pub fn evolve(&self, mutate: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        mutate(&mut next);
        next.epoch = self.epoch + 1;
        next.modified_time = Timestamp::now();
        next
    }

    /// Returns a copy with the notary list replaced wholesale.
    #[must_use]
    pub fn with_notaries(&self, notaries: Vec<NotaryInfo>) -> Self {
        self.evolve(|p| p.notaries = notaries)
    }

    /// Canonical serialized form; input to signing and content addressing.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a document from its canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Hash of the canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn hash(&self) -> Result<SecureHash> {
        Ok(SecureHash::compute(&self.to_canonical_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LegalName;
    use netmap_identity::Keypair;
    use pretty_assertions::assert_eq;

    fn notary(name: &str) -> NotaryInfo {
        NotaryInfo::new(
            LegalIdentity::new(name, Keypair::generate().public_key()),
            true,
        )
    }

    #[test]
    fn template_matches_first_boot_shape() {
        let now = Timestamp::now();
        let params = NetworkParameters::template(now);
        assert_eq!(params.epoch, 1);
        assert_eq!(params.min_platform_version, 1);
        assert_eq!(params.max_message_size, 10_485_760);
        assert_eq!(params.max_transaction_size, 2_147_483_647);
        assert!(params.notaries.is_empty());
        assert!(params.whitelist.is_empty());
        assert_eq!(params.modified_time, now);
    }

    #[test]
    fn evolve_bumps_epoch_exactly_once() {
        let params = NetworkParameters::template(Timestamp::now());
        let next = params.evolve(|p| p.min_platform_version = 4);
        assert_eq!(next.epoch, 2);
        assert_eq!(next.min_platform_version, 4);
        // Untouched fields carry over.
        assert_eq!(next.max_message_size, params.max_message_size);
    }

    #[test]
    fn evolve_cannot_smuggle_an_epoch() {
        let params = NetworkParameters::template(Timestamp::now());
        let next = params.evolve(|p| p.epoch = 99);
        assert_eq!(next.epoch, 2);
    }

    #[test]
    fn with_notaries_replaces_wholesale() {
        let params = NetworkParameters::template(Timestamp::now())
            .with_notaries(vec![notary("O=A, C=GB"), notary("O=B, C=GB")]);
        let replaced = params.with_notaries(vec![notary("O=C, C=GB")]);
        assert_eq!(replaced.notaries.len(), 1);
        assert_eq!(replaced.epoch, 3);
    }

    #[test]
    fn canonical_bytes_are_stable() {
        let params = NetworkParameters::template(Timestamp::from_millis(0));
        let a = params.to_canonical_bytes().unwrap();
        let b = params.to_canonical_bytes().unwrap();
        assert_eq!(a, b);
        assert_eq!(NetworkParameters::from_bytes(&a).unwrap(), params);
    }
}
