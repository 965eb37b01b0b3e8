//! The aggregate network map and scheduled parameter updates.

use crate::{Result, SecureHash, Timestamp};
use serde::{Deserialize, Serialize};

/// A scheduled activation of new parameters.
///
/// At most one is pending at any time; it is deleted when the deadline
/// passes and the new parameters become current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametersUpdate {
    /// Hash of the parameters that will become current.
    pub new_parameters_hash: SecureHash,
    /// Operator-facing description of the change.
    pub description: String,
    /// Instant at which the new parameters activate.
    pub update_deadline: Timestamp,
}

impl ParametersUpdate {
    /// Serialized form stored under the pending-update pointer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a stored pending update.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Aggregate snapshot served to all participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMap {
    /// Hashes of all published node descriptors.
    pub node_info_hashes: Vec<SecureHash>,
    /// Hash of the currently active parameters.
    pub network_parameter_hash: SecureHash,
    /// The scheduled parameter change, if one is pending.
    pub parameters_update: Option<ParametersUpdate>,
}

impl NetworkMap {
    /// Canonical serialized form; input to signing.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a map from its canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn map_roundtrip() {
        let map = NetworkMap {
            node_info_hashes: vec![SecureHash::compute(b"a"), SecureHash::compute(b"b")],
            network_parameter_hash: SecureHash::compute(b"params"),
            parameters_update: Some(ParametersUpdate {
                new_parameters_hash: SecureHash::compute(b"next"),
                description: "notaries changed".to_string(),
                update_deadline: Timestamp::from_millis(1_700_000_010_000),
            }),
        };
        let bytes = map.to_canonical_bytes().unwrap();
        assert_eq!(NetworkMap::from_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn pending_update_roundtrip() {
        let update = ParametersUpdate {
            new_parameters_hash: SecureHash::compute(b"next"),
            description: "raise platform version".to_string(),
            update_deadline: Timestamp::from_millis(42),
        };
        let bytes = update.to_bytes().unwrap();
        assert_eq!(ParametersUpdate::from_bytes(&bytes).unwrap(), update);
    }
}
