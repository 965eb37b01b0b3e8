//! Key material persistence.
//!
//! The root CA and network map signing keys live as hex-encoded secrets
//! under the state directory, so served artifacts stay verifiable against
//! a stable root across restarts. Production deployments provision these
//! files out of band.

use anyhow::{Context, Result};
use netmap_identity::Keypair;
use std::path::Path;
use zeroize::Zeroizing;

/// Loads a keypair from `path`, generating and persisting one if absent.
pub fn load_or_generate_keypair(path: &Path) -> Result<Keypair> {
    if path.exists() {
        let encoded = Zeroizing::new(std::fs::read_to_string(path)?);
        let secret = Zeroizing::new(
            hex::decode(encoded.trim())
                .with_context(|| format!("malformed key file {}", path.display()))?,
        );
        let keypair = Keypair::from_secret_bytes(&secret)
            .with_context(|| format!("invalid key file {}", path.display()))?;
        return Ok(keypair);
    }

    let keypair = Keypair::generate();
    std::fs::write(path, hex::encode(&*keypair.secret_bytes()))
        .with_context(|| format!("cannot write key file {}", path.display()))?;
    tracing::info!(path = %path.display(), key = %keypair.public_key(), "Generated new keypair");
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn generates_then_reloads_same_key() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("root-ca.key");

        let first = load_or_generate_keypair(&path).unwrap();
        let second = load_or_generate_keypair(&path).unwrap();
        assert_eq!(first.public_key(), second.public_key());
    }

    #[test]
    fn rejects_garbage_key_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("root-ca.key");
        std::fs::write(&path, "not hex at all").unwrap();
        assert!(load_or_generate_keypair(&path).is_err());
    }
}
