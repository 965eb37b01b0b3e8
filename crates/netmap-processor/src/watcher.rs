//! Directory digest watching.
//!
//! Polls a directory and fires a callback when the aggregate digest of the
//! matching files changes. The digest is order-independent: each file's
//! contents are hashed, the per-file digests are sorted, and the sorted
//! list is hashed again. The initial digest is the empty string, so the
//! first scan always fires.

use netmap_core::NotaryInfo;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A running watcher; the poll task is aborted on drop.
pub struct DirectoryDigestWatcher {
    task: JoinHandle<()>,
}

impl DirectoryDigestWatcher {
    /// Watches `dir` for changes to files with `extension`, invoking
    /// `on_change` whenever the aggregate digest moves.
    ///
    /// Callbacks are awaited inside the poll loop, so they never overlap
    /// with themselves and the next scan starts only after the previous
    /// change has been handled.
    pub fn spawn<F, Fut>(dir: PathBuf, extension: &str, poll_interval: Duration, mut on_change: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let extension = extension.to_string();
        let task = tokio::spawn(async move {
            let mut previous = String::new();
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let digest = match directory_digest(&dir, &extension).await {
                    Ok(digest) => digest,
                    Err(e) => {
                        tracing::warn!(dir = %dir.display(), error = %e, "Directory scan failed");
                        continue;
                    }
                };
                if digest != previous {
                    tracing::debug!(dir = %dir.display(), digest = %digest, "Directory digest changed");
                    previous = digest;
                    on_change().await;
                }
            }
        });
        Self { task }
    }
}

impl Drop for DirectoryDigestWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Order-independent digest over the matching files' contents.
///
/// A missing directory counts as empty rather than an error, so the
/// watcher works before the operator first populates it.
pub async fn directory_digest(dir: &Path, extension: &str) -> io::Result<String> {
    let mut file_digests: Vec<[u8; 32]> = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(hex::encode(Sha256::digest(b"")));
        }
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let contents = tokio::fs::read(&path).await?;
        file_digests.push(Sha256::digest(&contents).into());
    }
    file_digests.sort_unstable();

    let mut aggregate = Sha256::new();
    for digest in &file_digests {
        aggregate.update(digest);
    }
    Ok(hex::encode(aggregate.finalize()))
}

/// Reads every notary entry file in `dir`, sorted by legal name.
///
/// Unreadable or malformed files are logged and skipped; one bad drop must
/// not wedge the update pipeline.
pub async fn load_notary_entries(dir: &Path, extension: &str) -> io::Result<Vec<NotaryInfo>> {
    let mut notaries: Vec<NotaryInfo> = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(notaries),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let contents = tokio::fs::read(&path).await?;
        match serde_json::from_slice::<NotaryInfo>(&contents) {
            Ok(notary) => notaries.push(notary),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable notary entry");
            }
        }
    }
    notaries.sort_by(|a, b| a.identity.name.cmp(&b.identity.name));
    Ok(notaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmap_core::LegalIdentity;
    use netmap_identity::Keypair;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn digest_ignores_file_order_and_names() {
        let a = TempDir::new().unwrap();
        std::fs::write(a.path().join("x.json"), b"one").unwrap();
        std::fs::write(a.path().join("y.json"), b"two").unwrap();

        let b = TempDir::new().unwrap();
        std::fs::write(b.path().join("p.json"), b"two").unwrap();
        std::fs::write(b.path().join("q.json"), b"one").unwrap();

        assert_eq!(
            directory_digest(a.path(), "json").await.unwrap(),
            directory_digest(b.path(), "json").await.unwrap()
        );
    }

    #[tokio::test]
    async fn digest_changes_with_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("n.json"), b"one").unwrap();
        let before = directory_digest(dir.path(), "json").await.unwrap();
        std::fs::write(dir.path().join("n.json"), b"two").unwrap();
        let after = directory_digest(dir.path(), "json").await.unwrap();
        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn digest_skips_other_extensions() {
        let dir = TempDir::new().unwrap();
        let empty = directory_digest(dir.path(), "json").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"irrelevant").unwrap();
        assert_eq!(directory_digest(dir.path(), "json").await.unwrap(), empty);
    }

    #[tokio::test]
    async fn watcher_fires_once_per_change() {
        let dir = TempDir::new().unwrap();
        let fires = Arc::new(AtomicUsize::new(0));
        let counter = fires.clone();
        let _watcher = DirectoryDigestWatcher::spawn(
            dir.path().to_path_buf(),
            "json",
            Duration::from_millis(20),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            },
        );

        // First scan always fires (initial digest is the empty string).
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);

        std::fs::write(dir.path().join("n.json"), b"notary").unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 2);

        // No further change, no further fire.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_notary_entries_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        let notary = NotaryInfo::new(
            LegalIdentity::new("O=Notary A, C=GB", Keypair::generate().public_key()),
            true,
        );
        std::fs::write(
            dir.path().join("a.json"),
            serde_json::to_vec(&notary).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), b"not json").unwrap();

        let loaded = load_notary_entries(dir.path(), "json").await.unwrap();
        assert_eq!(loaded, vec![notary]);
    }
}
