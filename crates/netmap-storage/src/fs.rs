//! Filesystem backend: one directory per collection, one file per key.
//!
//! This is the legacy layout; at boot its contents are migrated into the
//! embedded database and the directories are emptied.

use crate::{BlobStore, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

const TMP_SUFFIX: &str = ".tmp";

/// A blob store backed by a flat directory.
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Keys double as file names; anything that could escape the
    /// collection directory is rejected.
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let safe = !key.is_empty()
            && !key.starts_with('.')
            && !key.ends_with(TMP_SUFFIX)
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !safe {
            return Err(StorageError::Corrupt {
                key: key.to_string(),
                reason: "key is not a valid entry name".to_string(),
            });
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.entry_path(key)?;
        let tmp = path.with_file_name(format!("{key}{TMP_SUFFIX}"));
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get_or_null(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.entry_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_all(&self) -> Result<BTreeMap<String, Bytes>> {
        let mut entries = BTreeMap::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.ends_with(TMP_SUFFIX) {
                continue;
            }
            let data = tokio::fs::read(entry.path()).await?;
            entries.insert(name, Bytes::from(data));
        }
        Ok(entries)
    }

    async fn clear(&self) -> Result<()> {
        for key in self.keys().await? {
            self.delete(&key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn roundtrip_on_disk() {
        let tmp = TempDir::new().unwrap();
        let store = FsBlobStore::open(tmp.path().join("node-info")).unwrap();

        store.put("abc123", Bytes::from("payload")).await.unwrap();
        assert_eq!(store.get("abc123").await.unwrap(), Bytes::from("payload"));

        // Overwrite is an upsert.
        store.put("abc123", Bytes::from("payload2")).await.unwrap();
        assert_eq!(store.get("abc123").await.unwrap(), Bytes::from("payload2"));
    }

    #[tokio::test]
    async fn get_all_skips_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = FsBlobStore::open(tmp.path()).unwrap();
        store.put("kept", Bytes::from("x")).await.unwrap();
        std::fs::write(tmp.path().join("stray.tmp"), b"partial").unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("kept"));
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FsBlobStore::open(tmp.path()).unwrap();
        assert!(store.put("../escape", Bytes::from("x")).await.is_err());
        assert!(store.get_or_null(".hidden").await.is_err());
    }

    #[tokio::test]
    async fn clear_empties_directory() {
        let tmp = TempDir::new().unwrap();
        let store = FsBlobStore::open(tmp.path()).unwrap();
        store.put("a", Bytes::from("1")).await.unwrap();
        store.put("b", Bytes::from("2")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }
}
