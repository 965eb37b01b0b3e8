//! In-memory backend for tests.

use crate::{BlobStore, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// A blob store held entirely in memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.entries.write().insert(key.to_string(), data);
        Ok(())
    }

    async fn get_or_null(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn get_all(&self) -> Result<BTreeMap<String, Bytes>> {
        Ok(self.entries.read().clone())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryBlobStore::new();
        store.put("k", Bytes::from("v")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Bytes::from("v"));
        assert!(store.delete("k").await.unwrap());
        assert!(matches!(
            store.get("k").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn keys_and_clear() {
        let store = MemoryBlobStore::new();
        store.put("a", Bytes::from("1")).await.unwrap();
        store.put("b", Bytes::from("2")).await.unwrap();
        assert_eq!(store.keys().await.unwrap().len(), 2);
        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
