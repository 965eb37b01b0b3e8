//! Embedded RocksDB backend: one database, one column family per
//! collection.

use crate::{
    BlobStore, Result, StorageError, ETC, PARAMETERS_UPDATE, SIGNED_NETWORK_MAP,
    SIGNED_NETWORK_PARAMETERS, SIGNED_NODE_INFO,
};
use async_trait::async_trait;
use bytes::Bytes;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const COLLECTIONS: [&str; 5] = [
    SIGNED_NETWORK_PARAMETERS,
    SIGNED_NETWORK_MAP,
    SIGNED_NODE_INFO,
    PARAMETERS_UPDATE,
    ETC,
];

/// The embedded database; hands out per-collection stores sharing one
/// RocksDB instance.
#[derive(Clone)]
pub struct Database {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl Database {
    /// Opens or creates the database with all service column families.
    ///
    /// # Errors
    ///
    /// Fails if the database directory cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = COLLECTIONS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Returns the store for one collection.
    #[must_use]
    pub fn collection(&self, name: &'static str) -> DbBlobStore {
        DbBlobStore {
            db: self.db.clone(),
            collection: name,
        }
    }
}

/// A blob store over one column family.
pub struct DbBlobStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    collection: &'static str,
}

impl DbBlobStore {
    fn cf(&self) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(self.collection)
            .ok_or_else(|| StorageError::Backend(format!("missing column family {}", self.collection)))
    }
}

#[async_trait]
impl BlobStore for DbBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.db.put_cf(&self.cf()?, key.as_bytes(), &data)?;
        Ok(())
    }

    async fn get_or_null(&self, key: &str) -> Result<Option<Bytes>> {
        let value = self.db.get_cf(&self.cf()?, key.as_bytes())?;
        Ok(value.map(Bytes::from))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let cf = self.cf()?;
        let existed = self.db.get_pinned_cf(&cf, key.as_bytes())?.is_some();
        if existed {
            self.db.delete_cf(&cf, key.as_bytes())?;
        }
        Ok(existed)
    }

    async fn get_all(&self) -> Result<BTreeMap<String, Bytes>> {
        let cf = self.cf()?;
        let mut entries = BTreeMap::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item?;
            let key = String::from_utf8(key.to_vec()).map_err(|e| StorageError::Corrupt {
                key: String::from_utf8_lossy(&key).to_string(),
                reason: e.to_string(),
            })?;
            entries.insert(key, Bytes::from(value.to_vec()));
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
    async fn collections_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        let params = db.collection(SIGNED_NETWORK_PARAMETERS);
        let nodes = db.collection(SIGNED_NODE_INFO);

        params.put("shared-key", Bytes::from("params")).await.unwrap();
        nodes.put("shared-key", Bytes::from("node")).await.unwrap();

        assert_eq!(params.get("shared-key").await.unwrap(), Bytes::from("params"));
        assert_eq!(nodes.get("shared-key").await.unwrap(), Bytes::from("node"));
    }

    #[tokio::test]
    async fn roundtrip_and_enumeration() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        let store = db.collection(ETC);

        store.put("a", Bytes::from("1")).await.unwrap();
        store.put("b", Bytes::from("2")).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"], Bytes::from("1"));

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let db = Database::open(tmp.path()).unwrap();
            db.collection(ETC).put("k", Bytes::from("v")).await.unwrap();
        }
        let db = Database::open(tmp.path()).unwrap();
        assert_eq!(db.collection(ETC).get("k").await.unwrap(), Bytes::from("v"));
    }
}
