//! # Netmap Storage
//!
//! Storage layer for the network map service: a [`BlobStore`] contract for
//! signed artifacts keyed by hash or symbolic name, a [`TextStore`] for
//! named pointers, and three interchangeable backends (in-memory,
//! filesystem, embedded RocksDB).
//!
//! Keys are opaque strings; every backend implements the same contract, so
//! the filesystem layout of older deployments can be migrated into the
//! database at boot ([`migration`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod db;
mod error;
mod fs;
mod memory;
pub mod migration;

pub use db::{Database, DbBlobStore};
pub use error::{Result, StorageError};
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Collection of signed network parameters, id = parameters hash hex.
pub const SIGNED_NETWORK_PARAMETERS: &str = "signed-network-parameters";
/// Collection holding the signed network map under [`LATEST_NETWORK_MAP`].
pub const SIGNED_NETWORK_MAP: &str = "signed-network-map";
/// Collection of signed node descriptors, id = descriptor SHA-256 hex.
pub const SIGNED_NODE_INFO: &str = "signed-node-info";
/// Collection holding the pending update under [`NEXT_PARAMS_UPDATE`].
pub const PARAMETERS_UPDATE: &str = "parameters-update";
/// The key-value text collection.
pub const ETC: &str = "etc";

/// Text-store key resolving to the hash of the active parameters.
pub const CURRENT_PARAMETERS: &str = "current-parameters";
/// Fixed id of the pending parameters update.
pub const NEXT_PARAMS_UPDATE: &str = "next-params-update";
/// Fixed id of the signed network map.
pub const LATEST_NETWORK_MAP: &str = "latest-network-map";

/// Store of signed artifacts keyed by secure hash or symbolic name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `data` under `key`, replacing any previous value.
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Reads the value under `key`.
    ///
    /// Fails with [`StorageError::NotFound`] when absent.
    async fn get(&self, key: &str) -> Result<Bytes> {
        self.get_or_null(key)
            .await?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    /// Reads the value under `key`, or `None` when absent.
    async fn get_or_null(&self, key: &str) -> Result<Option<Bytes>>;

    /// Deletes the value under `key`; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns every entry in the store.
    async fn get_all(&self) -> Result<BTreeMap<String, Bytes>>;

    /// Returns every key in the store.
    async fn keys(&self) -> Result<BTreeSet<String>> {
        Ok(self.get_all().await?.into_keys().collect())
    }

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

/// Named string pointers with upsert semantics, layered over a blob store.
#[derive(Clone)]
pub struct TextStore {
    inner: Arc<dyn BlobStore>,
}

impl TextStore {
    /// Wraps a blob store.
    #[must_use]
    pub fn new(inner: Arc<dyn BlobStore>) -> Self {
        Self { inner }
    }

    /// Upserts `value` under `key`.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .put(key, Bytes::copy_from_slice(value.as_bytes()))
            .await
    }

    /// Reads the value under `key`; [`StorageError::NotFound`] when absent.
    ///
    /// # Errors
    ///
    /// Fails on backend errors or a non-UTF-8 value.
    pub async fn get(&self, key: &str) -> Result<String> {
        let bytes = self.inner.get(key).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads the value under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Fails on backend errors or a non-UTF-8 value.
    pub async fn get_or_null(&self, key: &str) -> Result<Option<String>> {
        match self.get(key).await {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reads the value under `key`, or `default` when absent.
    ///
    /// # Errors
    ///
    /// Fails on backend errors or a non-UTF-8 value.
    pub async fn get_or_default(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get_or_null(key).await?.unwrap_or_else(|| default.to_string()))
    }

    /// Deletes the value under `key`; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    pub async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    /// The underlying blob store; used by migration.
    #[must_use]
    pub fn blob_store(&self) -> &Arc<dyn BlobStore> {
        &self.inner
    }
}

/// The five collections the service persists.
#[derive(Clone)]
pub struct ServiceStores {
    /// Signed parameters by hash.
    pub network_parameters: Arc<dyn BlobStore>,
    /// The signed map under its fixed id.
    pub network_map: Arc<dyn BlobStore>,
    /// Signed node descriptors by hash.
    pub node_info: Arc<dyn BlobStore>,
    /// The pending update under its fixed id.
    pub parameters_update: Arc<dyn BlobStore>,
    /// Named pointers.
    pub etc: TextStore,
}

impl ServiceStores {
    /// All five collections in memory; the test double.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            network_parameters: Arc::new(MemoryBlobStore::new()),
            network_map: Arc::new(MemoryBlobStore::new()),
            node_info: Arc::new(MemoryBlobStore::new()),
            parameters_update: Arc::new(MemoryBlobStore::new()),
            etc: TextStore::new(Arc::new(MemoryBlobStore::new())),
        }
    }

    /// All five collections as subdirectories of `root` (the legacy
    /// filesystem layout).
    ///
    /// # Errors
    ///
    /// Fails if a collection directory cannot be created.
    pub fn filesystem(root: &Path) -> Result<Self> {
        Ok(Self {
            network_parameters: Arc::new(FsBlobStore::open(root.join(SIGNED_NETWORK_PARAMETERS))?),
            network_map: Arc::new(FsBlobStore::open(root.join(SIGNED_NETWORK_MAP))?),
            node_info: Arc::new(FsBlobStore::open(root.join(SIGNED_NODE_INFO))?),
            parameters_update: Arc::new(FsBlobStore::open(root.join(PARAMETERS_UPDATE))?),
            etc: TextStore::new(Arc::new(FsBlobStore::open(root.join(ETC))?)),
        })
    }

    /// All five collections as column families of one embedded database.
    ///
    /// # Errors
    ///
    /// Fails if the database cannot be opened.
    pub fn database(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self {
            network_parameters: Arc::new(db.collection(SIGNED_NETWORK_PARAMETERS)),
            network_map: Arc::new(db.collection(SIGNED_NETWORK_MAP)),
            node_info: Arc::new(db.collection(SIGNED_NODE_INFO)),
            parameters_update: Arc::new(db.collection(PARAMETERS_UPDATE)),
            etc: TextStore::new(Arc::new(db.collection(ETC))),
        })
    }
}
