//! One-shot migration of the legacy filesystem layout into the database.
//!
//! Runs at boot, before the processor starts. Each collection is copied
//! entry by entry and the source is cleared on success, so a second run
//! against the emptied layout is a no-op. The five copies run
//! concurrently; any failure aborts startup.

use crate::{BlobStore, Result, ServiceStores, ETC, PARAMETERS_UPDATE, SIGNED_NETWORK_MAP,
    SIGNED_NETWORK_PARAMETERS, SIGNED_NODE_INFO};
use std::sync::Arc;

/// Copies every legacy collection into the database stores and clears the
/// sources.
///
/// # Errors
///
/// Fails if any read, write, or clear fails; the database may then hold a
/// partial copy, but the sources are only cleared per-collection after
/// that collection copied completely.
pub async fn migrate_to_database(legacy: &ServiceStores, target: &ServiceStores) -> Result<()> {
    tokio::try_join!(
        copy_collection(
            SIGNED_NETWORK_PARAMETERS,
            &legacy.network_parameters,
            &target.network_parameters,
        ),
        copy_collection(SIGNED_NETWORK_MAP, &legacy.network_map, &target.network_map),
        copy_collection(SIGNED_NODE_INFO, &legacy.node_info, &target.node_info),
        copy_collection(
            PARAMETERS_UPDATE,
            &legacy.parameters_update,
            &target.parameters_update,
        ),
        copy_collection(ETC, legacy.etc.blob_store(), target.etc.blob_store()),
    )?;
    Ok(())
}

async fn copy_collection(
    name: &str,
    source: &Arc<dyn BlobStore>,
    target: &Arc<dyn BlobStore>,
) -> Result<()> {
    let entries = source.get_all().await?;
    if entries.is_empty() {
        return Ok(());
    }
    let count = entries.len();
    for (key, value) in entries {
        target.put(&key, value).await?;
    }
    source.clear().await?;
    tracing::info!(collection = name, entries = count, "Migrated legacy collection");
    Ok(())
}
