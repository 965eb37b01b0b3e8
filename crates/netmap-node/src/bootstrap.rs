//! Service assembly: key material, stores, migration, processor, router.

use crate::config::NodeConfig;
use crate::keys::load_or_generate_keypair;
use anyhow::{Context, Result};
use axum::Router;
use netmap_api::{create_router, AdminCredentials, AppState};
use netmap_identity::CertificateAuthority;
use netmap_processor::{
    DirectoryDigestWatcher, NetworkMapProcessor, NotaryWatchConfig, ProcessorConfig,
    ProcessorHandle,
};
use netmap_storage::{migration, ServiceStores};
use std::sync::Arc;
use std::time::Duration;

/// A fully wired service, ready to serve.
pub struct Service {
    /// The HTTP router.
    pub router: Router,
    /// Handle onto the processor, for programmatic use.
    pub processor: ProcessorHandle,
    // Keeps the notary directory watcher polling for the service lifetime.
    _watcher: Option<DirectoryDigestWatcher>,
}

/// Builds the service from configuration.
///
/// Startup is fatal on key material, storage, migration, or initial
/// parameters failures.
pub async fn build(config: &NodeConfig) -> Result<Service> {
    std::fs::create_dir_all(&config.storage.db_dir)
        .with_context(|| format!("cannot create {}", config.storage.db_dir.display()))?;
    let keys_dir = config.storage.db_dir.join("keys");
    std::fs::create_dir_all(&keys_dir)?;

    let root = load_or_generate_keypair(&keys_dir.join("root-ca.key"))?;
    let map_key = load_or_generate_keypair(&keys_dir.join("network-map.key"))?;
    let ca = CertificateAuthority::from_keypair("Netmap Root CA", root);
    let signer = Arc::new(ca.network_map_signer_for(map_key));

    let stores = match config.storage.backend.as_str() {
        "memory" => ServiceStores::in_memory(),
        _ => {
            let stores = ServiceStores::database(&config.storage.db_dir.join("db"))
                .context("cannot open embedded database")?;
            let legacy = ServiceStores::filesystem(&config.storage.db_dir)
                .context("cannot open legacy store layout")?;
            migration::migrate_to_database(&legacy, &stores)
                .await
                .context("legacy store migration failed")?;
            stores
        }
    };

    let (processor, watcher) = NetworkMapProcessor::start(
        stores.clone(),
        signer.clone(),
        ProcessorConfig {
            rebuild_delay: Duration::from_millis(config.map.rebuild_delay_ms),
            param_update_delay: Duration::from_secs(config.map.param_update_delay_secs),
            notary_watch: Some(NotaryWatchConfig {
                dir: config.notary.watch_dir.clone(),
                extension: "json".to_string(),
                poll_interval: Duration::from_millis(config.notary.poll_interval_ms),
            }),
        },
    )
    .await
    .context("processor start failed")?;

    let credentials = match (&config.admin.username, &config.admin.password) {
        (Some(username), Some(password)) => Some(AdminCredentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    let state = AppState {
        processor: processor.clone(),
        stores,
        root: signer.root(),
        cache_timeout: Duration::from_secs(config.map.cache_timeout_secs),
    };

    Ok(Service {
        router: create_router(state, credentials),
        processor,
        _watcher: watcher,
    })
}
