//! The serialized event processor.
//!
//! One worker task owns all state: commands arrive on an `mpsc` queue and
//! are handled to completion one at a time, so every read-modify-write on
//! the parameters document, the node store, and the pending-update pointer
//! is race-free by construction. Timers never mutate state themselves;
//! they re-enqueue events onto the same queue.

use crate::watcher::{self, DirectoryDigestWatcher};
use crate::{ProcessorError, Result};
use bytes::Bytes;
use netmap_core::{
    Change, LegalName, NetworkMap, NetworkParameters, NotaryInfo, ParametersUpdate, SecureHash,
    SignedNodeInfo, Timestamp,
};
use netmap_identity::{NetworkMapSigner, PublicKey, SignedBlob};
use netmap_storage::{
    BlobStore, ServiceStores, CURRENT_PARAMETERS, LATEST_NETWORK_MAP, NEXT_PARAMS_UPDATE,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Watched notary certificate directory.
#[derive(Debug, Clone)]
pub struct NotaryWatchConfig {
    /// Directory the operator drops notary entry files into.
    pub dir: PathBuf,
    /// File extension of notary entries.
    pub extension: String,
    /// Poll cadence of the digest watcher.
    pub poll_interval: Duration,
}

impl NotaryWatchConfig {
    /// Watch `dir` for `.json` entries every two seconds.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            extension: "json".to_string(),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Processor tuning.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Debounce window for map rebuilds; zero rebuilds inline.
    pub rebuild_delay: Duration,
    /// Default activation delay for parameter updates.
    pub param_update_delay: Duration,
    /// Notary directory to watch, if any.
    pub notary_watch: Option<NotaryWatchConfig>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            rebuild_delay: Duration::from_secs(1),
            param_update_delay: Duration::from_secs(10),
            notary_watch: None,
        }
    }
}

/// A parameters mutation; built from [`Change`] by the admin surface, or
/// from the notary replacement helper by the directory watcher.
type Transform = Box<dyn FnOnce(&NetworkParameters) -> NetworkParameters + Send>;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    AddNode {
        signed: SignedNodeInfo,
        reply: Reply<SecureHash>,
    },
    DeleteNode {
        hash: SecureHash,
        reply: Reply<bool>,
    },
    UpdateParameters {
        transform: Transform,
        description: String,
        activation_delay: Option<Duration>,
        reply: Reply<()>,
    },
    NotariesChanged {
        notaries: Vec<NotaryInfo>,
        reply: Reply<()>,
    },
    RebuildMap {
        reply: Option<Reply<()>>,
    },
    ActivateUpdate,
}

/// Entry point for the processor subsystem.
pub struct NetworkMapProcessor;

impl NetworkMapProcessor {
    /// Runs the start sequence and spawns the worker.
    ///
    /// The signing key is captured here and never re-read. Establishing the
    /// initial parameters and map is fatal on failure; afterwards the
    /// worker loop survives individual task failures.
    ///
    /// # Errors
    ///
    /// Fails if the initial parameters or map cannot be established.
    pub async fn start(
        stores: ServiceStores,
        signer: Arc<NetworkMapSigner>,
        config: ProcessorConfig,
    ) -> Result<(ProcessorHandle, Option<DirectoryDigestWatcher>)> {
        let (tx, rx) = mpsc::channel(256);
        let mut worker = Worker {
            stores,
            signer,
            rebuild_delay: config.rebuild_delay,
            param_update_delay: config.param_update_delay,
            self_tx: tx.downgrade(),
            rebuild_timer: None,
            activation_timer: None,
        };

        worker.create_network_parameters().await?;
        worker.create_network_map().await?;
        tokio::spawn(worker.run(rx));

        let handle = ProcessorHandle { tx };
        let watcher = config.notary_watch.map(|watch| {
            let callback_handle = handle.clone();
            let dir = watch.dir.clone();
            let extension = watch.extension.clone();
            DirectoryDigestWatcher::spawn(
                watch.dir,
                &watch.extension,
                watch.poll_interval,
                move || {
                    let handle = callback_handle.clone();
                    let dir = dir.clone();
                    let extension = extension.clone();
                    async move {
                        match watcher::load_notary_entries(&dir, &extension).await {
                            Ok(notaries) => {
                                if let Err(e) = handle.notaries_changed(notaries).await {
                                    tracing::error!(error = %e, "Failed to apply notary directory change");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to read notary directory");
                            }
                        }
                    }
                },
            )
        });

        Ok((handle, watcher))
    }
}

/// Cloneable handle enqueueing work onto the processor.
///
/// Every method completes when the worker has finished the enqueued task,
/// so callers observe the ordering guarantees of the single queue.
#[derive(Clone)]
pub struct ProcessorHandle {
    tx: mpsc::Sender<Command>,
}

impl ProcessorHandle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ProcessorError::Stopped)?;
        reply_rx.await.map_err(|_| ProcessorError::Stopped)?
    }

    /// Verifies and stores a published node descriptor, returning its
    /// content hash.
    ///
    /// # Errors
    ///
    /// Fails on an invalid signature or an identity-name conflict.
    pub async fn add_node(&self, signed: SignedNodeInfo) -> Result<SecureHash> {
        self.request(|reply| Command::AddNode { signed, reply }).await
    }

    /// Deletes a stored node descriptor; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Fails on backend errors.
    pub async fn delete_node(&self, hash: SecureHash) -> Result<bool> {
        self.request(|reply| Command::DeleteNode { hash, reply }).await
    }

    /// Re-issues the parameters through `transform`.
    ///
    /// With no explicit delay the configured default applies; a resolved
    /// activation instant not in the future activates immediately,
    /// otherwise a pending update is scheduled.
    ///
    /// # Errors
    ///
    /// Fails on backend or signing errors.
    pub async fn update_parameters<F>(
        &self,
        transform: F,
        description: impl Into<String>,
        activation_delay: Option<Duration>,
    ) -> Result<()>
    where
        F: FnOnce(&NetworkParameters) -> NetworkParameters + Send + 'static,
    {
        let description = description.into();
        self.request(|reply| Command::UpdateParameters {
            transform: Box::new(transform),
            description,
            activation_delay,
            reply,
        })
        .await
    }

    /// Applies one change from the closed algebra.
    ///
    /// # Errors
    ///
    /// Fails on backend or signing errors.
    pub async fn apply_change(
        &self,
        change: Change,
        activation_delay: Option<Duration>,
    ) -> Result<()> {
        let description = change.describe();
        self.update_parameters(move |p| change.apply(p), description, activation_delay)
            .await
    }

    /// Replaces the notary set if it differs from the current one.
    ///
    /// # Errors
    ///
    /// Fails on backend or signing errors.
    pub async fn notaries_changed(&self, notaries: Vec<NotaryInfo>) -> Result<()> {
        self.request(|reply| Command::NotariesChanged { notaries, reply })
            .await
    }

    /// Rebuilds and re-signs the map now, bypassing the debounce.
    ///
    /// Also serves as a queue barrier: completion means every previously
    /// enqueued task has finished.
    ///
    /// # Errors
    ///
    /// Fails on backend or signing errors.
    pub async fn rebuild_map(&self) -> Result<()> {
        self.request(|reply| Command::RebuildMap { reply: Some(reply) })
            .await
    }
}

struct Worker {
    stores: ServiceStores,
    signer: Arc<NetworkMapSigner>,
    rebuild_delay: Duration,
    param_update_delay: Duration,
    self_tx: mpsc::WeakSender<Command>,
    rebuild_timer: Option<JoinHandle<()>>,
    activation_timer: Option<JoinHandle<()>>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.handle(command).await;
        }
        tracing::debug!("Processor worker stopped");
    }

    /// A failing task fails its own reply and leaves the worker healthy.
    async fn handle(&mut self, command: Command) {
        match command {
            Command::AddNode { signed, reply } => {
                let result = self.add_node(signed).await;
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Node publish rejected");
                }
                let _ = reply.send(result);
            }
            Command::DeleteNode { hash, reply } => {
                let result = self.delete_node(hash).await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Node deletion failed");
                }
                let _ = reply.send(result);
            }
            Command::UpdateParameters {
                transform,
                description,
                activation_delay,
                reply,
            } => {
                let result = self
                    .update_parameters(transform, description, activation_delay)
                    .await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Parameters update failed");
                }
                let _ = reply.send(result);
            }
            Command::NotariesChanged { notaries, reply } => {
                let result = self.notaries_changed(notaries).await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Notary set update failed");
                }
                let _ = reply.send(result);
            }
            Command::RebuildMap { reply } => {
                let result = self.create_network_map().await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Network map rebuild failed");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::ActivateUpdate => {
                if let Err(e) = self.activate_pending_update().await {
                    tracing::error!(error = %e, "Pending update activation failed");
                }
            }
        }
    }

    /// First boot only: store the template under epoch 1 and point
    /// `current-parameters` at it.
    async fn create_network_parameters(&mut self) -> Result<()> {
        if self.stores.etc.get_or_null(CURRENT_PARAMETERS).await?.is_some() {
            return Ok(());
        }
        let params = NetworkParameters::template(Timestamp::now());
        let hash = self.store_signed_parameters(&params).await?;
        self.stores.etc.put(CURRENT_PARAMETERS, &hash.to_hex()).await?;
        tracing::info!(hash = %hash, "Created initial network parameters");
        Ok(())
    }

    async fn add_node(&mut self, signed: SignedNodeInfo) -> Result<SecureHash> {
        let info = signed.verified()?;

        // Flatten all registered identities to name -> owning key. The
        // read-modify-write is race-free because only this worker runs it.
        let mut registered: HashMap<LegalName, PublicKey> = HashMap::new();
        for (key, bytes) in self.stores.node_info.get_all().await? {
            let Ok(stored) = SignedNodeInfo::from_bytes(&bytes) else {
                tracing::warn!(key = %key, "Skipping undecodable stored node descriptor");
                continue;
            };
            let Ok(stored_info) = stored.decode() else {
                tracing::warn!(key = %key, "Skipping undecodable stored node descriptor");
                continue;
            };
            for identity in stored_info.legal_identities {
                registered.insert(identity.name, identity.owning_key);
            }
        }

        let conflicts: Vec<String> = info
            .legal_identities
            .iter()
            .filter(|id| {
                registered
                    .get(&id.name)
                    .is_some_and(|key| *key != id.owning_key)
            })
            .map(|id| id.name.as_str().to_string())
            .collect();
        if !conflicts.is_empty() {
            return Err(ProcessorError::NameConflict { names: conflicts });
        }

        let hash = signed.hash()?;
        self.stores
            .node_info
            .put(&hash.to_hex(), Bytes::from(signed.to_bytes()?))
            .await?;
        tracing::info!(
            node = %hash,
            identities = info.legal_identities.len(),
            "Stored node descriptor"
        );
        self.schedule_network_map_rebuild().await?;
        Ok(hash)
    }

    async fn delete_node(&mut self, hash: SecureHash) -> Result<bool> {
        let existed = self.stores.node_info.delete(&hash.to_hex()).await?;
        if existed {
            tracing::info!(node = %hash, "Deleted node descriptor");
            self.schedule_network_map_rebuild().await?;
        }
        Ok(existed)
    }

    async fn update_parameters(
        &mut self,
        transform: Transform,
        description: String,
        activation_delay: Option<Duration>,
    ) -> Result<()> {
        let (params, _) = self.current_parameters().await?;
        let next = transform(&params);
        let hash = self.store_signed_parameters(&next).await?;

        let now = Timestamp::now();
        let activation = now.plus(activation_delay.unwrap_or(self.param_update_delay));
        if activation <= now {
            self.stores.etc.put(CURRENT_PARAMETERS, &hash.to_hex()).await?;
            tracing::info!(epoch = next.epoch, hash = %hash, %description, "Activated network parameters");
            self.create_network_map().await?;
        } else {
            let update = ParametersUpdate {
                new_parameters_hash: hash,
                description: description.clone(),
                update_deadline: activation,
            };
            self.stores
                .parameters_update
                .put(NEXT_PARAMS_UPDATE, Bytes::from(update.to_bytes()?))
                .await?;
            tracing::info!(
                epoch = next.epoch,
                hash = %hash,
                deadline = %activation,
                %description,
                "Scheduled parameters update"
            );
            self.schedule_network_map_rebuild().await?;
        }
        Ok(())
    }

    async fn notaries_changed(&mut self, notaries: Vec<NotaryInfo>) -> Result<()> {
        let (params, _) = self.current_parameters().await?;
        if params.notaries == notaries {
            tracing::debug!("Notary set unchanged, skipping update");
            return Ok(());
        }
        self.update_parameters(
            Box::new(move |p: &NetworkParameters| p.with_notaries(notaries)),
            "notaries changed".to_string(),
            None,
        )
        .await
    }

    /// Cancels any armed rebuild and either rebuilds inline (zero delay)
    /// or re-arms the debounce timer, coalescing bursts into one rebuild.
    async fn schedule_network_map_rebuild(&mut self) -> Result<()> {
        if let Some(timer) = self.rebuild_timer.take() {
            timer.abort();
        }
        if self.rebuild_delay.is_zero() {
            return self.create_network_map().await;
        }
        let delay = self.rebuild_delay.max(Duration::from_millis(1));
        if let Some(tx) = self.self_tx.upgrade() {
            self.rebuild_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(Command::RebuildMap { reply: None }).await;
            }));
        }
        Ok(())
    }

    /// Composes, signs, and stores the map, then arms the activation
    /// timer when a pending update exists.
    async fn create_network_map(&mut self) -> Result<()> {
        let mut node_info_hashes = Vec::new();
        for key in self.stores.node_info.keys().await? {
            match SecureHash::from_hex(&key) {
                Ok(hash) => node_info_hashes.push(hash),
                Err(_) => tracing::warn!(key = %key, "Skipping non-hash node descriptor key"),
            }
        }
        let pending = self.pending_update().await?;
        let (_, network_parameter_hash) = self.current_parameters().await?;

        let map = NetworkMap {
            node_info_hashes,
            network_parameter_hash,
            parameters_update: pending.clone(),
        };
        let blob = self.signer.sign(map.to_canonical_bytes()?);
        self.stores
            .network_map
            .put(LATEST_NETWORK_MAP, Bytes::from(blob.to_bytes()?))
            .await?;
        tracing::info!(
            nodes = map.node_info_hashes.len(),
            parameters = %network_parameter_hash,
            pending = pending.is_some(),
            "Signed network map"
        );

        if let Some(timer) = self.activation_timer.take() {
            timer.abort();
        }
        if let Some(update) = pending {
            let delay = update
                .update_deadline
                .since(Timestamp::now())
                .max(Duration::from_millis(1));
            if let Some(tx) = self.self_tx.upgrade() {
                self.activation_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Command::ActivateUpdate).await;
                }));
            }
        }
        Ok(())
    }

    /// Applies whatever `next-params-update` holds when the timer fires;
    /// a timer outlived by a newer pending update thus still converges.
    async fn activate_pending_update(&mut self) -> Result<()> {
        let Some(update) = self.pending_update().await? else {
            tracing::debug!("Activation timer fired with no pending update");
            return Ok(());
        };
        self.stores
            .etc
            .put(CURRENT_PARAMETERS, &update.new_parameters_hash.to_hex())
            .await?;
        self.stores.parameters_update.delete(NEXT_PARAMS_UPDATE).await?;
        tracing::info!(
            hash = %update.new_parameters_hash,
            description = %update.description,
            "Activated scheduled parameters update"
        );

        // Tail-reschedule the rebuild as an explicit queue event.
        match self.self_tx.upgrade() {
            Some(tx) if tx.try_send(Command::RebuildMap { reply: None }).is_ok() => Ok(()),
            _ => self.create_network_map().await,
        }
    }

    async fn pending_update(&self) -> Result<Option<ParametersUpdate>> {
        match self
            .stores
            .parameters_update
            .get_or_null(NEXT_PARAMS_UPDATE)
            .await?
        {
            Some(bytes) => Ok(Some(ParametersUpdate::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Follows `current-parameters` to the verified active document.
    async fn current_parameters(&self) -> Result<(NetworkParameters, SecureHash)> {
        let pointer = self
            .stores
            .etc
            .get_or_null(CURRENT_PARAMETERS)
            .await?
            .ok_or_else(|| ProcessorError::BrokenPointer {
                key: CURRENT_PARAMETERS.to_string(),
                reason: "pointer missing".to_string(),
            })?;
        let hash = SecureHash::from_hex(&pointer).map_err(|e| ProcessorError::BrokenPointer {
            key: CURRENT_PARAMETERS.to_string(),
            reason: e.to_string(),
        })?;
        let blob_bytes = self.stores.network_parameters.get(&pointer).await?;
        let blob = SignedBlob::from_bytes(&blob_bytes)?;
        let payload = blob.verify(&self.signer.root())?;
        let params = NetworkParameters::from_bytes(payload)?;
        Ok((params, hash))
    }

    /// Signs and stores a parameters document, returning its content
    /// address (the hash of the signed bytes).
    async fn store_signed_parameters(&self, params: &NetworkParameters) -> Result<SecureHash> {
        let blob = self.signer.sign(params.to_canonical_bytes()?);
        let bytes = blob.to_bytes()?;
        let hash = SecureHash::compute(&bytes);
        self.stores
            .network_parameters
            .put(&hash.to_hex(), Bytes::from(bytes))
            .await?;
        Ok(hash)
    }
}
