//! Management surface handlers.
//!
//! Every mutation is translated into a change request on the processor;
//! listings are derived from the current parameters or the node store.

use crate::error::{ApiError, Result};
use crate::router::AppState;
use crate::types::NodeView;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use netmap_core::{
    format_whitelist, parse_whitelist_lines, Change, NetworkParameters, NotaryInfo,
    ParametersUpdate, SecureHash, SignedNodeInfo,
};
use netmap_identity::SignedBlob;
use netmap_storage::{BlobStore, CURRENT_PARAMETERS, NEXT_PARAMS_UPDATE};

/// Lists the notaries of the current parameters.
pub async fn list_notaries(State(state): State<AppState>) -> Result<Json<Vec<NotaryInfo>>> {
    let params = read_current_parameters(&state).await?;
    Ok(Json(params.notaries))
}

/// Registers a validating notary from a signed node descriptor.
pub async fn post_validating_notary(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode> {
    add_notary(&state, &body, true).await
}

/// Registers a non-validating notary from a signed node descriptor.
pub async fn post_non_validating_notary(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode> {
    add_notary(&state, &body, false).await
}

async fn add_notary(state: &AppState, body: &[u8], validating: bool) -> Result<StatusCode> {
    let signed = SignedNodeInfo::from_bytes(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed node descriptor: {e}")))?;
    let info = signed
        .verified()
        .map_err(|e| ApiError::BadRequest(format!("rejected node descriptor: {e}")))?;
    let identity = info
        .legal_identities
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("node descriptor has no identity".to_string()))?;
    state
        .processor
        .apply_change(Change::AddNotary(NotaryInfo::new(identity, validating)), None)
        .await?;
    Ok(StatusCode::OK)
}

/// Removes the notary whose legal name hashes to `name_hash`.
pub async fn delete_notary(
    State(state): State<AppState>,
    Path(name_hash): Path<String>,
) -> Result<StatusCode> {
    let name_hash = SecureHash::from_hex(&name_hash)
        .map_err(|_| ApiError::BadRequest(format!("not a valid hash: {name_hash}")))?;
    state
        .processor
        .apply_change(Change::RemoveNotary(name_hash), None)
        .await?;
    Ok(StatusCode::OK)
}

/// Lists stored node descriptors.
pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<NodeView>>> {
    let mut views = Vec::new();
    for (hash, bytes) in state.stores.node_info.get_all().await? {
        let Ok(signed) = SignedNodeInfo::from_bytes(&bytes) else {
            continue;
        };
        let Ok(info) = signed.decode() else {
            continue;
        };
        views.push(NodeView::new(hash, &info));
    }
    Ok(Json(views))
}

/// Deletes a stored node descriptor.
pub async fn delete_node(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<StatusCode> {
    let hash = SecureHash::from_hex(&hash)
        .map_err(|_| ApiError::BadRequest(format!("not a valid hash: {hash}")))?;
    if state.processor.delete_node(hash).await? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound(hash.to_hex()))
    }
}

/// Renders the current whitelist as `<fqn>:<sha256>` lines.
pub async fn get_whitelist(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let params = read_current_parameters(&state).await?;
    Ok(format_whitelist(&params.whitelist))
}

/// Unions the posted lines into the whitelist.
pub async fn append_whitelist(State(state): State<AppState>, body: String) -> Result<StatusCode> {
    let entries =
        parse_whitelist_lines(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state
        .processor
        .apply_change(Change::AppendWhiteList(entries), None)
        .await?;
    Ok(StatusCode::OK)
}

/// Replaces the whitelist with the posted lines.
pub async fn replace_whitelist(State(state): State<AppState>, body: String) -> Result<StatusCode> {
    let entries =
        parse_whitelist_lines(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state
        .processor
        .apply_change(Change::ReplaceWhiteList(entries), None)
        .await?;
    Ok(StatusCode::OK)
}

/// Empties the whitelist.
pub async fn clear_whitelist(State(state): State<AppState>) -> Result<StatusCode> {
    state.processor.apply_change(Change::ClearWhiteList, None).await?;
    Ok(StatusCode::OK)
}

/// Shows the currently active parameters document.
pub async fn current_parameters(
    State(state): State<AppState>,
) -> Result<Json<NetworkParameters>> {
    Ok(Json(read_current_parameters(&state).await?))
}

/// Shows the pending parameters update, if one is scheduled.
pub async fn pending_update(State(state): State<AppState>) -> Result<Json<ParametersUpdate>> {
    let bytes = state
        .stores
        .parameters_update
        .get_or_null(NEXT_PARAMS_UPDATE)
        .await?
        .ok_or_else(|| ApiError::NotFound("no parameters update scheduled".to_string()))?;
    let update = ParametersUpdate::from_bytes(&bytes)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(update))
}

/// Follows the `current-parameters` pointer to the verified document.
async fn read_current_parameters(state: &AppState) -> Result<NetworkParameters> {
    let pointer = state.stores.etc.get(CURRENT_PARAMETERS).await?;
    let bytes = state.stores.network_parameters.get(&pointer).await?;
    let blob =
        SignedBlob::from_bytes(&bytes).map_err(|e| ApiError::Internal(e.to_string()))?;
    let payload = blob
        .verify(&state.root)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    NetworkParameters::from_bytes(payload).map_err(|e| ApiError::Internal(e.to_string()))
}
