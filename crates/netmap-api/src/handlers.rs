//! Protocol surface handlers: what enrolled nodes poll and publish.

use crate::error::{ApiError, Result};
use crate::router::AppState;
use crate::types::SignedParametersAck;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use netmap_core::{SecureHash, SignedNodeInfo};
use netmap_storage::{BlobStore, LATEST_NETWORK_MAP};
use std::sync::Arc;

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serves the signed network map with the configured cache lifetime.
pub async fn get_network_map(State(state): State<AppState>) -> Result<Response> {
    let bytes = state.stores.network_map.get(LATEST_NETWORK_MAP).await?;
    signed_artifact(bytes, Some(state.cache_timeout.as_secs()))
}

/// Accepts a signed node descriptor for registration.
pub async fn publish_node(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let signed = SignedNodeInfo::from_bytes(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed node descriptor: {e}")))?;
    state.processor.add_node(signed).await?;
    Ok(StatusCode::OK)
}

/// Records a participant's acknowledgement of a parameters hash.
pub async fn ack_parameters(body: Bytes) -> Result<StatusCode> {
    let ack: SignedParametersAck = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed acknowledgement: {e}")))?;
    ack.verify()
        .map_err(|e| ApiError::BadRequest(format!("bad acknowledgement signature: {e}")))?;
    tracing::info!(
        node = %ack.public_key,
        hash = %ack.hash,
        "Node acknowledged network parameters"
    );
    Ok(StatusCode::OK)
}

/// Serves one signed node descriptor by hash.
pub async fn get_node_info(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response> {
    fetch_by_hash(&state.stores.node_info, &hash).await
}

/// Serves one signed parameters document by hash.
pub async fn get_network_parameters(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response> {
    fetch_by_hash(&state.stores.network_parameters, &hash).await
}

async fn fetch_by_hash(store: &Arc<dyn BlobStore>, hash: &str) -> Result<Response> {
    let hash = SecureHash::from_hex(hash)
        .map_err(|_| ApiError::BadRequest(format!("not a valid hash: {hash}")))?;
    let bytes = store.get(&hash.to_hex()).await?;
    signed_artifact(bytes, None)
}

fn signed_artifact(bytes: Bytes, max_age: Option<u64>) -> Result<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream");
    if let Some(secs) = max_age {
        builder = builder.header(header::CACHE_CONTROL, format!("max-age={secs}"));
    }
    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
