//! Router assembly and shared application state.

use crate::{admin, handlers};
use axum::routing::{delete, get, post};
use axum::Router;
use netmap_identity::PublicKey;
use netmap_processor::ProcessorHandle;
use netmap_storage::ServiceStores;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tower_http::validate_request::ValidateRequestHeaderLayer;

/// State shared across handlers.
///
/// Mutations go through the processor; reads are served straight from the
/// stores the processor writes.
#[derive(Clone)]
pub struct AppState {
    /// Handle onto the serialized event processor.
    pub processor: ProcessorHandle,
    /// The persisted collections.
    pub stores: ServiceStores,
    /// Well-known root key served artifacts verify against.
    pub root: PublicKey,
    /// `Cache-Control: max-age` for the served map.
    pub cache_timeout: Duration,
}

/// Admin credentials for the management surface.
#[derive(Clone)]
pub struct AdminCredentials {
    /// Basic auth username.
    pub username: String,
    /// Basic auth password.
    pub password: String,
}

/// Builds the full service router.
///
/// The protocol surface lives under `/network-map`; the management surface
/// under `/admin/api`, guarded by basic auth when credentials are set.
pub fn create_router(state: AppState, admin_credentials: Option<AdminCredentials>) -> Router {
    let protocol = Router::new()
        .route("/network-map", get(handlers::get_network_map))
        .route("/network-map/publish", post(handlers::publish_node))
        .route("/network-map/ack-parameters", post(handlers::ack_parameters))
        .route("/network-map/node-info/{hash}", get(handlers::get_node_info))
        .route(
            "/network-map/network-parameters/{hash}",
            get(handlers::get_network_parameters),
        );

    let mut management = Router::new()
        .route("/notaries", get(admin::list_notaries))
        .route("/notaries/validating", post(admin::post_validating_notary))
        .route(
            "/notaries/non-validating",
            post(admin::post_non_validating_notary),
        )
        .route("/notaries/{name_hash}", delete(admin::delete_notary))
        .route("/nodes", get(admin::list_nodes))
        .route("/nodes/{hash}", delete(admin::delete_node))
        .route(
            "/whitelist",
            get(admin::get_whitelist)
                .post(admin::append_whitelist)
                .put(admin::replace_whitelist)
                .delete(admin::clear_whitelist),
        )
        .route(
            "/network-parameters/current",
            get(admin::current_parameters),
        )
        .route("/network-parameters/update", get(admin::pending_update));
    if let Some(credentials) = admin_credentials {
        management = management.layer(ValidateRequestHeaderLayer::basic(
            &credentials.username,
            &credentials.password,
        ));
    }

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protocol)
        .nest("/admin/api", management)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
