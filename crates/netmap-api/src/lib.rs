//! # Netmap API
//!
//! The HTTP surface of the network map service, built on axum.
//!
//! Two roots: `/network-map` is the protocol API enrolled nodes poll and
//! publish to; `/admin/api` is the management surface (basic auth).
//! Mutations are translated into change requests on the serialized event
//! processor; cached signed artifacts are served directly from storage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admin;
mod error;
mod handlers;
mod router;
mod types;

pub use error::{ApiError, Result};
pub use router::{create_router, AdminCredentials, AppState};
pub use types::{NodeView, SignedParametersAck};
