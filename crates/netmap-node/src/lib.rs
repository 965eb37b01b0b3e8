//! # Netmap Node
//!
//! Bootstrap for the network map service: configuration, logging, key
//! material, storage migration, and the HTTP server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod keys;
pub mod logging;
