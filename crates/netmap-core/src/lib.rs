//! # Netmap Core
//!
//! Domain documents for the network map service: the versioned
//! [`NetworkParameters`] constitution, participant [`NodeInfo`]
//! descriptors, the aggregate [`NetworkMap`], and the closed [`Change`]
//! algebra through which parameters are mutated.
//!
//! Every persisted document serializes to canonical JSON (fixed field
//! order, ordered maps), so the hash of its bytes is a stable identity.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod changeset;
mod error;
mod hash;
mod identity;
mod map;
mod node_info;
mod params;
mod timestamp;
mod whitelist;

pub use changeset::Change;
pub use error::{CoreError, Result};
pub use hash::SecureHash;
pub use identity::{LegalIdentity, LegalName};
pub use map::{NetworkMap, ParametersUpdate};
pub use node_info::{NodeInfo, SignedNodeInfo};
pub use params::{NetworkParameters, NotaryInfo};
pub use timestamp::Timestamp;
pub use whitelist::{format_whitelist, parse_whitelist_line, parse_whitelist_lines, Whitelist};
