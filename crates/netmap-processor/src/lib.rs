//! # Netmap Processor
//!
//! The event-serialized subsystem at the center of the network map
//! service. A single worker task owns every state mutation: node
//! registrations, parameter changes, debounced map rebuilds, and
//! timer-driven activation of pending parameter updates all pass through
//! one command queue, so no two mutations can interleave.
//!
//! The [`watcher`] module feeds notary certificate changes from a watched
//! directory into the same queue.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod processor;
pub mod watcher;

pub use error::{ProcessorError, Result};
pub use processor::{
    NetworkMapProcessor, NotaryWatchConfig, ProcessorConfig, ProcessorHandle,
};
pub use watcher::DirectoryDigestWatcher;
