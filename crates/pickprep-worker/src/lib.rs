//! Preparation pipeline: preload remote items, transcode what the requesting
//! application cannot consume, and resolve one result per batch.
//!
//! [`PrepareOrchestrator`] is the entry point. Each batch runs as a small task
//! tree under one cancellation scope:
//!
//! - a bounded preloader pool,
//! - a sequential transcode worker fed by a bounded queue ([`transcode`]),
//! - a convergence monitor woken by coalesced heartbeats.
//!
//! All of them share the batch's [`StatusStore`] table.

mod batch;
pub mod capability;
pub mod context;
pub mod heartbeat;
mod monitor;
pub mod orchestrator;
pub mod outcome;
mod preloader;
pub mod selection;
pub mod status_store;
pub mod transcode;

pub use capability::MimeTypeCapabilityChecker;
pub use context::PrepareCollaborators;
pub use orchestrator::{PrepareOrchestrator, PrepareState, StorageContextId};
pub use outcome::{PrepareHandle, PrepareOutcome};
pub use selection::InMemorySelection;
pub use status_store::{BatchSnapshot, StatusEntry, StatusStore};
