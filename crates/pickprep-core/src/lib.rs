//! Pickprep Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! collaborator traits shared by every pickprep component.

pub mod capability;
pub mod config;
pub mod error;
pub mod hooks;
pub mod locator;
pub mod models;

// Re-export commonly used types
pub use capability::{
    TranscodeCapabilities, TranscodeCapabilityChecker, TranscodeExecutor, TranscodeRequest,
};
pub use config::{PrepareConfig, SelectionMode};
pub use error::{ErrorMetadata, LogLevel, PrepareError};
pub use hooks::{NoOpEventSink, PrepareEventSink, Selection};
pub use locator::{Locator, LocatorError, PICKER_SEGMENT, PICKER_TRANSCODED_SEGMENT};
pub use models::{
    LoadStatus, Locality, MediaId, MediaItem, MediaKind, PrepareEvent, PrepareEventKind,
    PrepareStatus, Progress, StatusPatch, TranscodeStatus,
};
