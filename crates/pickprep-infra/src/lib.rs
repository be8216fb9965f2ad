//! Pickprep Infrastructure Library
//!
//! This crate provides shared infrastructure used by pickprep binaries:
//! - Tracing initialization
//! - A telemetry sink that reports pipeline events through `tracing`

pub mod events;
pub mod telemetry;

// Re-export commonly used types
pub use events::TracingEventSink;
pub use telemetry::init_tracing;
