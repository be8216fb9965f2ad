//! Data models for the preparation pipeline
//!
//! Media identity, the per-item two-axis status, and telemetry events.

mod events;
mod media;
mod status;

pub use events::*;
pub use media::*;
pub use status::*;
