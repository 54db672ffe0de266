//! Shared data models for the Ghostly Cat head controller.
//!
//! This crate provides:
//! - Inbound telemetry/identity message types and their wire decoding
//! - Audio playback request model
//! - Decode error types

pub mod audio;
pub mod error;
pub mod telemetry;

// Re-export common types
pub use audio::PlaybackRequest;
pub use error::{DecodeError, DecodeResult};
pub use telemetry::{
    decode_inbound, InboundMessage, RawMessage, TrackingMessage, IDENTITY_TOPIC, TELEMETRY_TOPIC,
};
