//! Audio playback and speech-sync mouth coordination.
//!
//! This crate provides:
//! - The async audio player seam and its subprocess-backed default
//! - The FIFO audio sync coordinator that drives the mouth actuator
//!   while a clip plays

pub mod coordinator;
pub mod error;
pub mod player;

pub use coordinator::{AudioHandle, AudioSyncCoordinator};
pub use error::{AudioError, AudioResult};
pub use player::{AudioPlayer, CommandPlayer};
