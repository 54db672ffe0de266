//! Actuator orchestration primitives for the Ghostly Cat head.
//!
//! This crate provides:
//! - The servo driver seam consumed by every motion primitive
//! - Bounded, clamped, stepped actuator motion
//! - Shared override signals for signal-based ownership transfer
//! - Randomized idle motion generation
//! - Linear pixel-to-angle range mapping

pub mod actuator;
pub mod driver;
pub mod error;
pub mod idle;
pub mod mapping;
pub mod signal;

pub use actuator::{Actuator, ActuatorConfig, SharedActuator};
pub use driver::{RecordingDriver, ServoChannel, ServoDriver, ServoWrite, TracingDriver};
pub use error::{MotionError, MotionResult};
pub use idle::{IdleMotionGenerator, IdleParams, MotionPattern};
pub use mapping::map_range;
pub use signal::OverrideSignal;
