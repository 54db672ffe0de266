//! Motion error types.

use thiserror::Error;

pub type MotionResult<T> = Result<T, MotionError>;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Invalid angle range for '{name}': min {min} must be below max {max}")]
    InvalidAngleRange { name: String, min: f64, max: f64 },

    #[error("Invalid pulse range for '{name}': {min_us}..{max_us} us")]
    InvalidPulseRange { name: String, min_us: u16, max_us: u16 },

    #[error("Default angle {angle} for '{name}' outside [{min}, {max}]")]
    DefaultOutOfRange {
        name: String,
        angle: f64,
        min: f64,
        max: f64,
    },
}
