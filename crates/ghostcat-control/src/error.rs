//! Controller error types.

use thiserror::Error;

pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Servo board unavailable: {0}")]
    DriverUnavailable(String),

    #[error("Motion error: {0}")]
    Motion(#[from] ghostcat_motion::MotionError),
}

impl ControlError {
    pub fn driver_unavailable(msg: impl Into<String>) -> Self {
        Self::DriverUnavailable(msg.into())
    }
}
