//! Audio error types.

use thiserror::Error;

pub type AudioResult<T> = Result<T, AudioError>;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to launch player: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Player exited with status {code:?}")]
    PlayerExit { code: Option<i32> },

    #[error("Clip not found: {0}")]
    ClipNotFound(String),
}
