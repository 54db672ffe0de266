//! Decode error types.

use thiserror::Error;

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Message on unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed telemetry payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Telemetry coordinates out of range: x={x}, y={y}")]
    NegativeCoordinates { x: f64, y: f64 },
}
