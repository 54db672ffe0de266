//! Inbound message types and wire decoding.
//!
//! The transport client subscribes to two topics and feeds raw payloads
//! into the controller's inbound queue. Tracking payloads are UTF-8 JSON;
//! identity payloads are plain UTF-8 strings. The legacy camera node
//! published single-quote-delimited records, so decoding falls back to a
//! quote-normalizing pass when strict JSON parsing fails.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult};

/// Topic carrying subject-tracking centroids.
pub const TELEMETRY_TOPIC: &str = "cat/telemetry";

/// Topic carrying recognized-identity announcements.
pub const IDENTITY_TOPIC: &str = "cat/identity";

/// Raw payload as delivered by the transport client, before decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Centroid of a detected subject, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingMessage {
    pub centroid_x: f64,
    pub centroid_y: f64,
}

/// A decoded inbound message, tagged by source topic.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Subject centroid from the vision pipeline.
    Tracking(TrackingMessage),
    /// Identity string from the recognition pipeline.
    Identity(String),
}

impl InboundMessage {
    pub fn is_tracking(&self) -> bool {
        matches!(self, InboundMessage::Tracking(_))
    }
}

/// Decode a raw payload received on `topic`.
///
/// Malformed payloads are an error for the caller to log and drop; they
/// never terminate the consumer loop.
pub fn decode_inbound(topic: &str, payload: &[u8]) -> DecodeResult<InboundMessage> {
    match topic {
        TELEMETRY_TOPIC => decode_tracking(payload).map(InboundMessage::Tracking),
        IDENTITY_TOPIC => {
            let identity = std::str::from_utf8(payload)?;
            Ok(InboundMessage::Identity(identity.trim().to_string()))
        }
        other => Err(DecodeError::UnknownTopic(other.to_string())),
    }
}

fn decode_tracking(payload: &[u8]) -> DecodeResult<TrackingMessage> {
    let text = std::str::from_utf8(payload)?;

    let msg: TrackingMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        // Legacy camera firmware publishes single-quoted records.
        Err(_) => serde_json::from_str(&text.replace('\'', "\""))?,
    };

    if msg.centroid_x < 0.0 || msg.centroid_y < 0.0 {
        return Err(DecodeError::NegativeCoordinates {
            x: msg.centroid_x,
            y: msg.centroid_y,
        });
    }

    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tracking_json() {
        let msg = decode_inbound(TELEMETRY_TOPIC, br#"{"centroid_x": 640, "centroid_y": 360}"#)
            .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Tracking(TrackingMessage {
                centroid_x: 640.0,
                centroid_y: 360.0,
            })
        );
    }

    #[test]
    fn test_decode_tracking_legacy_single_quotes() {
        let msg = decode_inbound(TELEMETRY_TOPIC, b"{'centroid_x': 12, 'centroid_y': 34}")
            .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Tracking(TrackingMessage {
                centroid_x: 12.0,
                centroid_y: 34.0,
            })
        );
    }

    #[test]
    fn test_decode_tracking_malformed() {
        assert!(decode_inbound(TELEMETRY_TOPIC, b"not json at all").is_err());
        assert!(decode_inbound(TELEMETRY_TOPIC, b"{\"centroid_x\": 1}").is_err());
    }

    #[test]
    fn test_decode_tracking_negative_rejected() {
        let err = decode_inbound(TELEMETRY_TOPIC, br#"{"centroid_x": -5, "centroid_y": 10}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::NegativeCoordinates { .. }));
    }

    #[test]
    fn test_decode_identity() {
        let msg = decode_inbound(IDENTITY_TOPIC, b"  tomas\n").unwrap();
        assert_eq!(msg, InboundMessage::Identity("tomas".to_string()));
    }

    #[test]
    fn test_decode_unknown_topic() {
        let err = decode_inbound("cat/unknown", b"{}").unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTopic(_)));
    }
}
