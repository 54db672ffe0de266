//! Audio playback request model.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A queued request to play one audio clip.
///
/// Requests are created by producers (identity triggers, embedders) and
/// consumed exactly once by the audio sync coordinator, in FIFO order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Unique request ID, for log correlation.
    pub id: Uuid,
    /// Path of the clip to play.
    pub clip: PathBuf,
    /// When the request was enqueued.
    pub requested_at: DateTime<Utc>,
}

impl PlaybackRequest {
    pub fn new(clip: impl AsRef<Path>) -> Self {
        Self {
            id: Uuid::new_v4(),
            clip: clip.as_ref().to_path_buf(),
            requested_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_get_distinct_ids() {
        let a = PlaybackRequest::new("/clips/meow.wav");
        let b = PlaybackRequest::new("/clips/meow.wav");
        assert_ne!(a.id, b.id);
        assert_eq!(a.clip, b.clip);
    }
}
