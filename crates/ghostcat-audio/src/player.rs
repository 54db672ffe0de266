//! Audio player seam.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// External playback collaborator.
///
/// `play_to_completion` returns once the clip has finished; its duration is
/// bounded only by the clip itself.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play_to_completion(&self, clip: &Path) -> AudioResult<()>;
}

/// Player that shells out to an ALSA-style command-line player.
///
/// Mirrors the deployment this controller ships on, where clips are played
/// with `aplay -D hw:2,0 <clip>`.
pub struct CommandPlayer {
    program: String,
    device: Option<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, device: Option<String>) -> Self {
        Self {
            program: program.into(),
            device,
        }
    }
}

impl Default for CommandPlayer {
    fn default() -> Self {
        Self::new("aplay", None)
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play_to_completion(&self, clip: &Path) -> AudioResult<()> {
        if !clip.exists() {
            return Err(AudioError::ClipNotFound(clip.display().to_string()));
        }

        let mut cmd = Command::new(&self.program);
        if let Some(device) = &self.device {
            cmd.arg("-D").arg(device);
        }
        cmd.arg(clip).stdout(Stdio::null()).stderr(Stdio::null());

        debug!(player = %self.program, clip = %clip.display(), "starting playback process");
        let status = cmd.status().await?;

        if !status.success() {
            return Err(AudioError::PlayerExit {
                code: status.code(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_clip_is_an_error() {
        let player = CommandPlayer::default();
        let err = player
            .play_to_completion(Path::new("/nonexistent/clip.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, AudioError::ClipNotFound(_)));
    }

    #[tokio::test]
    async fn test_true_command_plays_to_completion() {
        let clip = tempfile::NamedTempFile::new().unwrap();
        // Stand in for the real player with a command that exits cleanly.
        let player = CommandPlayer::new("true", None);
        assert!(player.play_to_completion(clip.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_player_reports_exit_status() {
        let clip = tempfile::NamedTempFile::new().unwrap();
        let player = CommandPlayer::new("false", None);
        let err = player.play_to_completion(clip.path()).await.unwrap_err();
        assert!(matches!(err, AudioError::PlayerExit { .. }));
    }
}
