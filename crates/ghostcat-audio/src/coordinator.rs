//! Audio sync coordination.
//!
//! Playback requests are drained strictly in FIFO order; while a clip
//! plays, the mouth actuator is rapid-cycled under the audio-playing
//! override so its idle generator stays parked.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use ghostcat_models::PlaybackRequest;
use ghostcat_motion::{OverrideSignal, SharedActuator};

use crate::player::AudioPlayer;

/// Producer handle for enqueueing playback requests.
#[derive(Clone)]
pub struct AudioHandle {
    tx: mpsc::UnboundedSender<PlaybackRequest>,
}

impl AudioHandle {
    /// Queue one clip for playback. Requests play in enqueue order.
    pub fn enqueue(&self, clip: impl AsRef<Path>) {
        let request = PlaybackRequest::new(clip);
        debug!(id = %request.id, clip = %request.clip.display(), "playback request queued");
        if self.tx.send(request).is_err() {
            warn!("audio coordinator is gone; dropping playback request");
        }
    }
}

/// Serializes playback and drives the mouth while a clip plays.
pub struct AudioSyncCoordinator {
    rx: mpsc::UnboundedReceiver<PlaybackRequest>,
    player: Arc<dyn AudioPlayer>,
    mouth: SharedActuator,
    audio_playing: Arc<OverrideSignal>,
    half_period: Duration,
}

impl AudioSyncCoordinator {
    pub fn new(
        player: Arc<dyn AudioPlayer>,
        mouth: SharedActuator,
        audio_playing: Arc<OverrideSignal>,
        half_period: Duration,
    ) -> (AudioHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            AudioHandle { tx },
            Self {
                rx,
                player,
                mouth,
                audio_playing,
                half_period,
            },
        )
    }

    /// Drain requests one at a time until the shutdown signal flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        debug!("audio sync coordinator started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                request = self.rx.recv() => {
                    match request {
                        Some(request) => self.play(request).await,
                        None => break,
                    }
                }
            }
        }
        debug!("audio sync coordinator stopped");
    }

    /// Play one clip while rapid-cycling the mouth.
    ///
    /// The next request is not started until this playback call returns.
    /// A failed playback is logged and treated as completed so the queue
    /// keeps draining.
    async fn play(&mut self, request: PlaybackRequest) {
        info!(id = %request.id, clip = %request.clip.display(), "playback started");
        self.audio_playing.set();

        let player = Arc::clone(&self.player);
        let clip = request.clip.clone();
        let mut playback = tokio::spawn(async move { player.play_to_completion(&clip).await });

        {
            let mut mouth = self.mouth.lock().await;
            let outcome = loop {
                tokio::select! {
                    res = &mut playback => break res,
                    _ = mouth.cycle_rapid_once(self.half_period) => {}
                }
            };

            match outcome {
                Ok(Ok(())) => info!(id = %request.id, "playback complete"),
                Ok(Err(err)) => {
                    warn!(id = %request.id, error = %err, "playback failed; treating as complete")
                }
                Err(err) => warn!(id = %request.id, error = %err, "playback task failed"),
            }
        }

        self.audio_playing.clear();
    }
}
