//! Telemetry consumption.
//!
//! Drains raw transport messages from the inbound queue, decodes them, and
//! converts tracking centroids into stepped moves on the pan/tilt
//! actuators. While events keep arriving the tracking override stays
//! raised; once the feed goes silent for the staleness timeout the
//! override is released and idle motion resumes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use ghostcat_audio::AudioHandle;
use ghostcat_models::{decode_inbound, InboundMessage, RawMessage, TrackingMessage};
use ghostcat_motion::{map_range, OverrideSignal, SharedActuator};

use crate::config::HeadConfig;

/// Consumes inbound tracking/identity events and owns the tracking
/// actuators while the tracking override is raised.
pub struct TelemetryConsumer {
    rx: mpsc::UnboundedReceiver<RawMessage>,
    pan: SharedActuator,
    tilt: SharedActuator,
    tracking_active: Arc<OverrideSignal>,
    audio: Option<AudioHandle>,
    frame_width: f64,
    frame_height: f64,
    tracking_steps: u32,
    staleness_timeout: Duration,
    poll_interval: Duration,
    tracking_debounce: Option<Duration>,
    identity_clips: HashMap<String, PathBuf>,
    last_event: Option<Instant>,
    last_move: Option<Instant>,
}

impl TelemetryConsumer {
    pub fn new(
        config: &HeadConfig,
        rx: mpsc::UnboundedReceiver<RawMessage>,
        pan: SharedActuator,
        tilt: SharedActuator,
        tracking_active: Arc<OverrideSignal>,
        audio: Option<AudioHandle>,
    ) -> Self {
        Self {
            rx,
            pan,
            tilt,
            tracking_active,
            audio,
            frame_width: config.frame_width,
            frame_height: config.frame_height,
            tracking_steps: config.tracking_steps,
            staleness_timeout: config.staleness_timeout,
            poll_interval: config.poll_interval,
            tracking_debounce: config.tracking_debounce,
            identity_clips: config.identity_clips.clone(),
            last_event: None,
            last_move: None,
        }
    }

    /// Run until the shutdown signal flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        debug!("telemetry consumer started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = self.step() => {}
            }
        }
        debug!("telemetry consumer stopped");
    }

    /// One consumer iteration: handle the next queued message, or poll and
    /// check for staleness when the queue is empty.
    async fn step(&mut self) {
        match self.rx.try_recv() {
            Ok(raw) => self.handle(raw).await,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                tokio::time::sleep(self.poll_interval).await;
                self.release_if_stale();
            }
        }
    }

    fn release_if_stale(&mut self) {
        if !self.tracking_active.is_set() {
            return;
        }
        if let Some(last) = self.last_event {
            if last.elapsed() >= self.staleness_timeout {
                info!(
                    silent_secs = last.elapsed().as_secs(),
                    "tracking feed stale; releasing override"
                );
                self.tracking_active.clear();
            }
        }
    }

    async fn handle(&mut self, raw: RawMessage) {
        match decode_inbound(&raw.topic, &raw.payload) {
            Ok(InboundMessage::Tracking(msg)) => self.track(msg).await,
            Ok(InboundMessage::Identity(name)) => self.identity(&name),
            Err(err) => {
                warn!(topic = %raw.topic, error = %err, "dropping undecodable message");
            }
        }
    }

    /// Map the centroid onto both tracking actuators and move them.
    ///
    /// Output ranges are inverted to mirror the camera: a subject on the
    /// right of the frame pans the head left.
    async fn track(&mut self, msg: TrackingMessage) {
        self.last_event = Some(Instant::now());
        self.tracking_active.set();

        if let (Some(debounce), Some(last_move)) = (self.tracking_debounce, self.last_move) {
            if last_move.elapsed() < debounce {
                trace!("tracking update debounced");
                return;
            }
        }

        trace!(x = msg.centroid_x, y = msg.centroid_y, "centroid received");

        {
            let mut pan = self.pan.lock().await;
            let target = map_range(
                msg.centroid_x,
                0.0,
                self.frame_width,
                pan.max_angle(),
                pan.min_angle(),
            );
            pan.move_stepped(target, self.tracking_steps).await;
        }
        {
            let mut tilt = self.tilt.lock().await;
            let target = map_range(
                msg.centroid_y,
                0.0,
                self.frame_height,
                tilt.max_angle(),
                tilt.min_angle(),
            );
            tilt.move_stepped(target, self.tracking_steps).await;
        }

        self.last_move = Some(Instant::now());
    }

    /// Identity hook: optionally trigger a per-identity greeting clip.
    fn identity(&self, name: &str) {
        debug!(identity = %name, "identity event");
        if let (Some(audio), Some(clip)) = (&self.audio, self.identity_clips.get(name)) {
            info!(identity = %name, clip = %clip.display(), "queueing greeting clip");
            audio.enqueue(clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostcat_models::TELEMETRY_TOPIC;
    use ghostcat_motion::{Actuator, RecordingDriver, ServoChannel};

    /// Pan [0, 140] and tilt [60, 130] on a 1280x720 frame.
    fn wide_config() -> HeadConfig {
        let mut config = HeadConfig::default();
        config.pan.min_angle = 0.0;
        config.pan.max_angle = 140.0;
        config.pan.default_angle = 0.0;
        config.tilt.min_angle = 60.0;
        config.tilt.max_angle = 130.0;
        config.tilt.default_angle = 60.0;
        // Keep stepped moves fast so queued events drain quickly.
        config.pan.secs_per_degree = 0.0001;
        config.tilt.secs_per_degree = 0.0001;
        config
    }

    struct Harness {
        tx: mpsc::UnboundedSender<RawMessage>,
        driver: Arc<RecordingDriver>,
        tracking_active: Arc<OverrideSignal>,
        shutdown: watch::Sender<bool>,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn_consumer(config: HeadConfig) -> Harness {
        let driver = RecordingDriver::new();
        let pan = Actuator::new(config.pan.clone(), driver.clone())
            .unwrap()
            .shared();
        let tilt = Actuator::new(config.tilt.clone(), driver.clone())
            .unwrap()
            .shared();
        let tracking_active = Arc::new(OverrideSignal::new("tracking"));

        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = TelemetryConsumer::new(
            &config,
            rx,
            pan,
            tilt,
            Arc::clone(&tracking_active),
            None,
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(consumer.run(shutdown_rx));

        Harness {
            tx,
            driver,
            tracking_active,
            shutdown,
            task,
        }
    }

    fn tracking_payload(x: f64, y: f64) -> RawMessage {
        RawMessage::new(
            TELEMETRY_TOPIC,
            format!("{{\"centroid_x\": {x}, \"centroid_y\": {y}}}").into_bytes(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_centroid_maps_onto_both_actuators() {
        let harness = spawn_consumer(wide_config());

        harness.tx.send(tracking_payload(640.0, 360.0)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(harness.tracking_active.is_set());

        let pan_writes = harness.driver.writes_for(ServoChannel(0));
        let tilt_writes = harness.driver.writes_for(ServoChannel(1));
        assert_eq!(pan_writes.len(), 50);
        assert_eq!(tilt_writes.len(), 50);
        assert!((pan_writes.last().unwrap() - 70.0).abs() < 1e-6);
        assert!((tilt_writes.last().unwrap() - 95.0).abs() < 1e-6);

        harness.shutdown.send(true).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_rapid_message_produces_a_move() {
        let harness = spawn_consumer(wide_config());

        for _ in 0..6 {
            harness.tx.send(tracking_payload(640.0, 360.0)).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Undebounced: six events, six stepped moves per axis.
        assert_eq!(harness.driver.writes_for(ServoChannel(0)).len(), 6 * 50);
        assert_eq!(harness.driver.writes_for(ServoChannel(1)).len(), 6 * 50);

        harness.shutdown.send(true).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_drops_rapid_updates_when_enabled() {
        let mut config = wide_config();
        config.tracking_debounce = Some(Duration::from_millis(500));
        let harness = spawn_consumer(config);

        for _ in 0..6 {
            harness.tx.send(tracking_payload(640.0, 360.0)).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Only the first event moved; the rest arrived inside the window.
        assert_eq!(harness.driver.writes_for(ServoChannel(0)).len(), 50);
        // The override still tracks event arrival, not motion.
        assert!(harness.tracking_active.is_set());

        harness.shutdown.send(true).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_feed_releases_override_within_one_poll() {
        let harness = spawn_consumer(wide_config());

        harness.tx.send(tracking_payload(100.0, 100.0)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(harness.tracking_active.is_set());

        // Just short of the staleness timeout the override is still held.
        tokio::time::sleep(Duration::from_millis(3900)).await;
        assert!(harness.tracking_active.is_set());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!harness.tracking_active.is_set());

        harness.shutdown.send(true).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_message_is_dropped_not_fatal() {
        let harness = spawn_consumer(wide_config());

        harness
            .tx
            .send(RawMessage::new(TELEMETRY_TOPIC, &b"definitely not json"[..]))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(harness.driver.writes().is_empty());
        assert!(!harness.tracking_active.is_set());

        // The loop is still alive and processes the next good message.
        harness.tx.send(tracking_payload(0.0, 0.0)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(harness.driver.writes_for(ServoChannel(0)).len(), 50);

        harness.shutdown.send(true).unwrap();
        harness.task.await.unwrap();
    }
}
