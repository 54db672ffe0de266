//! Boot sequence, task launch, and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ghostcat_audio::{AudioHandle, AudioSyncCoordinator, CommandPlayer};
use ghostcat_models::RawMessage;
use ghostcat_motion::{
    Actuator, IdleMotionGenerator, OverrideSignal, ServoDriver, SharedActuator,
};

use crate::config::HeadConfig;
use crate::consumer::TelemetryConsumer;
use crate::error::ControlResult;

/// Builds the head out of its configured actuators and runs every
/// coordination task to completion.
pub struct Orchestrator {
    config: HeadConfig,
}

/// Handles to a running head.
pub struct RunningHead {
    /// Producer side of the playback queue.
    pub audio: AudioHandle,
    /// Raised while tracking owns the pan/tilt actuators.
    pub tracking_active: Arc<OverrideSignal>,
    /// Raised while playback owns the mouth actuator.
    pub audio_playing: Arc<OverrideSignal>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_timeout: Duration,
}

impl RunningHead {
    /// Signal every task to stop and wait for acknowledgement.
    ///
    /// Join failures are collected and logged; shutdown never converts a
    /// clean exit into a failed one. Tasks that miss the deadline (for
    /// example, mid-playback) are aborted.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        for (name, mut task) in self.tasks {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => debug!(task = name, "task stopped"),
                Ok(Err(err)) => warn!(task = name, error = %err, "task ended abnormally"),
                Err(_) => {
                    warn!(task = name, "task did not acknowledge shutdown; aborting");
                    task.abort();
                    if let Err(err) = task.await {
                        if !err.is_cancelled() {
                            warn!(task = name, error = %err, "aborted task failed");
                        }
                    }
                }
            }
        }

        info!("all head tasks stopped");
    }
}

impl Orchestrator {
    pub fn new(config: HeadConfig) -> Self {
        Self { config }
    }

    /// Acquire the servo board, retrying at a fixed interval until it
    /// appears. This is the only unbounded-retry path in the controller.
    pub async fn acquire_driver<F>(&self, mut factory: F) -> Arc<dyn ServoDriver>
    where
        F: FnMut() -> ControlResult<Arc<dyn ServoDriver>>,
    {
        loop {
            match factory() {
                Ok(driver) => {
                    info!("servo board acquired");
                    return driver;
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        retry_secs = self.config.hardware_retry_delay.as_secs(),
                        "servo board unavailable; retrying"
                    );
                    tokio::time::sleep(self.config.hardware_retry_delay).await;
                }
            }
        }
    }

    /// Configure and home every actuator, then launch all head tasks.
    pub async fn start(
        &self,
        driver: Arc<dyn ServoDriver>,
        inbound: mpsc::UnboundedReceiver<RawMessage>,
    ) -> ControlResult<RunningHead> {
        let mut pan = Actuator::new(self.config.pan.clone(), Arc::clone(&driver))?;
        let mut tilt = Actuator::new(self.config.tilt.clone(), Arc::clone(&driver))?;
        let mut mouth = Actuator::new(self.config.mouth.clone(), Arc::clone(&driver))?;

        for actuator in [&pan, &tilt, &mouth] {
            actuator.configure();
        }

        // Home one actuator at a time; move_to pauses after each.
        info!("homing actuators");
        for actuator in [&mut pan, &mut tilt, &mut mouth] {
            actuator.move_to(actuator.default_angle()).await;
        }

        let pan = pan.shared();
        let tilt = tilt.shared();
        let mouth = mouth.shared();

        let tracking_active = Arc::new(OverrideSignal::new("tracking-active"));
        let audio_playing = Arc::new(OverrideSignal::new("audio-playing"));

        let player = Arc::new(CommandPlayer::new(
            self.config.audio_player.clone(),
            self.config.audio_device.clone(),
        ));
        let (audio, coordinator) = AudioSyncCoordinator::new(
            player,
            Arc::clone(&mouth),
            Arc::clone(&audio_playing),
            self.config.mouth_half_period,
        );

        let consumer = TelemetryConsumer::new(
            &self.config,
            inbound,
            Arc::clone(&pan),
            Arc::clone(&tilt),
            Arc::clone(&tracking_active),
            Some(audio.clone()),
        );

        let (shutdown, _) = watch::channel(false);

        let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();
        tasks.push(("telemetry", tokio::spawn(consumer.run(shutdown.subscribe()))));
        tasks.push(("audio-sync", tokio::spawn(coordinator.run(shutdown.subscribe()))));

        let idle_plan: [(&'static str, &SharedActuator, Vec<Arc<OverrideSignal>>); 3] = [
            ("idle-pan", &pan, vec![Arc::clone(&tracking_active)]),
            ("idle-tilt", &tilt, vec![Arc::clone(&tracking_active)]),
            ("idle-mouth", &mouth, vec![Arc::clone(&audio_playing)]),
        ];
        for (name, actuator, suppressors) in idle_plan {
            let generator = IdleMotionGenerator::new(
                Arc::clone(actuator),
                suppressors,
                self.config.idle.clone(),
                StdRng::from_os_rng(),
            );
            tasks.push((name, tokio::spawn(generator.run(shutdown.subscribe()))));
        }

        info!(tasks = tasks.len(), "head tasks launched");

        Ok(RunningHead {
            audio,
            tracking_active,
            audio_playing,
            shutdown,
            tasks,
            shutdown_timeout: self.config.shutdown_timeout,
        })
    }

    /// Full lifecycle: acquire hardware, run until a termination signal,
    /// shut down cooperatively.
    pub async fn run<F>(
        self,
        factory: F,
        inbound: mpsc::UnboundedReceiver<RawMessage>,
    ) -> ControlResult<()>
    where
        F: FnMut() -> ControlResult<Arc<dyn ServoDriver>>,
    {
        let driver = self.acquire_driver(factory).await;
        let head = self.start(driver, inbound).await?;

        tokio::signal::ctrl_c().await.ok();
        info!("termination signal received; shutting down");

        head.shutdown().await;
        Ok(())
    }
}
