//! Controller configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use ghostcat_motion::{ActuatorConfig, IdleParams, ServoChannel};

/// Reference motion speed: the stock servos cover 60 degrees in 0.32 s.
const SECS_PER_DEGREE: f64 = 0.32 / 60.0;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct HeadConfig {
    /// Camera frame width in pixels.
    pub frame_width: f64,
    /// Camera frame height in pixels.
    pub frame_height: f64,
    /// Silence interval after which the tracking override is released.
    pub staleness_timeout: Duration,
    /// Sleep between inbound-queue polls when the queue is empty.
    pub poll_interval: Duration,
    /// Step count for tracking moves.
    pub tracking_steps: u32,
    /// Delay between servo-board acquisition attempts.
    pub hardware_retry_delay: Duration,
    /// How long to wait for tasks to acknowledge shutdown before aborting.
    pub shutdown_timeout: Duration,
    /// Half period of the mouth cycle during speech playback.
    pub mouth_half_period: Duration,
    /// Minimum interval between tracking moves. Off by default: every
    /// tracking event produces a move.
    pub tracking_debounce: Option<Duration>,
    /// Identity -> clip map for the audio trigger hook. Empty by default.
    pub identity_clips: HashMap<String, PathBuf>,
    /// Playback program, e.g. "aplay".
    pub audio_player: String,
    /// ALSA-style output device passed to the player, e.g. "hw:2,0".
    pub audio_device: Option<String>,
    /// Left-right neck actuator.
    pub pan: ActuatorConfig,
    /// Up-down neck actuator.
    pub tilt: ActuatorConfig,
    /// Mouth actuator.
    pub mouth: ActuatorConfig,
    /// Idle motion tuning, shared by all generators.
    pub idle: IdleParams,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            frame_width: 1280.0,
            frame_height: 720.0,
            staleness_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            tracking_steps: 50,
            hardware_retry_delay: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            mouth_half_period: Duration::from_millis(100),
            tracking_debounce: None,
            identity_clips: HashMap::new(),
            audio_player: "aplay".to_string(),
            audio_device: None,
            pan: ActuatorConfig {
                name: "pan".to_string(),
                channel: ServoChannel(0),
                min_angle: 0.0,
                max_angle: 100.0,
                pulse_min_us: 800,
                pulse_max_us: 2500,
                default_angle: 50.0,
                secs_per_degree: SECS_PER_DEGREE,
                settle_delay: Duration::from_secs(1),
            },
            tilt: ActuatorConfig {
                name: "tilt".to_string(),
                channel: ServoChannel(1),
                min_angle: 0.0,
                max_angle: 30.0,
                pulse_min_us: 600,
                pulse_max_us: 2250,
                default_angle: 0.0,
                secs_per_degree: SECS_PER_DEGREE,
                settle_delay: Duration::from_secs(1),
            },
            mouth: ActuatorConfig {
                name: "mouth".to_string(),
                channel: ServoChannel(2),
                min_angle: 0.0,
                max_angle: 40.0,
                pulse_min_us: 600,
                pulse_max_us: 2250,
                default_angle: 0.0,
                secs_per_degree: SECS_PER_DEGREE,
                settle_delay: Duration::from_secs(1),
            },
            idle: IdleParams::default(),
        }
    }
}

impl HeadConfig {
    /// Create config from environment variables, falling back to the
    /// reference defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            frame_width: env_parse("GHOSTCAT_FRAME_WIDTH", defaults.frame_width),
            frame_height: env_parse("GHOSTCAT_FRAME_HEIGHT", defaults.frame_height),
            staleness_timeout: Duration::from_millis(env_parse(
                "GHOSTCAT_STALENESS_MS",
                defaults.staleness_timeout.as_millis() as u64,
            )),
            poll_interval: Duration::from_millis(env_parse(
                "GHOSTCAT_POLL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
            tracking_steps: env_parse("GHOSTCAT_TRACKING_STEPS", defaults.tracking_steps),
            hardware_retry_delay: Duration::from_secs(env_parse(
                "GHOSTCAT_RETRY_SECS",
                defaults.hardware_retry_delay.as_secs(),
            )),
            shutdown_timeout: Duration::from_secs(env_parse(
                "GHOSTCAT_SHUTDOWN_SECS",
                defaults.shutdown_timeout.as_secs(),
            )),
            mouth_half_period: Duration::from_millis(env_parse(
                "GHOSTCAT_MOUTH_HALF_PERIOD_MS",
                defaults.mouth_half_period.as_millis() as u64,
            )),
            tracking_debounce: std::env::var("GHOSTCAT_DEBOUNCE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis),
            identity_clips: std::env::var("GHOSTCAT_IDENTITY_CLIPS")
                .map(|s| parse_identity_clips(&s))
                .unwrap_or_default(),
            audio_player: std::env::var("GHOSTCAT_AUDIO_PLAYER")
                .unwrap_or(defaults.audio_player),
            audio_device: std::env::var("GHOSTCAT_AUDIO_DEVICE").ok(),
            pan: defaults.pan,
            tilt: defaults.tilt,
            mouth: defaults.mouth,
            idle: defaults.idle,
        }
    }

    /// The three actuators in homing order.
    pub fn actuators(&self) -> [&ActuatorConfig; 3] {
        [&self.pan, &self.tilt, &self.mouth]
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse `name=path,name=path` pairs for the identity audio trigger.
fn parse_identity_clips(raw: &str) -> HashMap<String, PathBuf> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, path) = pair.split_once('=')?;
            let name = name.trim();
            let path = path.trim();
            if name.is_empty() || path.is_empty() {
                return None;
            }
            Some((name.to_string(), PathBuf::from(path)))
        })
        .collect()
}
