//! Bounded, clamped actuator motion primitives.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::{ServoChannel, ServoDriver};
use crate::error::{MotionError, MotionResult};
use crate::signal::OverrideSignal;

/// An actuator shared between its idle generator and whichever coordinator
/// currently owns it. The lock is held only for the duration of a single
/// motion primitive.
pub type SharedActuator = Arc<Mutex<Actuator>>;

/// Immutable per-actuator configuration, set at construction.
#[derive(Debug, Clone)]
pub struct ActuatorConfig {
    /// Human-readable name used in logs, e.g. "pan".
    pub name: String,
    /// Hardware channel on the servo board.
    pub channel: ServoChannel,
    /// Lower bound of the safe angle range, degrees.
    pub min_angle: f64,
    /// Upper bound of the safe angle range, degrees.
    pub max_angle: f64,
    /// Minimum pulse width, microseconds.
    pub pulse_min_us: u16,
    /// Maximum pulse width, microseconds.
    pub pulse_max_us: u16,
    /// Home position, degrees.
    pub default_angle: f64,
    /// Motion speed: seconds of travel per degree of angular distance.
    pub secs_per_degree: f64,
    /// Settle pause after a direct (non-stepped) move.
    pub settle_delay: Duration,
}

impl ActuatorConfig {
    pub fn validate(&self) -> MotionResult<()> {
        if self.min_angle >= self.max_angle {
            return Err(MotionError::InvalidAngleRange {
                name: self.name.clone(),
                min: self.min_angle,
                max: self.max_angle,
            });
        }
        if self.pulse_min_us >= self.pulse_max_us {
            return Err(MotionError::InvalidPulseRange {
                name: self.name.clone(),
                min_us: self.pulse_min_us,
                max_us: self.pulse_max_us,
            });
        }
        if self.default_angle < self.min_angle || self.default_angle > self.max_angle {
            return Err(MotionError::DefaultOutOfRange {
                name: self.name.clone(),
                angle: self.default_angle,
                min: self.min_angle,
                max: self.max_angle,
            });
        }
        Ok(())
    }
}

/// One rotary output channel with a bounded safe angle range.
///
/// `current_angle` stays inside `[min_angle, max_angle]` at all observable
/// times; out-of-range targets are clamped silently.
pub struct Actuator {
    config: ActuatorConfig,
    driver: Arc<dyn ServoDriver>,
    current_angle: f64,
}

impl Actuator {
    pub fn new(config: ActuatorConfig, driver: Arc<dyn ServoDriver>) -> MotionResult<Self> {
        config.validate()?;
        let current_angle = config.default_angle;
        Ok(Self {
            config,
            driver,
            current_angle,
        })
    }

    /// Wrap this actuator for shared ownership across tasks.
    pub fn shared(self) -> SharedActuator {
        Arc::new(Mutex::new(self))
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn channel(&self) -> ServoChannel {
        self.config.channel
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn min_angle(&self) -> f64 {
        self.config.min_angle
    }

    pub fn max_angle(&self) -> f64 {
        self.config.max_angle
    }

    pub fn default_angle(&self) -> f64 {
        self.config.default_angle
    }

    fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(self.config.min_angle, self.config.max_angle)
    }

    /// Apply the pulse-width range to the channel. Called once at startup.
    pub fn configure(&self) {
        self.driver.set_pulse_range(
            self.config.channel,
            self.config.pulse_min_us,
            self.config.pulse_max_us,
        );
    }

    /// Move directly to the clamped target and wait the settle delay.
    ///
    /// Used for homing and `Hold` moves; tracking and idle sweeps go
    /// through [`Actuator::move_stepped`].
    pub async fn move_to(&mut self, target: f64) {
        let clamped = self.clamp(target);
        self.driver.set_angle(self.config.channel, clamped);
        self.current_angle = clamped;
        tokio::time::sleep(self.config.settle_delay).await;
    }

    /// Move to the target over `steps` evenly timed increments.
    ///
    /// Total motion time is `|target - current| * secs_per_degree`,
    /// computed from the requested (unclamped) delta; every intermediate
    /// write is clamped into the safe range.
    pub async fn move_stepped(&mut self, target: f64, steps: u32) {
        self.stepped_inner(target, steps, &[]).await;
    }

    /// Stepped move that re-checks the given suppressors before every step
    /// write and stops early once any is set.
    ///
    /// Returns `true` when the move ran to completion. Idle generators use
    /// this so that ownership can transfer within one step's delay.
    pub async fn move_stepped_guarded(
        &mut self,
        target: f64,
        steps: u32,
        suppressors: &[Arc<OverrideSignal>],
    ) -> bool {
        self.stepped_inner(target, steps, suppressors).await
    }

    async fn stepped_inner(
        &mut self,
        target: f64,
        steps: u32,
        suppressors: &[Arc<OverrideSignal>],
    ) -> bool {
        let steps = steps.max(1);
        let delta = target - self.current_angle;
        let step_size = delta / steps as f64;
        let total_time = delta.abs() * self.config.secs_per_degree;
        let step_delay = Duration::from_secs_f64(total_time / steps as f64);

        for _ in 0..steps {
            if suppressors.iter().any(|s| s.is_set()) {
                debug!(
                    actuator = %self.config.name,
                    angle = self.current_angle,
                    "stepped move interrupted by override"
                );
                return false;
            }
            self.current_angle = self.clamp(self.current_angle + step_size);
            self.driver.set_angle(self.config.channel, self.current_angle);
            tokio::time::sleep(step_delay).await;
        }

        self.current_angle = self.clamp(target);
        debug!(
            actuator = %self.config.name,
            target = self.current_angle,
            secs = total_time,
            "stepped move complete"
        );
        true
    }

    /// One rapid max/min swing, a half period per extreme.
    ///
    /// The caller loops this while its external condition (speech playback)
    /// is still running.
    pub async fn cycle_rapid_once(&mut self, half_period: Duration) {
        self.current_angle = self.config.max_angle;
        self.driver.set_angle(self.config.channel, self.current_angle);
        tokio::time::sleep(half_period).await;

        self.current_angle = self.config.min_angle;
        self.driver.set_angle(self.config.channel, self.current_angle);
        tokio::time::sleep(half_period).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RecordingDriver;

    fn test_config(name: &str) -> ActuatorConfig {
        ActuatorConfig {
            name: name.to_string(),
            channel: ServoChannel(0),
            min_angle: 0.0,
            max_angle: 100.0,
            pulse_min_us: 800,
            pulse_max_us: 2500,
            default_angle: 50.0,
            secs_per_degree: 0.32 / 60.0,
            settle_delay: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_config_validation() {
        let mut bad = test_config("pan");
        bad.min_angle = 120.0;
        assert!(bad.validate().is_err());

        let mut bad = test_config("pan");
        bad.pulse_min_us = 2500;
        bad.pulse_max_us = 800;
        assert!(bad.validate().is_err());

        let mut bad = test_config("pan");
        bad.default_angle = 150.0;
        assert!(bad.validate().is_err());

        assert!(test_config("pan").validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_to_clamps_out_of_range_target() {
        let driver = RecordingDriver::new();
        let mut act = Actuator::new(test_config("pan"), driver.clone()).unwrap();

        act.move_to(180.0).await;
        assert_eq!(act.current_angle(), 100.0);

        act.move_to(-20.0).await;
        assert_eq!(act.current_angle(), 0.0);

        assert_eq!(driver.writes_for(ServoChannel(0)), vec![100.0, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_stepped_even_increments() {
        let driver = RecordingDriver::new();
        let mut config = test_config("pan");
        config.default_angle = 0.0;
        let mut act = Actuator::new(config, driver.clone()).unwrap();

        act.move_stepped(30.0, 3).await;

        let writes = driver.writes_for(ServoChannel(0));
        assert_eq!(writes.len(), 3);
        for (i, angle) in writes.iter().enumerate() {
            assert!((angle - 10.0 * (i + 1) as f64).abs() < 1e-9);
        }
        assert_eq!(act.current_angle(), 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_stepped_duration_tracks_requested_delta() {
        let driver = RecordingDriver::new();
        let mut config = test_config("pan");
        config.default_angle = 0.0;
        config.secs_per_degree = 0.01;
        let mut act = Actuator::new(config, driver).unwrap();

        let start = tokio::time::Instant::now();
        act.move_stepped(60.0, 10).await;
        let elapsed = start.elapsed();

        // 60 degrees at 0.01 s/degree.
        let expected = Duration::from_secs_f64(0.6);
        assert!(elapsed >= expected);
        assert!(elapsed < expected + Duration::from_millis(70));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_stepped_clamps_but_times_unclamped_delta() {
        let driver = RecordingDriver::new();
        let mut config = test_config("pan");
        config.default_angle = 0.0;
        config.secs_per_degree = 0.01;
        let mut act = Actuator::new(config, driver.clone()).unwrap();

        let start = tokio::time::Instant::now();
        act.move_stepped(200.0, 4).await;
        let elapsed = start.elapsed();

        // Every observable angle stays in range and lands on the clamped target.
        assert_eq!(act.current_angle(), 100.0);
        assert!(driver
            .writes_for(ServoChannel(0))
            .iter()
            .all(|a| (0.0..=100.0).contains(a)));

        // Motion time still reflects the requested 200-degree delta.
        assert!(elapsed >= Duration::from_secs_f64(2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_move_stops_on_override() {
        let driver = RecordingDriver::new();
        let mut config = test_config("pan");
        config.default_angle = 0.0;
        let mut act = Actuator::new(config, driver.clone()).unwrap();

        let signal = Arc::new(OverrideSignal::new("tracking"));
        signal.set();

        let completed = act
            .move_stepped_guarded(80.0, 20, &[Arc::clone(&signal)])
            .await;

        // Raised before the first step: no write may be issued.
        assert!(!completed);
        assert!(driver.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_rapid_alternates_extremes() {
        let driver = RecordingDriver::new();
        let mut act = Actuator::new(test_config("mouth"), driver.clone()).unwrap();

        act.cycle_rapid_once(Duration::from_millis(100)).await;
        act.cycle_rapid_once(Duration::from_millis(100)).await;

        assert_eq!(
            driver.writes_for(ServoChannel(0)),
            vec![100.0, 0.0, 100.0, 0.0]
        );
    }
}
