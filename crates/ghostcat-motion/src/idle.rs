//! Randomized idle motion generation.
//!
//! One generator runs per actuator and keeps the head alive with
//! "natural" motion whenever no override owns the channel. Generators for
//! different actuators are independent tasks and never block one another.

use std::sync::Arc;
use std::time::Duration;

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::actuator::SharedActuator;
use crate::signal::OverrideSignal;

/// One idle motion shape, chosen uniformly at random per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPattern {
    /// Repeated full sweeps between the range extremes.
    Oscillation,
    /// Park at one extreme for a while.
    Hold,
    /// A short run of small offsets around the current angle.
    SmallVariation,
}

impl MotionPattern {
    const ALL: [MotionPattern; 3] = [
        MotionPattern::Oscillation,
        MotionPattern::Hold,
        MotionPattern::SmallVariation,
    ];
}

/// Tunable ranges for idle pattern generation. Pairs are inclusive bounds.
#[derive(Debug, Clone)]
pub struct IdleParams {
    /// Re-poll interval while suppressed.
    pub suppressed_poll: Duration,
    /// Sweep count per oscillation cycle.
    pub oscillation_repeats: (u32, u32),
    /// Step count per oscillation sweep.
    pub oscillation_steps: (u32, u32),
    /// Pause between oscillation sweeps, milliseconds.
    pub oscillation_pause_ms: (u64, u64),
    /// Pause at a hold extreme, milliseconds.
    pub hold_pause_ms: (u64, u64),
    /// Move count per small-variation cycle.
    pub variation_repeats: (u32, u32),
    /// Largest offset from the current angle, degrees.
    pub variation_delta: f64,
    /// Step count per small-variation move.
    pub variation_steps: (u32, u32),
    /// Pause between small-variation moves, milliseconds.
    pub variation_pause_ms: (u64, u64),
}

impl Default for IdleParams {
    fn default() -> Self {
        Self {
            suppressed_poll: Duration::from_millis(100),
            oscillation_repeats: (2, 5),
            oscillation_steps: (10, 30),
            oscillation_pause_ms: (500, 1500),
            hold_pause_ms: (2000, 5000),
            variation_repeats: (3, 6),
            variation_delta: 10.0,
            variation_steps: (5, 15),
            variation_pause_ms: (200, 500),
        }
    }
}

/// Unending randomized motion for one actuator, gated by its suppressors.
pub struct IdleMotionGenerator {
    actuator: SharedActuator,
    suppressors: Vec<Arc<OverrideSignal>>,
    params: IdleParams,
    rng: StdRng,
}

impl IdleMotionGenerator {
    /// The random source is injected so tests can seed it for
    /// deterministic pattern sequences.
    pub fn new(
        actuator: SharedActuator,
        suppressors: Vec<Arc<OverrideSignal>>,
        params: IdleParams,
        rng: StdRng,
    ) -> Self {
        Self {
            actuator,
            suppressors,
            params,
            rng,
        }
    }

    /// Run until the shutdown signal flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let name = self.actuator.lock().await.name().to_string();
        debug!(actuator = %name, "idle motion generator started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = self.tick() => {}
            }
        }

        debug!(actuator = %name, "idle motion generator stopped");
    }

    fn suppressed(&self) -> bool {
        self.suppressors.iter().any(|s| s.is_set())
    }

    /// One idle cycle: park while suppressed, otherwise run one pattern.
    async fn tick(&mut self) {
        if self.suppressed() {
            tokio::time::sleep(self.params.suppressed_poll).await;
            return;
        }

        let pattern = MotionPattern::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(MotionPattern::Hold);
        trace!(?pattern, "idle pattern chosen");

        match pattern {
            MotionPattern::Oscillation => self.oscillation().await,
            MotionPattern::Hold => self.hold().await,
            MotionPattern::SmallVariation => self.small_variation().await,
        }
    }

    async fn oscillation(&mut self) {
        let (lo, hi) = self.params.oscillation_repeats;
        let repeats = self.rng.random_range(lo..=hi);

        for _ in 0..repeats {
            for extreme_is_max in [true, false] {
                if self.suppressed() {
                    return;
                }
                let (lo, hi) = self.params.oscillation_steps;
                let steps = self.rng.random_range(lo..=hi);

                let completed = {
                    let mut act = self.actuator.lock().await;
                    let target = if extreme_is_max {
                        act.max_angle()
                    } else {
                        act.min_angle()
                    };
                    act.move_stepped_guarded(target, steps, &self.suppressors)
                        .await
                };
                if !completed {
                    return;
                }

                self.pause(self.params.oscillation_pause_ms).await;
            }
        }
    }

    async fn hold(&mut self) {
        {
            let mut act = self.actuator.lock().await;
            let target = if self.rng.random_bool(0.5) {
                act.max_angle()
            } else {
                act.min_angle()
            };
            act.move_to(target).await;
        }
        self.pause(self.params.hold_pause_ms).await;
    }

    async fn small_variation(&mut self) {
        let (lo, hi) = self.params.variation_repeats;
        let repeats = self.rng.random_range(lo..=hi);

        for _ in 0..repeats {
            if self.suppressed() {
                return;
            }
            let delta = self
                .rng
                .random_range(-self.params.variation_delta..=self.params.variation_delta);
            let (lo, hi) = self.params.variation_steps;
            let steps = self.rng.random_range(lo..=hi);

            let completed = {
                let mut act = self.actuator.lock().await;
                let target = act.current_angle() + delta;
                act.move_stepped_guarded(target, steps, &self.suppressors)
                    .await
            };
            if !completed {
                return;
            }

            self.pause(self.params.variation_pause_ms).await;
        }
    }

    async fn pause(&mut self, range_ms: (u64, u64)) {
        let ms = self.rng.random_range(range_ms.0..=range_ms.1);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
