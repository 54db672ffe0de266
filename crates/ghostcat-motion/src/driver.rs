//! Servo driver seam.
//!
//! The physical pulse-width driver is an external collaborator; the
//! controller only ever talks to the [`ServoDriver`] trait, so the real
//! board can be swapped for a logging or recording stand-in without
//! touching motion logic.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Hardware channel index on the servo board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServoChannel(pub u8);

impl fmt::Display for ServoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// A position-controlled servo output board.
///
/// Both calls are fire-and-forget: driver failures surface only at handle
/// acquisition, which the orchestrator retries.
pub trait ServoDriver: Send + Sync {
    /// Apply the safe pulse-width range for one channel.
    fn set_pulse_range(&self, channel: ServoChannel, min_us: u16, max_us: u16);

    /// Command one channel to the given angle in degrees.
    fn set_angle(&self, channel: ServoChannel, degrees: f64);
}

/// Driver that only logs writes, for bring-up without hardware attached.
#[derive(Debug, Default)]
pub struct TracingDriver;

impl ServoDriver for TracingDriver {
    fn set_pulse_range(&self, channel: ServoChannel, min_us: u16, max_us: u16) {
        debug!(%channel, min_us, max_us, "set pulse range");
    }

    fn set_angle(&self, channel: ServoChannel, degrees: f64) {
        debug!(%channel, degrees, "set angle");
    }
}

/// One recorded angle write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoWrite {
    pub channel: ServoChannel,
    pub degrees: f64,
}

/// Driver that records every write, used by tests to observe motion.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    writes: Mutex<Vec<ServoWrite>>,
    pulse_ranges: Mutex<Vec<(ServoChannel, u16, u16)>>,
}

impl RecordingDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All angle writes recorded so far.
    pub fn writes(&self) -> Vec<ServoWrite> {
        self.writes.lock().expect("writes lock").clone()
    }

    /// Angle writes recorded for one channel.
    pub fn writes_for(&self, channel: ServoChannel) -> Vec<f64> {
        self.writes()
            .into_iter()
            .filter(|w| w.channel == channel)
            .map(|w| w.degrees)
            .collect()
    }

    /// Pulse-range configurations recorded so far.
    pub fn pulse_ranges(&self) -> Vec<(ServoChannel, u16, u16)> {
        self.pulse_ranges.lock().expect("pulse lock").clone()
    }

    pub fn clear(&self) {
        self.writes.lock().expect("writes lock").clear();
    }
}

impl ServoDriver for RecordingDriver {
    fn set_pulse_range(&self, channel: ServoChannel, min_us: u16, max_us: u16) {
        self.pulse_ranges
            .lock()
            .expect("pulse lock")
            .push((channel, min_us, max_us));
    }

    fn set_angle(&self, channel: ServoChannel, degrees: f64) {
        self.writes
            .lock()
            .expect("writes lock")
            .push(ServoWrite { channel, degrees });
    }
}
