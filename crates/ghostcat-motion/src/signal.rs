//! Shared override signals.
//!
//! Ownership of an actuator channel is transferred by signal, not by lock:
//! the telemetry consumer raises the tracking signal before it starts
//! issuing writes, and idle generators re-check their suppressors at every
//! pattern and step boundary. The window between a signal transition and
//! the next generator poll is bounded by one in-flight step delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tracing::debug;

/// Boolean suppression flag plus its last transition time.
#[derive(Debug)]
pub struct OverrideSignal {
    name: &'static str,
    active: AtomicBool,
    changed_at: Mutex<Instant>,
}

impl OverrideSignal {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            active: AtomicBool::new(false),
            changed_at: Mutex::new(Instant::now()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raise the signal. Idempotent; only a transition updates the timestamp.
    pub fn set(&self) {
        if !self.active.swap(true, Ordering::SeqCst) {
            *self.changed_at.lock().expect("signal lock") = Instant::now();
            debug!(signal = self.name, "override raised");
        }
    }

    /// Clear the signal. Idempotent; only a transition updates the timestamp.
    pub fn clear(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            *self.changed_at.lock().expect("signal lock") = Instant::now();
            debug!(signal = self.name, "override cleared");
        }
    }

    pub fn is_set(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Instant of the most recent set/clear transition.
    pub fn last_change(&self) -> Instant {
        *self.changed_at.lock().expect("signal lock")
    }
}
