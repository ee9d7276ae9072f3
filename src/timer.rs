//! Periodic pulses driven by the frame delta.

use std::time::Duration;

/// Fires once every `interval` of accumulated time while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    interval: Duration,
    elapsed: Duration,
    active: bool,
}

impl Pulse {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            active: false,
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start from a fresh period.
    pub fn start(&mut self) {
        self.elapsed = Duration::ZERO;
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// New interval; the running period starts over.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        self.elapsed = Duration::ZERO;
    }

    /// Returns true when the pulse fires. A long frame fires at most once and
    /// the surplus carries into the next period, capped at one interval.
    pub fn update(&mut self, delta: Duration) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += delta;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = (self.elapsed - self.interval).min(self.interval);
        true
    }
}
