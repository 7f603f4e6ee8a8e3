use std::cell::Cell;
use std::time::Instant;

/// Source of the monotonic animation timestamp, in milliseconds.
///
/// Only deltas matter; the epoch is arbitrary. Injecting a [`ManualClock`]
/// makes session behavior (blink schedules, mouth motion) fully
/// deterministic under test.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Wall-clock source anchored at construction time.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for tests and offline frame sequencing.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn at(now_ms: f64) -> Self {
        Self {
            now: Cell::new(now_ms),
        }
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_by_delta() {
        let c = ManualClock::at(100.0);
        assert_eq!(c.now_ms(), 100.0);
        c.advance(16.0);
        assert_eq!(c.now_ms(), 116.0);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let c = MonotonicClock::new();
        let a = c.now_ms();
        let b = c.now_ms();
        assert!(b >= a);
    }
}
