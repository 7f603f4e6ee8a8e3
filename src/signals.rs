use rand::Rng;

use crate::error::{MascotError, MascotResult};

// Lip-sync oscillator bank. Rates are angular rates in rad/ms, sampled at the
// raw frame timestamp; the sum is clamped so the signal is always a valid
// mouth opening.
pub const MOUTH_BASELINE: f64 = 0.4;
pub const MOUTH_SLOW_AMP: f64 = 0.3;
pub const MOUTH_SLOW_RATE: f64 = 0.01;
pub const MOUTH_FAST_AMP: f64 = 0.2;
pub const MOUTH_FAST_RATE: f64 = 0.03;
pub const MOUTH_DRIFT_AMP: f64 = 0.15;
pub const MOUTH_DRIFT_RATE: f64 = 0.005;
pub const MOUTH_DRIFT_WARP_RATE: f64 = 0.002;

/// Synthesized mouth opening in [0,1] while the avatar is speaking.
///
/// A weighted sum of a slow wave, a faster wave, and a phase-warped drift
/// term. This is a synthetic speech-like pattern, not an audio envelope.
pub fn mouth_openness(t_ms: f64) -> f64 {
    let slow = (t_ms * MOUTH_SLOW_RATE).sin() * MOUTH_SLOW_AMP;
    let fast = (t_ms * MOUTH_FAST_RATE).sin() * MOUTH_FAST_AMP;
    let drift = (t_ms * MOUTH_DRIFT_RATE + (t_ms * MOUTH_DRIFT_WARP_RATE).cos()).sin()
        * MOUTH_DRIFT_AMP;
    (MOUTH_BASELINE + slow + fast + drift).clamp(0.0, 1.0)
}

/// Blink timing parameters. The wait before each blink is re-randomized
/// uniformly in `[min_interval_ms, max_interval_ms)` after every blink.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct BlinkConfig {
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: f64,
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: f64,
    /// How long the eyes stay closed once a blink fires.
    #[serde(default = "default_hold")]
    pub hold_ms: f64,
}

fn default_min_interval() -> f64 {
    2000.0
}

fn default_max_interval() -> f64 {
    5000.0
}

fn default_hold() -> f64 {
    150.0
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval(),
            max_interval_ms: default_max_interval(),
            hold_ms: default_hold(),
        }
    }
}

impl BlinkConfig {
    pub fn validate(self) -> MascotResult<()> {
        if !self.min_interval_ms.is_finite() || self.min_interval_ms < 0.0 {
            return Err(MascotError::validation("blink min interval must be >= 0"));
        }
        if !(self.max_interval_ms > self.min_interval_ms) {
            return Err(MascotError::validation(
                "blink max interval must be > min interval",
            ));
        }
        if !(self.hold_ms > 0.0) {
            return Err(MascotError::validation("blink hold must be > 0"));
        }
        Ok(())
    }

    fn sample_wait(self, rng: &mut impl Rng) -> f64 {
        rng.random_range(self.min_interval_ms..self.max_interval_ms)
    }
}

#[derive(Clone, Copy, Debug)]
enum BlinkPhase {
    Waiting { until_ms: f64 },
    Closed { until_ms: f64 },
}

/// Self-perpetuating blink schedule.
///
/// Deadline-based rather than timer-based: `tick` advances the two-phase
/// machine to the supplied timestamp, so the caller's frame loop is the only
/// scheduler involved and dropping the schedule cancels it. Transitions are
/// anchored at their deadlines, which keeps the closed phase exactly
/// `hold_ms` long in simulated time even when ticks are sparse.
#[derive(Clone, Debug)]
pub struct BlinkSchedule {
    cfg: BlinkConfig,
    phase: BlinkPhase,
}

impl BlinkSchedule {
    pub fn new(cfg: BlinkConfig, now_ms: f64, rng: &mut impl Rng) -> MascotResult<Self> {
        cfg.validate()?;
        let wait = cfg.sample_wait(rng);
        Ok(Self {
            cfg,
            phase: BlinkPhase::Waiting {
                until_ms: now_ms + wait,
            },
        })
    }

    pub fn eyes_closed(&self) -> bool {
        matches!(self.phase, BlinkPhase::Closed { .. })
    }

    /// Advance to `now_ms` and report whether the eyes are closed.
    pub fn tick(&mut self, now_ms: f64, rng: &mut impl Rng) -> bool {
        loop {
            match self.phase {
                BlinkPhase::Waiting { until_ms } if now_ms >= until_ms => {
                    self.phase = BlinkPhase::Closed {
                        until_ms: until_ms + self.cfg.hold_ms,
                    };
                }
                BlinkPhase::Closed { until_ms } if now_ms >= until_ms => {
                    let wait = self.cfg.sample_wait(rng);
                    self.phase = BlinkPhase::Waiting {
                        until_ms: until_ms + wait,
                    };
                }
                _ => break,
            }
        }
        self.eyes_closed()
    }
}

// Idle-motion formulas. These are pure functions of the frame timestamp and
// carry no state; the compositor samples them directly each frame. Some
// features run off the timestamp in seconds, others in milliseconds,
// matching the uneven rates the scene was tuned with.

pub const FLOAT_RATE: f64 = 0.8;
pub const FLOAT_AMP: f64 = 4.0;

/// Vertical bobbing offset of the whole figure.
pub fn float_offset(t_ms: f64) -> f64 {
    (t_ms * 1e-3 * FLOAT_RATE).sin() * FLOAT_AMP
}

/// Alpha of the ground-shadow glow; pulses while speaking, steady otherwise.
pub fn shadow_glow_alpha(t_ms: f64, speaking: bool) -> f64 {
    if speaking {
        (t_ms * 0.003).sin().abs() * 0.3 + 0.2
    } else {
        0.3
    }
}

pub const PARTICLE_COUNT: usize = 15;

/// One ambient particle: offsets relative to the figure anchor, plus its
/// current size and glow alpha. Per-index rate spreads keep the field from
/// moving in lockstep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub dx: f64,
    pub dy: f64,
    pub size: f64,
    pub alpha: f64,
}

pub fn particle(i: usize, t_ms: f64) -> Particle {
    let s = t_ms * 1e-3;
    let i = i as f64;
    Particle {
        dx: (s * (0.3 + i * 0.05)).sin() * 80.0,
        dy: (s * (0.2 + i * 0.03)).cos() * 60.0,
        size: (s * (0.4 + i * 0.1)).sin() + 2.0,
        alpha: 0.4 + (s * (0.5 + i * 0.2)).sin() * 0.2,
    }
}

/// Radius of the chest energy-core glow; pulses faster while speaking.
pub fn core_pulse_radius(t_ms: f64, speaking: bool) -> f64 {
    if speaking {
        (t_ms * 0.005).sin() * 2.0 + 15.0
    } else {
        (t_ms * 0.002).sin() + 14.0
    }
}

/// Shoulder angles (radians) for the left and right arm sway.
pub fn arm_angles(t_ms: f64) -> (f64, f64) {
    let left = (t_ms * 0.001).sin() * 0.1 + 0.2;
    let right = (t_ms * 0.001 + 1.0).sin() * 0.1 - 0.2;
    (left, right)
}

/// Extra rotation of the forearm below the elbow joint.
pub fn forearm_sway(t_ms: f64) -> f64 {
    (t_ms * 0.002).sin() * 0.2
}

/// Radius of the palm glow shown while speaking.
pub fn hand_glow_radius(t_ms: f64) -> f64 {
    (t_ms * 0.004).sin() * 2.0 + 6.0
}

/// Shared antenna wobble term; each rod scales it differently.
pub fn antenna_wobble(t_ms: f64) -> f64 {
    (t_ms * 0.003).sin() * 3.0
}

/// Glow radius of one antenna tip, phase-shifted by its x offset.
pub fn antenna_tip_glow_radius(t_ms: f64, x_offset: f64) -> f64 {
    (t_ms * 0.01 + x_offset).sin() * 2.0 + 3.0
}

/// Pulse factor of one face data point, phase-shifted by its position.
pub fn data_point_pulse(t_ms: f64, x: f64, y: f64) -> f64 {
    (t_ms * 0.003 + x * y).sin() * 0.5 + 1.0
}

/// Horizontal phase of mouth waveform trace `i`; higher traces run faster.
pub fn wave_phase(t_ms: f64, i: usize) -> f64 {
    t_ms * 1e-3 * (5.0 + i as f64)
}
