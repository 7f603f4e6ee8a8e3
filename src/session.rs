use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{
    error::MascotResult,
    signals::{self, BlinkConfig, BlinkSchedule},
};

/// Host-side audio lifecycle notifications, folded into the speaking flag.
///
/// The session never touches audio or network concerns; the host converts
/// its playback element events into these and nothing more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Ended,
    Failed,
}

/// Mutable animation signals owned by one mounted avatar.
///
/// Recreated on mount, discarded on unmount; never persisted and never
/// shared between instances.
#[derive(Clone, Copy, Debug)]
pub struct AnimationState {
    /// Current mouth opening target in [0,1].
    pub mouth_openness: f64,
    pub eyes_closed: bool,
    pub speaking: bool,
    /// Timestamp of the most recent tick; only deltas are meaningful.
    pub t_ms: f64,
}

/// Inputs the compositor needs for one frame, validated at the boundary.
#[derive(Clone, Copy, Debug)]
pub struct FramePose {
    pub mouth_openness: f64,
    pub eyes_closed: bool,
    pub speaking: bool,
    pub t_ms: f64,
}

impl FramePose {
    /// Out-of-range values are clamped rather than rejected: a visual glitch
    /// beats a crash in a decorative subsystem.
    pub fn new(mouth_openness: f64, eyes_closed: bool, speaking: bool, t_ms: f64) -> Self {
        let mouth_openness = if mouth_openness.is_finite() {
            mouth_openness.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let t_ms = if t_ms.is_finite() { t_ms } else { 0.0 };
        Self {
            mouth_openness,
            eyes_closed,
            speaking,
            t_ms,
        }
    }
}

/// One avatar's animation session: an explicit, owned replacement for a
/// free-running frame loop with detached blink timers.
///
/// The host drives it with `tick(now)` once per display refresh; `stop()`
/// cancels everything at once. There is exactly one writer (the host's frame
/// callback) so no synchronization is involved.
#[derive(Clone, Debug)]
pub struct AvatarSession {
    state: AnimationState,
    blink: BlinkSchedule,
    rng: StdRng,
    running: bool,
    ticks: u64,
}

impl AvatarSession {
    pub fn start(cfg: BlinkConfig, seed: u64, now_ms: f64) -> MascotResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let blink = BlinkSchedule::new(cfg, now_ms, &mut rng)?;
        Ok(Self {
            state: AnimationState {
                mouth_openness: 0.0,
                eyes_closed: false,
                speaking: false,
                t_ms: now_ms,
            },
            blink,
            rng,
            running: true,
            ticks: 0,
        })
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of ticks applied so far; stops advancing after `stop()`.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn set_speaking(&mut self, speaking: bool) {
        if !self.running {
            return;
        }
        self.state.speaking = speaking;
        if !speaking {
            // Abrupt reset: the mouth snaps shut with no fade-out.
            self.state.mouth_openness = 0.0;
        }
    }

    pub fn handle_playback(&mut self, event: PlaybackEvent) {
        self.set_speaking(matches!(event, PlaybackEvent::Started));
    }

    /// Advance all signals to `now_ms` and emit the pose for this frame.
    ///
    /// Returns `None` once stopped: a cancelled session mutates nothing.
    pub fn tick(&mut self, now_ms: f64) -> Option<FramePose> {
        if !self.running {
            return None;
        }
        self.ticks += 1;
        self.state.t_ms = now_ms;
        self.state.eyes_closed = self.blink.tick(now_ms, &mut self.rng);
        self.state.mouth_openness = if self.state.speaking {
            signals::mouth_openness(now_ms)
        } else {
            0.0
        };
        Some(FramePose::new(
            self.state.mouth_openness,
            self.state.eyes_closed,
            self.state.speaking,
            now_ms,
        ))
    }

    /// Cancel the session. Subsequent ticks and speaking toggles are no-ops.
    pub fn stop(&mut self) {
        self.running = false;
    }
}
