//! Animation clock.
//!
//! Single-threaded cooperative pacing: the clock owns no timer and holds no
//! reference to the store. The host loop calls [`AnimationClock::tick`] at
//! its cadence and passes the returned virtual time to the engines. Between
//! ticks the engine yields to the host entirely, so a `pause()` always takes
//! effect before the next frame and an in-flight frame completes untouched.

use std::time::{Duration, Instant};

use crate::scene::params::SPEED_RANGE;

/// Design frame interval for the visualization scenes (about 83 fps).
pub const TARGET_FRAME_INTERVAL: Duration = Duration::from_millis(12);
/// Relaxed interval for audio-driven scenes.
pub const AUDIO_FRAME_INTERVAL: Duration = Duration::from_millis(25);

/// A stall longer than this many intervals drops frames instead of jumping
/// the animation forward.
const MAX_FRAME_FACTOR: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Paused,
    Running,
}

/// Advances a scene's virtual time from wall-clock deltas.
#[derive(Debug)]
pub struct AnimationClock {
    state: ClockState,
    virtual_time: f64,
    speed: f64,
    last_tick: Option<Instant>,
    interval: Duration,
}

impl AnimationClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: ClockState::Paused,
            virtual_time: 0.0,
            speed: 1.0,
            last_tick: None,
            interval,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running)
    }

    pub fn virtual_time(&self) -> f64 {
        self.virtual_time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
    }

    /// Transitions to Running. The wall-clock stamp is taken on the first
    /// tick, so no time elapses "during" the transition.
    pub fn play(&mut self) {
        self.state = ClockState::Running;
        self.last_tick = None;
    }

    pub fn pause(&mut self) {
        self.state = ClockState::Paused;
        self.last_tick = None;
    }

    pub fn toggle(&mut self) {
        match self.state {
            ClockState::Paused => self.play(),
            ClockState::Running => self.pause(),
        }
    }

    /// Sets virtual time back to exactly 0. The running state is preserved;
    /// trail clearing and the one-shot waveform refresh are the host's call.
    pub fn reset(&mut self) {
        self.virtual_time = 0.0;
        self.last_tick = None;
    }

    /// One frame: measures the wall-clock delta, advances virtual time by
    /// `delta * speed`, and returns the new virtual time. Returns `None`
    /// while paused. Virtual time is monotone within a run.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        if !self.is_running() {
            return None;
        }

        if let Some(last) = self.last_tick {
            let cap = self.interval * MAX_FRAME_FACTOR;
            let delta = now.saturating_duration_since(last).min(cap);
            self.virtual_time += delta.as_secs_f64() * self.speed;
        }
        self.last_tick = Some(now);
        Some(self.virtual_time)
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(TARGET_FRAME_INTERVAL)
    }
}
