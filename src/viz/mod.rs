//! The frame-paced visualization pipeline.
//!
//! The host event loop owns the cadence: each frame it ticks the
//! [`AnimationClock`], feeds the returned virtual time to the
//! [`WaveformEngine`], and hands the emitted frame to whatever renderer is
//! attached. The engines emit plain arrays; no drawing happens here.
//!
//! Cursor-on-curve invariance: every consumer that needs "the value of the
//! wave right now" (the Lissajous cursor, beat-panel markers) reads the
//! reference-line intercept out of the emitted frame rather than recomputing
//! `A sin(wt + p)`. The two differ by the aliasing of the scroll offset, and
//! a recomputed dot drifts off the drawn curve.

/// Time-based frame pacing: play/pause/reset, speed scaling, drop policy.
pub mod clock;
/// Closed trajectories for rational frequency ratios.
pub mod lissajous;
/// Per-frame component waves, composite, intercepts, beat envelope.
pub mod waveform;

pub use clock::{AnimationClock, ClockState};
pub use lissajous::{LissajousEngine, Trajectory};
pub use waveform::{WaveformConfig, WaveformEngine, WaveformFrame};
