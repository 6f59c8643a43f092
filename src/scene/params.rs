use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::scene::ratio::RatioPreset;

/// Legal range for oscillator amplitude.
pub const AMPLITUDE_RANGE: (f64, f64) = (0.0, 1.0);
/// Legal range for angular frequency in visualization scenes, rad per
/// display unit.
pub const OMEGA_RANGE: (f64, f64) = (0.1, 5.0);
/// Legal range for the clock's time-scaling factor.
pub const SPEED_RANGE: (f64, f64) = (0.1, 3.0);
/// Legal range for the Lissajous trail length, in samples.
pub const TRAIL_RANGE: (usize, usize) = (10, 200);

/// Parameters of a single sinusoidal oscillator.
///
/// Phase is stored canonically in `[0, 2pi)`; writes through the store reduce
/// modulo `2pi` before landing here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub amplitude: f64,
    /// Angular frequency, rad per display unit.
    pub omega: f64,
    /// Phase in `[0, 2pi)`.
    pub phase: f64,
    /// Damping coefficient used by the energy model. Zero for most scenes.
    pub damping: f64,
    pub enabled: bool,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            omega: 1.0,
            phase: 0.0,
            damping: 0.0,
            enabled: true,
        }
    }
}

impl OscillatorParams {
    /// Instantaneous displacement at time `t`, including damping.
    pub fn displacement(&self, t: f64) -> f64 {
        self.amplitude * (-self.damping * t).exp() * (self.omega * t + self.phase).sin()
    }
}

/// Which oscillator's frequency is held fixed when a ratio preset resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioMode {
    LockFirst,
    LockSecond,
    Free,
}

/// Optional hard coupling between the two lead oscillators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreqLock {
    None,
    /// Forces `omega2 = omega1` after every mutation (phase-composition scene).
    Equal,
}

/// Addresses one mutable scalar of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKey {
    Amplitude(usize),
    Omega(usize),
    Phase(usize),
    Damping(usize),
    Speed,
    TrailLength,
}

impl ParamKey {
    /// The oscillator this key addresses, if it is per-oscillator.
    pub fn oscillator(&self) -> Option<usize> {
        match *self {
            ParamKey::Amplitude(i)
            | ParamKey::Omega(i)
            | ParamKey::Phase(i)
            | ParamKey::Damping(i) => Some(i),
            ParamKey::Speed | ParamKey::TrailLength => None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ParamKey::Amplitude(_) => "amplitude",
            ParamKey::Omega(_) => "omega",
            ParamKey::Phase(_) => "phase",
            ParamKey::Damping(_) => "damping",
            ParamKey::Speed => "speed",
            ParamKey::TrailLength => "trail_length",
        }
    }
}

/// The top-level parameter record consumed by the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// At least two oscillators per scene.
    pub oscillators: Vec<OscillatorParams>,
    /// Time-scaling factor applied by the animation clock.
    pub speed: f64,
    /// Max retained trajectory samples for the Lissajous trail.
    pub trail_length: usize,
    pub ratio_mode: RatioMode,
    pub ratio_preset: RatioPreset,
    pub freq_lock: FreqLock,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            oscillators: vec![OscillatorParams::default(), OscillatorParams::default()],
            speed: 1.0,
            trail_length: 100,
            ratio_mode: RatioMode::LockFirst,
            ratio_preset: RatioPreset::Free,
            freq_lock: FreqLock::None,
        }
    }
}

impl Scene {
    /// A scene with `count` default oscillators (minimum two).
    pub fn with_oscillators(count: usize) -> Self {
        Self {
            oscillators: vec![OscillatorParams::default(); count.max(2)],
            ..Self::default()
        }
    }
}

/// Reduces an angle to the canonical range `[0, 2pi)`.
pub fn normalize_phase(phase: f64) -> f64 {
    let reduced = phase.rem_euclid(TAU);
    // rem_euclid can return exactly TAU when the input is a tiny negative
    // number, which would violate the half-open range.
    if reduced >= TAU {
        0.0
    } else {
        reduced
    }
}
