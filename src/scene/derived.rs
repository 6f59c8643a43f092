//! Quantities derived from the scene: composite amplitude and phase of a
//! same-frequency sum, beat numbers, and the Lissajous period.
//!
//! All formulas operate on the first two oscillators, which is what every
//! teaching scene displays.

use std::f64::consts::TAU;

use crate::scene::params::Scene;
use crate::scene::ratio::reduced_ratio;

/// Derived view of the scene, recomputed whenever inputs change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedState {
    /// Amplitude of `A1 sin(wt + p1) + A2 sin(wt + p2)` for equal frequencies.
    pub composite_amplitude: f64,
    /// Phase of the same sum, radians.
    pub composite_phase: f64,
    /// `|w1 - w2| / 2pi`.
    pub beat_frequency: f64,
    /// `1 / beat_frequency`; infinite when the frequencies are equal.
    pub beat_period: f64,
    /// `(w1 + w2) / 4pi`.
    pub carrier_frequency: f64,
    /// Period of the closed Lissajous trajectory, `2pi * p / w1`.
    pub lissajous_period: f64,
}

impl DerivedState {
    pub fn from_scene(scene: &Scene) -> Self {
        let o1 = &scene.oscillators[0];
        let o2 = &scene.oscillators[1];
        let dp = o2.phase - o1.phase;

        // A = sqrt(A1^2 + A2^2 + 2 A1 A2 cos(dp)), clamped at zero against
        // rounding when the oscillators cancel exactly.
        let composite_amplitude = (o1.amplitude * o1.amplitude
            + o2.amplitude * o2.amplitude
            + 2.0 * o1.amplitude * o2.amplitude * dp.cos())
        .max(0.0)
        .sqrt();

        let composite_phase = o1.phase
            + (o2.amplitude * dp.sin()).atan2(o1.amplitude + o2.amplitude * dp.cos());

        let beat_frequency = (o1.omega - o2.omega).abs() / TAU;
        let beat_period = if beat_frequency > 0.0 {
            1.0 / beat_frequency
        } else {
            f64::INFINITY
        };

        let (p, _q) = reduced_ratio(o1.omega, o2.omega);

        Self {
            composite_amplitude,
            composite_phase,
            beat_frequency,
            beat_period,
            carrier_frequency: (o1.omega + o2.omega) / (2.0 * TAU),
            lissajous_period: TAU * p as f64 / o1.omega,
        }
    }
}
