//! Reduced frequency ratios and the named ratio presets.
//!
//! Frequency ratios are rationalized by scaling both angular frequencies by
//! 100, rounding to integers and reducing by GCD. The scale bounds how fine a
//! ratio the engine will treat as rational; anything finer is display noise.

use serde::{Deserialize, Serialize};

use crate::scene::params::{RatioMode, Scene, OMEGA_RANGE};

/// Integer scale applied to angular frequencies before the GCD.
pub const RATIO_SCALE: f64 = 100.0;

/// The named presets offered by the teaching front-ends, as `(p, q)` with
/// `omega1 : omega2 = p : q`.
pub const RATIO_PRESETS: [(u32, u32); 6] = [(1, 1), (1, 2), (2, 3), (3, 4), (3, 5), (4, 5)];

/// A frequency-ratio preset. `Free` means the oscillators are uncoupled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioPreset {
    Free,
    Locked { p: u32, q: u32 },
}

impl RatioPreset {
    /// Parses a preset label such as `"2:3"`. Returns `None` for anything
    /// that is not one of the named presets.
    pub fn from_label(label: &str) -> Option<Self> {
        if label == "free" {
            return Some(Self::Free);
        }
        let (p, q) = label.split_once(':')?;
        let pair = (p.parse().ok()?, q.parse().ok()?);
        RATIO_PRESETS
            .contains(&pair)
            .then_some(Self::Locked { p: pair.0, q: pair.1 })
    }

    pub fn label(&self) -> String {
        match self {
            Self::Free => "free".to_string(),
            Self::Locked { p, q } => format!("{p}:{q}"),
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

/// The reduced integer ratio `(p, q)` of two angular frequencies.
pub fn reduced_ratio(omega1: f64, omega2: f64) -> (u64, u64) {
    let a = (omega1.abs() * RATIO_SCALE).round().max(1.0) as u64;
    let b = (omega2.abs() * RATIO_SCALE).round().max(1.0) as u64;
    let d = gcd(a, b);
    (a / d, b / d)
}

/// Outcome of resolving a ratio preset against the current scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioResolution {
    pub omega1: f64,
    pub omega2: f64,
    /// True when the dependent frequency hit a range limit. The preset flips
    /// to `Free` in that case.
    pub clamped: bool,
}

/// Computes the `(omega1, omega2)` pair that realizes preset `(p, q)`,
/// holding one oscillator fixed per `ratio_mode`.
///
/// `RatioMode::Free` resolves like `LockFirst`: the first oscillator is the
/// reference in the teaching flow.
pub fn resolve_preset(scene: &Scene, p: u32, q: u32) -> RatioResolution {
    let (lo, hi) = OMEGA_RANGE;
    let w1 = scene.oscillators[0].omega;
    let w2 = scene.oscillators[1].omega;

    match scene.ratio_mode {
        RatioMode::LockSecond => {
            // omega1 : omega2 = p : q with omega2 held.
            let target = w2 * p as f64 / q as f64;
            let clamped = target.clamp(lo, hi);
            RatioResolution {
                omega1: clamped,
                omega2: w2,
                clamped: clamped != target,
            }
        }
        RatioMode::LockFirst | RatioMode::Free => {
            let target = w1 * q as f64 / p as f64;
            let clamped = target.clamp(lo, hi);
            RatioResolution {
                omega1: w1,
                omega2: clamped,
                clamped: clamped != target,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_scaled_frequencies() {
        assert_eq!(reduced_ratio(1.0, 2.0), (1, 2));
        assert_eq!(reduced_ratio(1.5, 2.5), (3, 5));
        assert_eq!(reduced_ratio(0.6, 1.0), (3, 5));
        assert_eq!(reduced_ratio(2.0, 2.0), (1, 1));
    }

    #[test]
    fn label_round_trip() {
        for (p, q) in RATIO_PRESETS {
            let preset = RatioPreset::Locked { p, q };
            assert_eq!(RatioPreset::from_label(&preset.label()), Some(preset));
        }
        assert_eq!(RatioPreset::from_label("free"), Some(RatioPreset::Free));
        assert_eq!(RatioPreset::from_label("7:9"), None);
        assert_eq!(RatioPreset::from_label("nonsense"), None);
    }

    #[test]
    fn lock_second_moves_first_oscillator() {
        let mut scene = Scene::default();
        scene.ratio_mode = RatioMode::LockSecond;
        scene.oscillators[0].omega = 1.0;
        scene.oscillators[1].omega = 1.0;

        let resolved = resolve_preset(&scene, 3, 5);
        assert!((resolved.omega1 - 0.6).abs() < 1e-12);
        assert_eq!(resolved.omega2, 1.0);
        assert!(!resolved.clamped);
    }

    #[test]
    fn clamping_is_reported() {
        let mut scene = Scene::default();
        scene.ratio_mode = RatioMode::LockFirst;
        scene.oscillators[0].omega = 4.0;

        // 4.0 * 2 = 8.0 exceeds the legal range.
        let resolved = resolve_preset(&scene, 1, 2);
        assert!(resolved.clamped);
        assert_eq!(resolved.omega2, OMEGA_RANGE.1);
    }
}
