use serde::{Deserialize, Serialize};

use crate::dsp::Adsr;

/// Legal audio frequency range, Hz.
pub const FREQ_RANGE: (f32, f32) = (20.0, 5000.0);
/// Legal preset duration range, seconds.
pub const DURATION_RANGE: (f32, f32) = (0.5, 3.0);

/// One sinusoidal component of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partial {
    /// Frequency, Hz.
    pub frequency: f32,
    pub amplitude: f32,
    /// Phase, radians.
    pub phase: f32,
    pub enabled: bool,
    /// Per-partial envelope override. `None` uses the synth config's
    /// envelope settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Adsr>,
}

impl Partial {
    pub fn new(frequency: f32, amplitude: f32, phase: f32) -> Self {
        Self {
            frequency,
            amplitude,
            phase,
            enabled: true,
            envelope: None,
        }
    }

    /// Clamps frequency and amplitude into their engine ranges.
    pub fn clamped(mut self) -> Self {
        self.frequency = self.frequency.clamp(FREQ_RANGE.0, FREQ_RANGE.1);
        self.amplitude = self.amplitude.clamp(0.0, 1.0);
        self
    }
}

/// Per-partial effect modifiers, all deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    /// Frequency offset in Hz applied to partials with index >= 1,
    /// alternating sign by index parity.
    pub freq_offset: f32,
    /// Phase jitter strength in `[0, 1]`: each partial gets a uniform offset
    /// in `[-pi * strength, pi * strength]` from an index-seeded generator.
    pub phase_rand: f32,
    /// Subharmonic strength in `[0, 1]`: the first three partials gain a
    /// component at half their frequency.
    pub subharmonic: f32,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            freq_offset: 0.0,
            phase_rand: 0.0,
            subharmonic: 0.0,
        }
    }
}

impl Effects {
    pub fn is_neutral(&self) -> bool {
        self.freq_offset == 0.0 && self.phase_rand == 0.0 && self.subharmonic == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_respects_engine_ranges() {
        let partial = Partial::new(10_000.0, 1.5, 0.0).clamped();
        assert_eq!(partial.frequency, FREQ_RANGE.1);
        assert_eq!(partial.amplitude, 1.0);

        let low = Partial::new(5.0, -0.5, 0.0).clamped();
        assert_eq!(low.frequency, FREQ_RANGE.0);
        assert_eq!(low.amplitude, 0.0);
    }
}
