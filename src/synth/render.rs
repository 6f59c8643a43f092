//! The additive rendering pipeline.
//!
//! Pipeline order, fixed:
//!
//! 1. build the time grid `t[0 .. floor(sr * duration) - 1]`;
//! 2. per enabled partial: sine at the (possibly offset) frequency with the
//!    (possibly jittered) phase, plus the subharmonic for the first three;
//! 3. the partial's ADSR, or a 10 ms anti-click fade when envelopes are off;
//! 4. sum;
//! 5. peak-normalize to 0.9 when the sum exceeds unity;
//! 6. optional five-tap reverb, then re-normalize;
//! 7. clip to [-1, 1].
//!
//! Non-finite output anywhere is a `NumericOverflow`; the caller gets silence
//! of the requested length through [`Synthesizer::synthesize_or_silence`].

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::{trace, warn};

use crate::dsp::envelope::apply_anti_click;
use crate::dsp::reverb::apply_reverb;
use crate::dsp::{clip, normalize_peak, Adsr};
use crate::error::{EngineError, EngineResult};
use crate::synth::partial::{Effects, Partial};
use crate::DEFAULT_SAMPLE_RATE;

/// Cached primitive waveforms, FIFO-evicted.
const CACHE_CAP: usize = 100;

/// Seed base for the index-derived phase jitter generators.
const JITTER_SEED: u64 = 0x5348_4d4c;

/// Synthesis settings shared by all partials of a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: u32,
    pub envelope_enabled: bool,
    /// Default envelope for partials without an override.
    pub envelope: Adsr,
    pub reverb_enabled: bool,
    pub reverb_amount: f32,
    pub effects: Effects,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            envelope_enabled: true,
            envelope: Adsr::default(),
            reverb_enabled: false,
            reverb_amount: 0.3,
            effects: Effects::default(),
        }
    }
}

/// Primitive waveform families served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Sine,
    /// Major triad at 1 : 5/4 : 3/2.
    Chord,
    /// Two tones 4 Hz apart.
    Beat,
    /// First five members of the harmonic series, 1/n amplitudes.
    HarmonicSeries,
}

type CacheKey = (PrimitiveKind, i64, i64, i64, i64, u32);

/// Renders partial lists into mono f32 buffers.
pub struct Synthesizer {
    cache: VecDeque<(CacheKey, Arc<Vec<f32>>)>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self {
            cache: VecDeque::new(),
        }
    }

    /// Renders `partials` for `duration` seconds.
    pub fn synthesize(
        &self,
        partials: &[Partial],
        duration: f32,
        config: &SynthConfig,
    ) -> EngineResult<Vec<f32>> {
        let len = (config.sample_rate as f32 * duration).floor() as usize;
        if len == 0 || partials.iter().all(|p| !p.enabled) {
            return Err(EngineError::EmptyInput);
        }

        let mut sum = vec![0.0f32; len];
        let mut partial_buf = vec![0.0f32; len];
        let sr = config.sample_rate as f32;

        for (index, partial) in partials.iter().filter(|p| p.enabled).enumerate() {
            let frequency = effective_frequency(partial.frequency, index, &config.effects);
            let phase = effective_phase(partial.phase, index, &config.effects);
            let sub_gain = if index < 3 {
                config.effects.subharmonic.clamp(0.0, 1.0)
            } else {
                0.0
            };

            for (n, sample) in partial_buf.iter_mut().enumerate() {
                let t = n as f32 / sr;
                let mut value = partial.amplitude * (TAU * frequency * t + phase).sin();
                if sub_gain > 0.0 {
                    value += partial.amplitude
                        * sub_gain
                        * (TAU * (frequency / 2.0) * t + phase).sin();
                }
                *sample = value;
            }

            if config.envelope_enabled {
                let envelope = partial.envelope.unwrap_or(config.envelope);
                envelope.apply(&mut partial_buf, config.sample_rate);
            } else {
                apply_anti_click(&mut partial_buf, config.sample_rate);
            }

            for (acc, &s) in sum.iter_mut().zip(partial_buf.iter()) {
                *acc += s;
            }
        }

        if sum.iter().any(|s| !s.is_finite()) {
            return Err(EngineError::NumericOverflow { len });
        }

        normalize_peak(&mut sum, 0.9);

        if config.reverb_enabled && config.reverb_amount > 0.0 {
            sum = apply_reverb(&sum, config.sample_rate, config.reverb_amount);
            normalize_peak(&mut sum, 0.9);
        }

        clip(&mut sum);
        Ok(sum)
    }

    /// Like [`synthesize`](Self::synthesize) but recovers from numeric
    /// overflow with silence of the requested length, as the engine contract
    /// requires.
    pub fn synthesize_or_silence(
        &self,
        partials: &[Partial],
        duration: f32,
        config: &SynthConfig,
    ) -> EngineResult<Vec<f32>> {
        match self.synthesize(partials, duration, config) {
            Err(EngineError::NumericOverflow { len }) => {
                warn!(len, "synthesis overflowed, substituting silence");
                Ok(vec![0.0; len])
            }
            other => other,
        }
    }

    /// A cached primitive waveform: raw additive sum, no envelope or reverb.
    pub fn primitive(
        &mut self,
        kind: PrimitiveKind,
        frequency: f32,
        amplitude: f32,
        duration: f32,
        phase: f32,
        sample_rate: u32,
    ) -> Arc<Vec<f32>> {
        let key = (
            kind,
            (frequency * 10.0).round() as i64,
            (amplitude * 1000.0).round() as i64,
            (duration * 1000.0).round() as i64,
            (phase * 1000.0).round() as i64,
            sample_rate,
        );
        if let Some((_, cached)) = self.cache.iter().find(|(k, _)| *k == key) {
            return cached.clone();
        }

        let components = primitive_components(kind, frequency, amplitude, phase);
        let buffer = Arc::new(additive_sum(&components, duration, sample_rate));

        if self.cache.len() == CACHE_CAP {
            self.cache.pop_front();
            trace!("primitive cache full, evicting oldest");
        }
        self.cache.push_back((key, buffer.clone()));
        buffer
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain sum of sinusoids `(frequency, amplitude, phase)`: the reconstruction
/// primitive used by the analyzer. No envelopes, no reverb, no normalization.
pub fn additive_sum(components: &[(f32, f32, f32)], duration: f32, sample_rate: u32) -> Vec<f32> {
    let len = (sample_rate as f32 * duration).floor() as usize;
    let sr = sample_rate as f32;
    let mut out = vec![0.0f32; len];
    for &(frequency, amplitude, phase) in components {
        for (n, sample) in out.iter_mut().enumerate() {
            let t = n as f32 / sr;
            *sample += amplitude * (TAU * frequency * t + phase).sin();
        }
    }
    out
}

fn primitive_components(
    kind: PrimitiveKind,
    frequency: f32,
    amplitude: f32,
    phase: f32,
) -> Vec<(f32, f32, f32)> {
    match kind {
        PrimitiveKind::Sine => vec![(frequency, amplitude, phase)],
        PrimitiveKind::Chord => vec![
            (frequency, amplitude / 3.0, phase),
            (frequency * 1.25, amplitude / 3.0, phase),
            (frequency * 1.5, amplitude / 3.0, phase),
        ],
        PrimitiveKind::Beat => vec![
            (frequency, amplitude / 2.0, phase),
            (frequency + 4.0, amplitude / 2.0, phase),
        ],
        PrimitiveKind::HarmonicSeries => {
            let norm: f32 = (1..=5).map(|n| 1.0 / n as f32).sum();
            (1..=5)
                .map(|n| {
                    (
                        frequency * n as f32,
                        amplitude / (n as f32 * norm),
                        phase,
                    )
                })
                .collect()
        }
    }
}

fn effective_frequency(frequency: f32, index: usize, effects: &Effects) -> f32 {
    if index == 0 || effects.freq_offset == 0.0 {
        return frequency;
    }
    // Alternate the offset sign by index parity so detuned partials spread
    // around their nominal frequency instead of drifting one way.
    if index % 2 == 1 {
        frequency + effects.freq_offset
    } else {
        frequency - effects.freq_offset
    }
}

fn effective_phase(phase: f32, index: usize, effects: &Effects) -> f32 {
    let strength = effects.phase_rand.clamp(0.0, 1.0);
    if strength == 0.0 {
        return phase;
    }
    // Index-derived seed: reproducible across renders.
    let mut rng = Pcg32::seed_from_u64(JITTER_SEED ^ (index as u64));
    let offset = (rng.gen::<f32>() * 2.0 - 1.0) * PI * strength;
    phase + offset
}
