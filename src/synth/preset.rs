//! The preset record: a named sound the synthesizer can render.
//!
//! Presets serialize as JSON. The on-disk shape mirrors the in-memory one;
//! out-of-range values are clamped on load rather than rejected, so an edited
//! file always produces something playable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::Adsr;
use crate::error::{EngineError, EngineResult};

use super::partial::{Effects, Partial, DURATION_RANGE};
use super::render::SynthConfig;

/// Envelope section of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSection {
    pub enabled: bool,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeSection {
    fn default() -> Self {
        let adsr = Adsr::default();
        Self {
            enabled: true,
            attack: adsr.attack,
            decay: adsr.decay,
            sustain: adsr.sustain,
            release: adsr.release,
        }
    }
}

/// Reverb section of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbSection {
    pub enabled: bool,
    /// Wet mix in `[0, 1]`.
    pub amount: f32,
}

impl Default for ReverbSection {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 0.3,
        }
    }
}

/// A complete, serializable sound definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub components: Vec<Partial>,
    /// Render length, seconds.
    pub duration: f32,
    #[serde(default)]
    pub envelope: EnvelopeSection,
    #[serde(default)]
    pub reverb: ReverbSection,
    #[serde(default)]
    pub effects: Effects,
    /// Set on the factory presets; user files never carry it.
    #[serde(skip)]
    pub builtin: bool,
}

impl Preset {
    /// A single-component preset with library defaults everywhere else.
    pub fn single(frequency: f32, amplitude: f32, duration: f32) -> Self {
        Self {
            components: vec![Partial::new(frequency, amplitude, 0.0)],
            duration,
            envelope: EnvelopeSection::default(),
            reverb: ReverbSection::default(),
            effects: Effects::default(),
            builtin: false,
        }
    }

    /// Clamps every field into its engine range.
    pub fn sanitize(&mut self) {
        for component in &mut self.components {
            *component = component.clamped();
        }
        self.duration = self.duration.clamp(DURATION_RANGE.0, DURATION_RANGE.1);
        self.reverb.amount = self.reverb.amount.clamp(0.0, 1.0);
        self.effects.phase_rand = self.effects.phase_rand.clamp(0.0, 1.0);
        self.effects.subharmonic = self.effects.subharmonic.clamp(0.0, 1.0);
        let adsr = Adsr::new(
            self.envelope.attack,
            self.envelope.decay,
            self.envelope.sustain,
            self.envelope.release,
        );
        self.envelope.attack = adsr.attack;
        self.envelope.decay = adsr.decay;
        self.envelope.sustain = adsr.sustain;
        self.envelope.release = adsr.release;
    }

    /// The render inputs this preset describes.
    pub fn render_plan(&self, sample_rate: u32) -> (Vec<Partial>, f32, SynthConfig) {
        let config = SynthConfig {
            sample_rate,
            envelope_enabled: self.envelope.enabled,
            envelope: Adsr::new(
                self.envelope.attack,
                self.envelope.decay,
                self.envelope.sustain,
                self.envelope.release,
            ),
            reverb_enabled: self.reverb.enabled,
            reverb_amount: self.reverb.amount,
            effects: self.effects,
        };
        (self.components.clone(), self.duration, config)
    }

    /// Parses a preset from JSON, clamping out-of-range values.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let mut preset: Preset = serde_json::from_str(json).map_err(EngineError::decode)?;
        if preset.components.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        preset.sanitize();
        debug!(components = preset.components.len(), "preset parsed");
        Ok(preset)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(EngineError::decode)
    }
}

/// The factory preset list, name first.
pub fn builtin_presets() -> Vec<(&'static str, Preset)> {
    let mark = |mut preset: Preset| {
        preset.builtin = true;
        preset
    };

    let octave = Preset {
        components: vec![
            Partial::new(220.0, 0.5, 0.0),
            Partial::new(440.0, 0.5, 0.0),
        ],
        ..Preset::single(220.0, 0.5, 1.5)
    };
    let fifth = Preset {
        components: vec![
            Partial::new(220.0, 0.5, 0.0),
            Partial::new(330.0, 0.5, 0.0),
        ],
        ..Preset::single(220.0, 0.5, 1.5)
    };
    let triad = Preset {
        components: vec![
            Partial::new(261.63, 1.0 / 3.0, 0.0),
            Partial::new(329.63, 1.0 / 3.0, 0.0),
            Partial::new(392.0, 1.0 / 3.0, 0.0),
        ],
        ..Preset::single(261.63, 0.5, 2.0)
    };
    let beat = Preset {
        components: vec![
            Partial::new(440.0, 0.5, 0.0),
            Partial::new(444.0, 0.5, 0.0),
        ],
        ..Preset::single(440.0, 0.5, 3.0)
    };
    let harmonics = Preset {
        components: (1..=5)
            .map(|n| Partial::new(220.0 * n as f32, 1.0 / n as f32, 0.0))
            .collect(),
        ..Preset::single(220.0, 0.5, 2.0)
    };

    vec![
        ("Pure tone", mark(Preset::single(440.0, 0.8, 1.5))),
        ("Octave", mark(octave)),
        ("Perfect fifth", mark(fifth)),
        ("Major chord", mark(triad)),
        ("Beat pair", mark(beat)),
        ("Harmonic series", mark(harmonics)),
    ]
}
