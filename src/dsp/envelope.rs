//! ADSR over a fixed-duration buffer.
//!
//! The synthesizer renders complete notes, so the envelope is applied in one
//! pass over the rendered buffer rather than driven by a live gate:
//!
//! ```text
//! Level
//!   1.0 |    /\
//!       |   /  \__________
//!   S   |  /              \
//!       | /                \
//!   0.0 |/                  \   Time
//!        A    D    sustain  R
//! ```
//!
//! Attack ramps 0 -> 1, decay 1 -> sustain, sustain holds until
//! `duration - release`, release ramps sustain -> 0. All ramps are linear.
//! Segment boundaries are clamped so a short buffer degrades gracefully
//! instead of indexing past the end.

use serde::{Deserialize, Serialize};

use crate::MIN_TIME;

/// Duration of the linear fade applied when the envelope is disabled,
/// seconds. Kills the click at buffer edges.
pub const ANTI_CLICK_FADE: f32 = 0.010;

/// Attack / decay / sustain / release, all times in seconds,
/// sustain a level in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(MIN_TIME),
            decay: decay.max(MIN_TIME),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(MIN_TIME),
        }
    }

    /// Envelope level at time `t` within a note of length `duration`.
    pub fn level_at(&self, t: f32, duration: f32) -> f32 {
        let attack = self.attack.max(MIN_TIME);
        let decay = self.decay.max(MIN_TIME);
        let release_start = (duration - self.release).max(attack + decay);

        if t < 0.0 || t > duration {
            0.0
        } else if t < attack {
            t / attack
        } else if t < attack + decay {
            let progress = (t - attack) / decay;
            1.0 - (1.0 - self.sustain) * progress
        } else if t < release_start {
            self.sustain
        } else {
            let span = (duration - release_start).max(MIN_TIME);
            let progress = (t - release_start) / span;
            (self.sustain * (1.0 - progress)).max(0.0)
        }
    }

    /// Multiplies the envelope into a rendered note.
    pub fn apply(&self, buf: &mut [f32], sample_rate: u32) {
        let duration = buf.len() as f32 / sample_rate as f32;
        for (i, sample) in buf.iter_mut().enumerate() {
            let t = i as f32 / sample_rate as f32;
            *sample *= self.level_at(t, duration);
        }
    }
}

/// Linear 10 ms fade-in and fade-out, used when the envelope is disabled.
pub fn apply_anti_click(buf: &mut [f32], sample_rate: u32) {
    let fade = ((ANTI_CLICK_FADE * sample_rate as f32) as usize).min(buf.len() / 2);
    if fade == 0 {
        return;
    }
    let len = buf.len();
    for i in 0..fade {
        let gain = i as f32 / fade as f32;
        buf[i] *= gain;
        buf[len - 1 - i] *= gain;
    }
}
