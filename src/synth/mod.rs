//! Additive synthesis.
//!
//! A sound is a list of sinusoidal partials. Rendering builds each partial on
//! a shared time grid, applies its envelope and the per-partial effects,
//! sums, normalizes, and optionally runs the multi-tap reverb. Everything is
//! deterministic: the phase jitter draws from a generator seeded by the
//! partial index, so the same inputs always produce the same buffer.

/// `Partial` and the effect modifier configuration.
pub mod partial;
/// The preset record and built-in presets.
pub mod preset;
/// The rendering pipeline and primitive-waveform cache.
pub mod render;

pub use partial::{Effects, Partial, DURATION_RANGE, FREQ_RANGE};
pub use preset::{builtin_presets, Preset};
pub use render::{additive_sum, PrimitiveKind, SynthConfig, Synthesizer};
