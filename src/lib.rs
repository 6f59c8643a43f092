pub mod analysis;
pub mod audio;
pub mod dsp;
pub mod error;
pub mod event;
pub mod scene; // Oscillator parameters and constraint propagation
pub mod synth; // Additive synthesis and presets
pub mod viz; // Frame-paced waveform / Lissajous pipeline

pub use error::{EngineError, EngineResult};

/// Length of the display window covered by the waveform sample grid,
/// in display units.
pub const WINDOW_LENGTH: f64 = 4.0 * std::f64::consts::PI;

/// How fast the visible waveform scrolls relative to real time.
/// A display convention, not a physical quantity.
pub const SCROLL_VELOCITY: f64 = 0.3;

/// Sample rates the audio pipeline accepts.
pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [22_050, 44_100];

/// Default sample rate for synthesis and analysis.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
