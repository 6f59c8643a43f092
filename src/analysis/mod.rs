//! Spectral analysis: FFT, peak picking, and decomposition of a recorded
//! buffer into a small set of dominant sinusoidal partials.
//!
//! Large transforms can run on a worker thread through [`job`] so the UI
//! never blocks on an FFT; results come back as a pollable future with
//! progress and cooperative cancellation.

/// Worker-thread analysis jobs.
pub mod job;
/// Peak picking, beat-aware reanalysis, decompose and reconstruct.
pub mod peaks;
/// Windowed, zero-padded forward FFT.
pub mod spectrum;

pub use job::{spawn_decompose, AnalysisJob};
pub use peaks::{
    reconstruct, AnalysisOptions, AnalysisOutcome, AnalyzedPartial, Peak, PeakOptions,
};
pub use spectrum::{SpectralAnalyzer, Spectrum, SpectrumOptions};
