//! Offline DSP primitives used by the synthesizer and the analyzer.
//!
//! Unlike a realtime voice graph these run on the UI or worker thread over
//! whole buffers, so per-call allocation is acceptable. They stay focused on
//! the signal math; orchestration lives in `synth` and `analysis`.

/// ADSR applied over a fixed-duration buffer; anti-click fades.
pub mod envelope;
/// Five-tap decaying impulse-response reverb.
pub mod reverb;
/// Analysis windows and their coherent gains.
pub mod window;

pub use envelope::Adsr;
pub use window::WindowKind;

/// Peak-normalizes `buf` to `target` when its peak exceeds 1.0.
/// Returns the peak that was found.
pub fn normalize_peak(buf: &mut [f32], target: f32) -> f32 {
    let peak = buf.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 1.0 {
        let gain = target / peak;
        for sample in buf.iter_mut() {
            *sample *= gain;
        }
    }
    peak
}

/// Hard-clips every sample to `[-1, 1]`.
pub fn clip(buf: &mut [f32]) {
    for sample in buf.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}
