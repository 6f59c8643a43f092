//! Windowed forward FFT.
//!
//! Amplitude convention: for a sinusoid `A sin(2 pi f t)` whose frequency
//! lands on a bin, the reported magnitude at that bin is `A`. That takes two
//! corrections on top of the raw transform: the 2/N single-sided scale
//! (energy is split between the positive and negative bins, except at DC and
//! Nyquist, which have no mirror) and division by the window's coherent gain
//! so the window choice does not change reported amplitudes. `N` is the
//! unwindowed sample count; zero-padding refines the frequency grid but does
//! not add energy.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::dsp::WindowKind;
use crate::error::{EngineError, EngineResult};

/// Zero-padding factors the analyzer accepts.
pub const ZERO_PAD_FACTORS: [usize; 3] = [1, 2, 4];

/// Transform settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumOptions {
    pub window: WindowKind,
    /// One of [`ZERO_PAD_FACTORS`]; anything else is snapped to the nearest.
    pub zero_padding: usize,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            window: WindowKind::Hann,
            zero_padding: 1,
        }
    }
}

/// Single-sided amplitude spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Bin center frequencies, Hz.
    pub freqs: Vec<f32>,
    /// Sinusoid amplitudes per bin (see module docs for the convention).
    pub mags: Vec<f32>,
    /// Raw bin phases, radians.
    pub phases: Vec<f32>,
    /// Bin spacing, Hz.
    pub resolution: f32,
    pub sample_rate: u32,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }
}

/// Owns the FFT planner so repeated transforms reuse their plans.
pub struct SpectralAnalyzer {
    planner: FftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Transforms `samples` into a single-sided amplitude spectrum.
    pub fn analyze(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        options: &SpectrumOptions,
    ) -> EngineResult<Spectrum> {
        if samples.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let n = samples.len();
        let zero_padding = snap_zero_padding(options.zero_padding);
        let padded = n * zero_padding;

        let window = options.window.coefficients(n);
        let coherent_gain = options.window.coherent_gain(n);

        let mut scratch: Vec<Complex<f32>> = Vec::with_capacity(padded);
        scratch.extend(
            samples
                .iter()
                .zip(window.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0)),
        );
        scratch.resize(padded, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(padded);
        fft.process(&mut scratch);

        let half = padded / 2;
        let mut freqs = Vec::with_capacity(half + 1);
        let mut mags = Vec::with_capacity(half + 1);
        let mut phases = Vec::with_capacity(half + 1);
        let resolution = sample_rate as f32 / padded as f32;
        let base_scale = 1.0 / (n as f32 * coherent_gain);

        for (k, bin) in scratch.iter().take(half + 1).enumerate() {
            // No factor 2 at DC and Nyquist: those bins have no mirror image.
            let factor = if k == 0 || (padded % 2 == 0 && k == half) {
                1.0
            } else {
                2.0
            };
            freqs.push(k as f32 * resolution);
            mags.push(bin.norm() * factor * base_scale);
            phases.push(bin.arg());
        }

        Ok(Spectrum {
            freqs,
            mags,
            phases,
            resolution,
            sample_rate,
        })
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn snap_zero_padding(requested: usize) -> usize {
    ZERO_PAD_FACTORS
        .iter()
        .copied()
        .min_by_key(|factor| factor.abs_diff(requested))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::additive_sum;

    const SR: u32 = 22_050;

    fn peak_bin(spectrum: &Spectrum) -> usize {
        spectrum
            .mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut analyzer = SpectralAnalyzer::new();
        assert!(matches!(
            analyzer.analyze(&[], SR, &SpectrumOptions::default()),
            Err(EngineError::EmptyInput)
        ));
    }

    #[test]
    fn bin_aligned_tone_recovers_frequency_and_amplitude() {
        let mut analyzer = SpectralAnalyzer::new();
        let buf = additive_sum(&[(441.0, 0.8, 0.0)], 1.0, SR);

        for window in [WindowKind::Hann, WindowKind::Hamming, WindowKind::Blackman] {
            let options = SpectrumOptions {
                window,
                zero_padding: 1,
            };
            let spectrum = analyzer.analyze(&buf, SR, &options).unwrap();
            let k = peak_bin(&spectrum);
            assert!((spectrum.freqs[k] - 441.0).abs() <= spectrum.resolution / 2.0);
            assert!(
                (spectrum.mags[k] - 0.8).abs() < 0.04,
                "{window:?}: amplitude {}",
                spectrum.mags[k]
            );
        }
    }

    #[test]
    fn zero_padding_refines_the_grid_without_gaining_energy() {
        let mut analyzer = SpectralAnalyzer::new();
        let buf = additive_sum(&[(441.0, 0.5, 0.0)], 1.0, SR);

        let coarse = analyzer
            .analyze(&buf, SR, &SpectrumOptions::default())
            .unwrap();
        let fine = analyzer
            .analyze(
                &buf,
                SR,
                &SpectrumOptions {
                    window: WindowKind::Hann,
                    zero_padding: 4,
                },
            )
            .unwrap();

        assert!((fine.resolution - coarse.resolution / 4.0).abs() < 1e-6);
        let k = peak_bin(&fine);
        assert!((fine.mags[k] - 0.5).abs() < 0.03);
    }

    #[test]
    fn odd_zero_padding_snaps_to_supported_factor() {
        assert_eq!(snap_zero_padding(0), 1);
        assert_eq!(snap_zero_padding(3), 2);
        assert_eq!(snap_zero_padding(100), 4);
    }

    #[test]
    fn dc_offset_lands_in_bin_zero_without_doubling() {
        let mut analyzer = SpectralAnalyzer::new();
        let buf = vec![0.25f32; SR as usize];
        let spectrum = analyzer
            .analyze(&buf, SR, &SpectrumOptions::default())
            .unwrap();
        assert!((spectrum.mags[0] - 0.25).abs() < 0.01);
    }
}
