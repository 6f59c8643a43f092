//! Peak picking and sinusoidal decomposition.
//!
//! Two close tones leak into each other's bins, so a single pass with the
//! default window can merge a beat pair into one hump. The analyzer therefore
//! runs a second, higher-resolution pass (Blackman window, 4x zero-padding,
//! tighter spacing) whenever the two strongest candidates sit within 20 Hz,
//! and reports a matched pair within 10 Hz as a probable beat.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::WindowKind;
use crate::error::EngineResult;
use crate::synth::additive_sum;

use super::spectrum::{SpectralAnalyzer, Spectrum, SpectrumOptions};

/// Bins below this frequency are never peaks (DC hum, window smear).
const MIN_PEAK_HZ: f32 = 20.0;
/// Candidate spacing that triggers the high-resolution reanalysis.
const BEAT_SUSPECT_HZ: f32 = 20.0;
/// Final spacing reported as a probable beat.
const BEAT_REPORT_HZ: f32 = 10.0;

/// Peak-picking knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakOptions {
    /// Keep bins whose magnitude is at least this fraction of the maximum.
    pub threshold_ratio: f32,
    /// Minimum spacing between returned peaks, Hz.
    pub min_distance_hz: f32,
    /// Return at most this many peaks, strongest first.
    pub max_peaks: usize,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.1,
            min_distance_hz: 10.0,
            max_peaks: 8,
        }
    }
}

/// One spectral peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub frequency: f32,
    pub magnitude: f32,
    pub phase: f32,
    pub bin: usize,
}

/// One decomposed sinusoidal component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedPartial {
    pub frequency: f32,
    pub amplitude: f32,
    /// Raw FFT bin phase at the peak. Approximate for frequencies that do
    /// not align with a bin center.
    pub phase: f32,
    pub enabled: bool,
}

/// Full decomposition settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub window: WindowKind,
    pub zero_padding: usize,
    pub peaks: PeakOptions,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            window: WindowKind::Hann,
            zero_padding: 2,
            peaks: PeakOptions::default(),
        }
    }
}

/// Decomposition result.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// Dominant components, strongest first.
    pub partials: Vec<AnalyzedPartial>,
    /// `|f1 - f2|` when the two strongest components form a beat pair.
    pub probable_beat_hz: Option<f32>,
}

/// Local maxima above the threshold, strongest first, before any spacing
/// suppression. The beat heuristic needs to see merged neighbors that the
/// suppression would hide.
fn candidates(spectrum: &Spectrum, threshold_ratio: f32) -> Vec<Peak> {
    let max_mag = spectrum.mags.iter().fold(0.0f32, |m, &v| m.max(v));
    if max_mag <= 0.0 {
        return Vec::new();
    }
    let threshold = max_mag * threshold_ratio;

    let mut found = Vec::new();
    for k in 1..spectrum.len().saturating_sub(1) {
        if spectrum.freqs[k] < MIN_PEAK_HZ {
            continue;
        }
        let mag = spectrum.mags[k];
        if mag >= threshold && mag >= spectrum.mags[k - 1] && mag > spectrum.mags[k + 1] {
            found.push(Peak {
                frequency: spectrum.freqs[k],
                magnitude: mag,
                phase: spectrum.phases[k],
                bin: k,
            });
        }
    }
    found.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    found
}

/// Greedy spacing suppression: walk candidates strongest-first and keep each
/// one that clears `min_distance_hz` from everything already kept.
fn suppress(candidates: &[Peak], min_distance_hz: f32, max_peaks: usize) -> Vec<Peak> {
    let mut kept: Vec<Peak> = Vec::new();
    for peak in candidates {
        if kept.len() == max_peaks {
            break;
        }
        if kept
            .iter()
            .all(|k| (k.frequency - peak.frequency).abs() >= min_distance_hz)
        {
            kept.push(*peak);
        }
    }
    kept
}

/// Picks the dominant peaks of a spectrum.
pub fn pick_peaks(spectrum: &Spectrum, options: &PeakOptions) -> Vec<Peak> {
    suppress(
        &candidates(spectrum, options.threshold_ratio),
        options.min_distance_hz,
        options.max_peaks,
    )
}

impl SpectralAnalyzer {
    /// Decomposes a buffer into its dominant sinusoidal components.
    pub fn decompose(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        options: &AnalysisOptions,
    ) -> EngineResult<AnalysisOutcome> {
        let spectrum = self.analyze(
            samples,
            sample_rate,
            &SpectrumOptions {
                window: options.window,
                zero_padding: options.zero_padding,
            },
        )?;
        let first_pass = candidates(&spectrum, options.peaks.threshold_ratio);

        let beat_suspected = matches!(
            first_pass.as_slice(),
            [a, b, ..] if (a.frequency - b.frequency).abs() < BEAT_SUSPECT_HZ
        );

        let peaks = if beat_suspected {
            debug!("close pair suspected, rerunning at high resolution");
            let fine = self.analyze(
                samples,
                sample_rate,
                &SpectrumOptions {
                    window: WindowKind::Blackman,
                    zero_padding: 4,
                },
            )?;
            let fine_options = PeakOptions {
                min_distance_hz: 2.0,
                ..options.peaks
            };
            pick_peaks(&fine, &fine_options)
        } else {
            suppress(
                &first_pass,
                options.peaks.min_distance_hz,
                options.peaks.max_peaks,
            )
        };

        let probable_beat_hz = match peaks.as_slice() {
            [a, b, ..] => {
                let gap = (a.frequency - b.frequency).abs();
                (gap < BEAT_REPORT_HZ).then_some(gap)
            }
            _ => None,
        };

        Ok(AnalysisOutcome {
            partials: peaks
                .iter()
                .map(|p| AnalyzedPartial {
                    frequency: p.frequency,
                    amplitude: p.magnitude,
                    phase: p.phase,
                    enabled: true,
                })
                .collect(),
            probable_beat_hz,
        })
    }
}

/// Rebuilds an approximation of the analyzed signal: the plain additive sum
/// of the enabled partials, no envelopes, no reverb.
pub fn reconstruct(partials: &[AnalyzedPartial], duration: f32, sample_rate: u32) -> Vec<f32> {
    let components: Vec<(f32, f32, f32)> = partials
        .iter()
        .filter(|p| p.enabled)
        .map(|p| (p.frequency, p.amplitude, p.phase))
        .collect();
    additive_sum(&components, duration, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22_050;

    fn decompose(buf: &[f32], options: &AnalysisOptions) -> AnalysisOutcome {
        SpectralAnalyzer::new()
            .decompose(buf, SR, options)
            .unwrap()
    }

    #[test]
    fn pure_tone_yields_one_dominant_partial() {
        let buf = additive_sum(&[(440.0, 0.8, 0.0)], 1.0, SR);
        let outcome = decompose(&buf, &AnalysisOptions::default());

        assert!(!outcome.partials.is_empty());
        let lead = outcome.partials[0];
        assert!((lead.frequency - 440.0).abs() < 1.0, "f = {}", lead.frequency);
        assert!((lead.amplitude - 0.8).abs() < 0.04, "a = {}", lead.amplitude);
        assert_eq!(outcome.probable_beat_hz, None);

        // Nothing else within an order of magnitude.
        for extra in &outcome.partials[1..] {
            assert!(extra.amplitude < lead.amplitude * 0.2);
        }
    }

    #[test]
    fn triad_components_are_all_found() {
        let third = 1.0f32 / 3.0;
        let truth = [(261.63, third, 0.0), (329.63, third, 0.0), (392.0, third, 0.0)];
        let buf = additive_sum(&truth, 1.0, SR);

        let mut options = AnalysisOptions::default();
        options.peaks.max_peaks = 5;
        let outcome = decompose(&buf, &options);

        for (freq, _, _) in truth {
            assert!(
                outcome
                    .partials
                    .iter()
                    .any(|p| (p.frequency - freq).abs() < 5.0),
                "missing {freq} Hz in {:?}",
                outcome.partials
            );
        }
    }

    #[test]
    fn beat_pair_resolves_through_reanalysis() {
        let buf = additive_sum(&[(440.0, 0.5, 0.0), (447.0, 0.5, 0.0)], 1.0, SR);
        let outcome = decompose(&buf, &AnalysisOptions::default());

        assert!(outcome.partials.len() >= 2, "got {:?}", outcome.partials);
        let mut freqs: Vec<f32> = outcome.partials[..2].iter().map(|p| p.frequency).collect();
        freqs.sort_by(f32::total_cmp);
        assert!((freqs[0] - 440.0).abs() < 2.0, "low {}", freqs[0]);
        assert!((freqs[1] - 447.0).abs() < 2.0, "high {}", freqs[1]);

        let beat = outcome.probable_beat_hz.expect("beat should be reported");
        assert!((beat - 7.0).abs() < 2.0, "beat {beat}");
    }

    #[test]
    fn sub_20_hz_bins_are_never_peaks() {
        // A slow wobble plus a real tone; the wobble is louder.
        let buf = additive_sum(&[(5.0, 1.0, 0.0), (440.0, 0.3, 0.0)], 1.0, SR);
        let mut options = AnalysisOptions::default();
        // The tone sits below the default 10% of the wobble's peak.
        options.peaks.threshold_ratio = 0.05;
        let outcome = decompose(&buf, &options);

        assert!(outcome.partials.iter().all(|p| p.frequency >= 20.0));
        assert!(outcome
            .partials
            .iter()
            .any(|p| (p.frequency - 440.0).abs() < 1.0));
    }

    #[test]
    fn suppression_keeps_strongest_of_close_pair() {
        let peaks = [
            Peak {
                frequency: 440.0,
                magnitude: 1.0,
                phase: 0.0,
                bin: 440,
            },
            Peak {
                frequency: 444.0,
                magnitude: 0.8,
                phase: 0.0,
                bin: 444,
            },
            Peak {
                frequency: 880.0,
                magnitude: 0.5,
                phase: 0.0,
                bin: 880,
            },
        ];
        let kept = suppress(&peaks, 10.0, 8);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].frequency, 440.0);
        assert_eq!(kept[1].frequency, 880.0);
    }

    #[test]
    fn reconstruction_preserves_the_dominant_tone() {
        let buf = additive_sum(&[(440.0, 0.8, 0.0)], 1.0, SR);
        let outcome = decompose(&buf, &AnalysisOptions::default());
        let rebuilt = reconstruct(&outcome.partials, 1.0, SR);

        let outcome2 = decompose(&rebuilt, &AnalysisOptions::default());
        let lead = outcome2.partials[0];
        assert!((lead.frequency - 440.0).abs() < 1.0);
        assert!((lead.amplitude - 0.8).abs() < 0.08);
    }

    #[test]
    fn disabled_partials_do_not_reconstruct() {
        let partials = [
            AnalyzedPartial {
                frequency: 440.0,
                amplitude: 0.5,
                phase: 0.0,
                enabled: false,
            },
        ];
        let rebuilt = reconstruct(&partials, 0.5, SR);
        assert!(rebuilt.iter().all(|&s| s == 0.0));
    }
}
