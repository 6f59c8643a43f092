//! Per-frame waveform computation.
//!
//! The engine owns a fixed sample grid `tau[0..N-1]` spanning one display
//! window. For a playback time `t` it emits, per oscillator,
//!
//! ```text
//! x_i(tau) = A_i * sin(w_i * (wrap(tau - v t) + p_i))
//! ```
//!
//! where `v` is the display scroll velocity and `wrap` keeps the argument
//! inside the window. The sample at the grid midpoint is the reference-line
//! intercept; consumers take that value from the emitted buffer so markers
//! stay on the drawn curve.
//!
//! Buffers are reused across frames. A second buffer set backs the optional
//! next-frame predictor: `predict(t_next)` fills it during idle time and a
//! matching `tick` swaps it in without recomputing.

use crate::scene::params::Scene;
use crate::{SCROLL_VELOCITY, WINDOW_LENGTH};

/// Minimum emitted samples per visible cycle before the engine oversamples
/// internally.
const MIN_SAMPLES_PER_CYCLE: f64 = 8.0;

/// Grid configuration, fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct WaveformConfig {
    /// Emitted grid length. Clamped to `[300, 1000]` on construction.
    pub grid_len: usize,
    /// Window span in display units.
    pub window: f64,
    /// Emit the +/- beat envelope pair for the first two oscillators.
    pub beat_envelope: bool,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            grid_len: 600,
            window: WINDOW_LENGTH,
            beat_envelope: false,
        }
    }
}

/// One emitted frame. All slices have the engine's grid length.
#[derive(Debug, Clone)]
pub struct WaveformFrame {
    time: f64,
    waves: Vec<Vec<f64>>,
    composite: Vec<f64>,
    intercepts: Vec<f64>,
    composite_intercept: f64,
    beat_upper: Vec<f64>,
    beat_lower: Vec<f64>,
}

impl WaveformFrame {
    fn empty(oscillators: usize, grid_len: usize) -> Self {
        Self {
            time: f64::NAN,
            waves: vec![vec![0.0; grid_len]; oscillators],
            composite: vec![0.0; grid_len],
            intercepts: vec![0.0; oscillators],
            composite_intercept: 0.0,
            beat_upper: Vec::new(),
            beat_lower: Vec::new(),
        }
    }

    /// Playback time this frame was computed for.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn wave(&self, oscillator: usize) -> &[f64] {
        &self.waves[oscillator]
    }

    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// The pointwise sum of all enabled oscillators.
    pub fn composite(&self) -> &[f64] {
        &self.composite
    }

    /// Reference-line intercept of one oscillator: the sampled value at the
    /// grid midpoint, not a recomputation.
    pub fn intercept(&self, oscillator: usize) -> f64 {
        self.intercepts[oscillator]
    }

    pub fn composite_intercept(&self) -> f64 {
        self.composite_intercept
    }

    /// The beat envelope pair, when the scene asked for it.
    pub fn beat_envelope(&self) -> Option<(&[f64], &[f64])> {
        if self.beat_upper.is_empty() {
            None
        } else {
            Some((&self.beat_upper, &self.beat_lower))
        }
    }
}

/// Produces per-frame waveform data from scene snapshots.
pub struct WaveformEngine {
    config: WaveformConfig,
    grid: Vec<f64>,
    front: WaveformFrame,
    back: WaveformFrame,
    predicted_time: Option<f64>,
    dirty: bool,
    scratch: Vec<f64>,
}

impl WaveformEngine {
    pub fn new(config: WaveformConfig, oscillators: usize) -> Self {
        let config = WaveformConfig {
            grid_len: config.grid_len.clamp(300, 1000),
            ..config
        };
        let grid: Vec<f64> = (0..config.grid_len)
            .map(|i| config.window * i as f64 / (config.grid_len - 1) as f64)
            .collect();
        Self {
            front: WaveformFrame::empty(oscillators, config.grid_len),
            back: WaveformFrame::empty(oscillators, config.grid_len),
            predicted_time: None,
            dirty: true,
            scratch: Vec::new(),
            grid,
            config,
        }
    }

    /// The sampling grid. Read-only; its length never changes during a run.
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }

    /// The most recently emitted frame.
    pub fn frame(&self) -> &WaveformFrame {
        &self.front
    }

    /// Invalidates any cached shape and pending prediction. Call on every
    /// `params_changed`; recompute immediately (even while paused) so a
    /// static display reflects the new parameters.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.predicted_time = None;
    }

    /// Computes the frame for playback time `t`. Consumes a matching
    /// prediction instead of recomputing when parameters did not change.
    pub fn tick(&mut self, scene: &Scene, t: f64) -> &WaveformFrame {
        let use_prediction = !self.dirty
            && self
                .predicted_time
                .is_some_and(|predicted| (predicted - t).abs() < 1e-9);

        if use_prediction {
            std::mem::swap(&mut self.front, &mut self.back);
        } else {
            let mut frame = std::mem::replace(
                &mut self.front,
                WaveformFrame::empty(0, 0),
            );
            self.compute_into(&mut frame, scene, t);
            self.front = frame;
        }
        self.predicted_time = None;
        self.dirty = false;
        &self.front
    }

    /// Fills the spare buffer set for `t_next` so the next `tick` returns
    /// instantly. Call during idle time after a frame was delivered.
    pub fn predict(&mut self, scene: &Scene, t_next: f64) {
        let mut frame = std::mem::replace(&mut self.back, WaveformFrame::empty(0, 0));
        self.compute_into(&mut frame, scene, t_next);
        self.back = frame;
        self.predicted_time = Some(t_next);
    }

    fn compute_into(&mut self, frame: &mut WaveformFrame, scene: &Scene, t: f64) {
        let n = self.config.grid_len;
        let count = scene.oscillators.len();

        frame.time = t;
        frame.waves.resize_with(count, || vec![0.0; n]);
        for wave in &mut frame.waves {
            wave.resize(n, 0.0);
        }
        frame.composite.resize(n, 0.0);
        frame.composite.fill(0.0);
        frame.intercepts.resize(count, 0.0);

        let factor = self.oversample_factor(scene);

        for (i, osc) in scene.oscillators.iter().enumerate() {
            let wave = &mut frame.waves[i];
            if !osc.enabled {
                wave.fill(0.0);
                continue;
            }

            if factor == 1 {
                for (k, &tau) in self.grid.iter().enumerate() {
                    let u = (tau - SCROLL_VELOCITY * t).rem_euclid(self.config.window);
                    wave[k] = osc.amplitude * (osc.omega * (u + osc.phase)).sin();
                }
            } else {
                // Compute on a denser internal grid, then decimate to N by
                // emitting the minimum and the maximum of each bucket as a
                // pair of adjacent output samples, so every bucket's full
                // excursion survives.
                let dense = n * factor;
                self.scratch.resize(dense, 0.0);
                for k in 0..dense {
                    let tau = self.config.window * k as f64 / (dense - 1) as f64;
                    let u = (tau - SCROLL_VELOCITY * t).rem_euclid(self.config.window);
                    self.scratch[k] = osc.amplitude * (osc.omega * (u + osc.phase)).sin();
                }
                let mut k = 0;
                while k + 1 < n {
                    let bucket = &self.scratch[k * factor..(k + 2) * factor];
                    wave[k] = bucket.iter().copied().fold(f64::INFINITY, f64::min);
                    wave[k + 1] = bucket.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    k += 2;
                }
                if k < n {
                    // Odd grid length: the last sample keeps its own bucket.
                    let bucket = &self.scratch[k * factor..];
                    wave[k] = bucket.iter().copied().fold(f64::INFINITY, f64::min);
                }
            }

            for (sum, &sample) in frame.composite.iter_mut().zip(wave.iter()) {
                *sum += sample;
            }
        }

        let mid = n / 2;
        for (i, wave) in frame.waves.iter().enumerate() {
            frame.intercepts[i] = wave[mid];
        }
        frame.composite_intercept = frame.composite[mid];

        if self.config.beat_envelope && count >= 2 {
            self.compute_beat_envelope(frame, scene, t);
        } else {
            frame.beat_upper.clear();
            frame.beat_lower.clear();
        }
    }

    fn compute_beat_envelope(&self, frame: &mut WaveformFrame, scene: &Scene, t: f64) {
        let n = self.config.grid_len;
        let o1 = &scene.oscillators[0];
        let o2 = &scene.oscillators[1];

        frame.beat_upper.resize(n, 0.0);
        frame.beat_lower.resize(n, 0.0);

        for (k, &tau) in self.grid.iter().enumerate() {
            let u = (tau - SCROLL_VELOCITY * t).rem_euclid(self.config.window);
            // Envelope of the emitted composite: the phase difference of the
            // two drawn arguments, so the envelope hugs the drawn beat.
            let dphi = o1.omega * (u + o1.phase) - o2.omega * (u + o2.phase);
            let env = (o1.amplitude * o1.amplitude
                + o2.amplitude * o2.amplitude
                + 2.0 * o1.amplitude * o2.amplitude * dphi.cos())
            .max(0.0)
            .sqrt();
            frame.beat_upper[k] = env;
            frame.beat_lower[k] = -env;
        }
    }

    fn oversample_factor(&self, scene: &Scene) -> usize {
        let max_omega = scene
            .oscillators
            .iter()
            .filter(|o| o.enabled)
            .map(|o| o.omega)
            .fold(0.0f64, f64::max);
        if max_omega <= 0.0 {
            return 1;
        }
        let samples_per_cycle =
            std::f64::consts::TAU * self.config.grid_len as f64 / (max_omega * self.config.window);
        if samples_per_cycle >= MIN_SAMPLES_PER_CYCLE {
            1
        } else {
            (MIN_SAMPLES_PER_CYCLE / samples_per_cycle).ceil() as usize
        }
    }
}
