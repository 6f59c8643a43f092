//! The single-writer parameter store.
//!
//! Every mutation runs the same deterministic propagation sequence:
//!
//! 1. apply the incoming write, clamped to its declared range;
//! 2. if `freq_lock = Equal` and a frequency was written, copy it to the
//!    paired oscillator;
//! 3. if the write touched a ratio-coupled frequency while a preset holds,
//!    re-evaluate the paired frequency to keep the ratio, flipping the preset
//!    to `Free` when a range limit fires;
//! 4. reduce all phases to `[0, 2pi)`.
//!
//! Out-of-range writes are never fatal: the value is coerced and the coercion
//! is reported through a [`ClampReport`] side channel.

use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, Listeners};
use crate::scene::params::{
    normalize_phase, FreqLock, ParamKey, Scene, AMPLITUDE_RANGE, OMEGA_RANGE, SPEED_RANGE,
    TRAIL_RANGE,
};
use crate::scene::ratio::{resolve_preset, RatioPreset};
use crate::scene::{DerivedState, RatioMode};

/// One coerced write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampEntry {
    pub key: ParamKey,
    pub requested: f64,
    /// The value that landed. `NaN` when the write addressed an oscillator
    /// the scene does not have and nothing landed at all.
    pub applied: f64,
}

/// Side channel describing which writes in a mutation were coerced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClampReport {
    pub entries: Vec<ClampEntry>,
}

impl ClampReport {
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    /// Strict view: the first coercion as an error. Writes always land
    /// clamped either way; this is for callers that want to reject the
    /// user input instead of silently coercing it.
    pub fn strict(&self) -> EngineResult<()> {
        match self.entries.first() {
            None => Ok(()),
            Some(entry) => {
                let (min, max) = declared_range(entry.key);
                Err(EngineError::OutOfRange {
                    name: entry.key.name(),
                    value: entry.requested,
                    min,
                    max,
                })
            }
        }
    }

    fn record(&mut self, key: ParamKey, requested: f64, applied: f64) {
        if requested != applied {
            self.entries.push(ClampEntry {
                key,
                requested,
                applied,
            });
        }
    }
}

fn declared_range(key: ParamKey) -> (f64, f64) {
    match key {
        ParamKey::Amplitude(_) => AMPLITUDE_RANGE,
        ParamKey::Omega(_) => OMEGA_RANGE,
        // Phases are modular; a write there never clamps.
        ParamKey::Phase(_) => (0.0, std::f64::consts::TAU),
        ParamKey::Damping(_) => (0.0, f64::INFINITY),
        ParamKey::Speed => SPEED_RANGE,
        ParamKey::TrailLength => (TRAIL_RANGE.0 as f64, TRAIL_RANGE.1 as f64),
    }
}

/// Owns the scene and enforces its cross-parameter constraints.
pub struct ParameterStore {
    scene: Scene,
    defaults: Scene,
    listeners: Listeners,
}

impl ParameterStore {
    pub fn new(scene: Scene) -> Self {
        Self {
            defaults: scene.clone(),
            scene,
            listeners: Listeners::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Consistent snapshot of the scene. The store is the only writer, so a
    /// clone taken here never shows a torn mutation.
    pub fn scene(&self) -> Scene {
        self.scene.clone()
    }

    pub fn derived(&self) -> DerivedState {
        DerivedState::from_scene(&self.scene)
    }

    /// Reads one scalar. `None` when the key addresses an oscillator the
    /// scene does not have.
    pub fn get(&self, key: ParamKey) -> Option<f64> {
        if let Some(i) = key.oscillator() {
            if i >= self.scene.oscillators.len() {
                return None;
            }
        }
        Some(match key {
            ParamKey::Amplitude(i) => self.scene.oscillators[i].amplitude,
            ParamKey::Omega(i) => self.scene.oscillators[i].omega,
            ParamKey::Phase(i) => self.scene.oscillators[i].phase,
            ParamKey::Damping(i) => self.scene.oscillators[i].damping,
            ParamKey::Speed => self.scene.speed,
            ParamKey::TrailLength => self.scene.trail_length as f64,
        })
    }

    /// Applies one validated write and its constraint propagation. Emits a
    /// single `ParamsChanged` iff any value actually changed.
    pub fn set(&mut self, key: ParamKey, value: f64) -> ClampReport {
        self.set_many(&[(key, value)])
    }

    /// Atomic batch write: all writes land, then one notification fires.
    pub fn set_many(&mut self, writes: &[(ParamKey, f64)]) -> ClampReport {
        let before = self.scene.clone();
        let mut report = ClampReport::default();

        for &(key, value) in writes {
            self.apply_write(key, value, &mut report);
        }

        if self.scene != before {
            self.listeners.emit(&EngineEvent::ParamsChanged);
        }
        report
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        let Some(osc) = self.scene.oscillators.get_mut(index) else {
            warn!(index, "enable toggle addressed a missing oscillator, ignored");
            return;
        };
        if osc.enabled != enabled {
            osc.enabled = enabled;
            self.listeners.emit(&EngineEvent::ParamsChanged);
        }
    }

    pub fn set_ratio_mode(&mut self, mode: RatioMode) {
        if self.scene.ratio_mode != mode {
            self.scene.ratio_mode = mode;
            self.listeners.emit(&EngineEvent::ParamsChanged);
        }
    }

    /// Turning the lock on copies `omega1` onto `omega2` immediately so the
    /// invariant holds before the next write arrives.
    pub fn set_freq_lock(&mut self, lock: FreqLock) {
        let before = self.scene.clone();
        self.scene.freq_lock = lock;
        if lock == FreqLock::Equal {
            let w1 = self.scene.oscillators[0].omega;
            self.scene.oscillators[1].omega = w1;
        }
        if self.scene != before {
            self.listeners.emit(&EngineEvent::ParamsChanged);
        }
    }

    /// Resolves a ratio preset, holding one frequency per `ratio_mode`. On a
    /// range clamp the preset flips to `Free` and no `RatioChanged` fires.
    pub fn set_ratio_preset(&mut self, preset: RatioPreset) {
        let before = self.scene.clone();

        match preset {
            RatioPreset::Free => {
                self.scene.ratio_preset = RatioPreset::Free;
            }
            RatioPreset::Locked { p, q } => {
                let resolved = resolve_preset(&self.scene, p, q);
                self.scene.oscillators[0].omega = resolved.omega1;
                self.scene.oscillators[1].omega = resolved.omega2;
                self.scene.ratio_preset = if resolved.clamped {
                    debug!(p, q, "ratio preset clamped, falling back to free");
                    RatioPreset::Free
                } else {
                    preset
                };
            }
        }

        if self.scene != before {
            self.listeners.emit(&EngineEvent::ParamsChanged);
        }
        if self.scene.ratio_preset == preset && matches!(preset, RatioPreset::Locked { .. }) {
            self.listeners.emit(&EngineEvent::RatioChanged(preset));
        }
    }

    /// Restores declared defaults and emits one notification.
    pub fn reset(&mut self) {
        if self.scene != self.defaults {
            self.scene = self.defaults.clone();
            self.listeners.emit(&EngineEvent::ParamsChanged);
        }
    }

    fn apply_write(&mut self, key: ParamKey, value: f64, report: &mut ClampReport) {
        if let Some(i) = key.oscillator() {
            if i >= self.scene.oscillators.len() {
                // Nothing to write to; drop the write but leave a trace in
                // the report so the caller can surface it.
                warn!(?key, "write addressed a missing oscillator, ignored");
                report.entries.push(ClampEntry {
                    key,
                    requested: value,
                    applied: f64::NAN,
                });
                return;
            }
        }

        match key {
            ParamKey::Amplitude(i) => {
                let applied = value.clamp(AMPLITUDE_RANGE.0, AMPLITUDE_RANGE.1);
                report.record(key, value, applied);
                self.scene.oscillators[i].amplitude = applied;
            }
            ParamKey::Omega(i) => {
                let applied = value.clamp(OMEGA_RANGE.0, OMEGA_RANGE.1);
                report.record(key, value, applied);
                self.scene.oscillators[i].omega = applied;
                self.propagate_frequency(i);
            }
            ParamKey::Phase(i) => {
                // Phases are modular, not clamped.
                self.scene.oscillators[i].phase = normalize_phase(value);
            }
            ParamKey::Damping(i) => {
                let applied = value.max(0.0);
                report.record(key, value, applied);
                self.scene.oscillators[i].damping = applied;
            }
            ParamKey::Speed => {
                let applied = value.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
                report.record(key, value, applied);
                self.scene.speed = applied;
            }
            ParamKey::TrailLength => {
                let applied = value.round().clamp(TRAIL_RANGE.0 as f64, TRAIL_RANGE.1 as f64);
                report.record(key, value, applied);
                self.scene.trail_length = applied as usize;
            }
        }

        for osc in &mut self.scene.oscillators {
            osc.phase = normalize_phase(osc.phase);
        }
    }

    /// Steps 2 and 3 of the propagation order, run after a frequency write to
    /// oscillator `written`.
    fn propagate_frequency(&mut self, written: usize) {
        if written > 1 {
            return;
        }
        let other = 1 - written;

        if self.scene.freq_lock == FreqLock::Equal {
            self.scene.oscillators[other].omega = self.scene.oscillators[written].omega;
            return;
        }

        if let RatioPreset::Locked { p, q } = self.scene.ratio_preset {
            // Keep omega1 : omega2 = p : q by moving the paired oscillator.
            let (np, nq) = if written == 0 { (q, p) } else { (p, q) };
            let target = self.scene.oscillators[written].omega * np as f64 / nq as f64;
            let applied = target.clamp(OMEGA_RANGE.0, OMEGA_RANGE.1);
            self.scene.oscillators[other].omega = applied;
            if applied != target {
                self.scene.ratio_preset = RatioPreset::Free;
            }
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(Scene::default())
    }
}
