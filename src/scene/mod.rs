//! Oscillator parameter model and the store that owns it.
//!
//! The scene is mutated only through [`ParameterStore`]; every other engine
//! takes a read-only snapshot at the start of an operation. Constraint
//! propagation (frequency locks, ratio presets, phase canonicalization) runs
//! in a fixed order on every write so that derived views stay consistent.

/// Derived quantities recomputed from the scene on demand.
pub mod derived;
/// `OscillatorParams`, `Scene`, ranges and defaults.
pub mod params;
/// Reduced frequency ratios and the named ratio presets.
pub mod ratio;
/// The single-writer parameter store.
pub mod store;

pub use derived::DerivedState;
pub use params::{FreqLock, OscillatorParams, ParamKey, RatioMode, Scene};
pub use ratio::{reduced_ratio, RatioPreset, RATIO_PRESETS};
pub use store::{ClampReport, ParameterStore};
