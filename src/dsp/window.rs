//! Analysis windows.
//!
//! A window tapers the edges of an analysis frame to reduce spectral leakage.
//! The price is a per-window amplitude loss (the coherent gain); the analyzer
//! divides magnitudes by it so that a sinusoid's reported amplitude does not
//! depend on the window choice.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

/// Supported analysis windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    /// Default. Good leakage suppression, moderate main lobe.
    Hann,
    Hamming,
    /// Widest main lobe, lowest sidelobes. Used for beat reanalysis.
    Blackman,
}

impl WindowKind {
    /// Window coefficients for a frame of `len` samples.
    pub fn coefficients(self, len: usize) -> Vec<f32> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let denom = (len - 1) as f32;
        (0..len)
            .map(|i| {
                let x = i as f32 / denom;
                match self {
                    WindowKind::Hann => 0.5 * (1.0 - (TAU * x).cos()),
                    WindowKind::Hamming => 0.54 - 0.46 * (TAU * x).cos(),
                    WindowKind::Blackman => {
                        0.42 - 0.5 * (TAU * x).cos() + 0.08 * (2.0 * TAU * x).cos()
                    }
                }
            })
            .collect()
    }

    /// Mean of the window coefficients. Dividing a windowed magnitude by this
    /// recovers the unwindowed amplitude of a coherent sinusoid.
    pub fn coherent_gain(self, len: usize) -> f32 {
        if len == 0 {
            return 1.0;
        }
        let sum: f32 = self.coefficients(len).iter().sum();
        (sum / len as f32).max(f32::EPSILON)
    }
}
