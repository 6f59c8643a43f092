//! Closed Lissajous trajectories.
//!
//! For a rational frequency ratio `w1 : w2 = p : q` the curve
//! `(A1 sin(w1 t + p1), A2 sin(w2 t + p2))` closes after `T = 2 pi p / w1`.
//! The engine samples one full period and caches the result; the moving
//! cursor is fed from the waveform engine's intercepts so it stays on the
//! drawn curve.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use crate::scene::params::Scene;
use crate::scene::ratio::reduced_ratio;
use crate::viz::waveform::WaveformFrame;

/// Bounds for the per-trajectory sample count `M = 5 (p + q)`.
const MIN_POINTS: usize = 500;
const MAX_POINTS: usize = 2000;

/// Cached trajectories, FIFO-evicted.
const CACHE_CAP: usize = 20;

/// One closed trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Period `2 pi p / w1` of the closed curve.
    pub period: f64,
    /// Reduced ratio this curve was built for.
    pub ratio: (u64, u64),
}

/// Cache key: the six shape parameters rounded to 1e-3.
type TrajectoryKey = [i64; 6];

fn key_for(scene: &Scene) -> TrajectoryKey {
    let o1 = &scene.oscillators[0];
    let o2 = &scene.oscillators[1];
    let round = |v: f64| (v * 1000.0).round() as i64;
    [
        round(o1.amplitude),
        round(o2.amplitude),
        round(o1.omega),
        round(o2.omega),
        round(o1.phase),
        round(o2.phase),
    ]
}

/// Produces closed X/Y trajectories and maintains the cursor trail.
pub struct LissajousEngine {
    cache: VecDeque<(TrajectoryKey, Arc<Trajectory>)>,
    trail: VecDeque<(f64, f64)>,
    trail_cap: usize,
}

impl LissajousEngine {
    pub fn new(trail_cap: usize) -> Self {
        Self {
            cache: VecDeque::new(),
            trail: VecDeque::new(),
            trail_cap: trail_cap.clamp(10, 200),
        }
    }

    /// The closed trajectory for the scene's first two oscillators.
    pub fn trajectory(&mut self, scene: &Scene) -> Arc<Trajectory> {
        let key = key_for(scene);
        if let Some((_, cached)) = self.cache.iter().find(|(k, _)| *k == key) {
            return cached.clone();
        }

        let trajectory = Arc::new(compute_trajectory(scene));
        if self.cache.len() == CACHE_CAP {
            if let Some((evicted_key, _)) = self.cache.pop_front() {
                trace!(?evicted_key, "lissajous cache full, evicting oldest");
            }
        }
        self.cache.push_back((key, trajectory.clone()));
        trajectory
    }

    /// The current-point cursor, read from the waveform frame's intercepts
    /// rather than recomputed (cursor-on-curve invariance).
    pub fn cursor(frame: &WaveformFrame) -> (f64, f64) {
        (frame.intercept(0), frame.intercept(1))
    }

    /// Appends a cursor point to the trail, dropping the oldest beyond the
    /// configured length.
    pub fn push_trail(&mut self, point: (f64, f64)) {
        if self.trail.len() == self.trail_cap {
            self.trail.pop_front();
        }
        self.trail.push_back(point);
    }

    pub fn trail(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.trail.iter()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Clears the trail. Call on every parameter change: a trail spanning two
    /// different curves draws misleading wiggles.
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    pub fn set_trail_length(&mut self, cap: usize) {
        self.trail_cap = cap.clamp(10, 200);
        while self.trail.len() > self.trail_cap {
            self.trail.pop_front();
        }
    }
}

impl Default for LissajousEngine {
    fn default() -> Self {
        Self::new(100)
    }
}

fn compute_trajectory(scene: &Scene) -> Trajectory {
    let o1 = &scene.oscillators[0];
    let o2 = &scene.oscillators[1];
    let (p, q) = reduced_ratio(o1.omega, o2.omega);

    let period = std::f64::consts::TAU * p as f64 / o1.omega;
    let points = (5 * (p + q) as usize).clamp(MIN_POINTS, MAX_POINTS);

    let mut xs = Vec::with_capacity(points);
    let mut ys = Vec::with_capacity(points);
    for k in 0..points {
        let t = period * k as f64 / (points - 1) as f64;
        xs.push(o1.amplitude * (o1.omega * t + o1.phase).sin());
        ys.push(o2.amplitude * (o2.omega * t + o2.phase).sin());
    }

    Trajectory {
        xs,
        ys,
        period,
        ratio: (p, q),
    }
}
