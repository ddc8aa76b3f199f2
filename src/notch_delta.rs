use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::warn;

use crate::lattice::Topology;
use crate::types::{LatticeFeatures, SimulationParams, HILL_EXPONENT, TIME_STEP};

pub const BOUNDARY_COLOR: [u8; 3] = [128, 128, 128];
const LOW_SIGNAL_COLOR: [u8; 3] = [128, 0, 128];
const HIGH_SIGNAL_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSnapshot {
    pub position: [f32; 2],
    pub is_boundary: bool,
    pub notch: f32,
    pub delta: f32,
    pub notch_signal: f32,
}

pub struct NotchDeltaField {
    topology: Topology,
    notch: Vec<f32>,
    delta: Vec<f32>,
    signal: Vec<f32>,
    next_notch: Vec<f32>,
    next_delta: Vec<f32>,
    next_signal: Vec<f32>,
    rng: StdRng,
    time: f32,
    steps: u64,
    last_flux: f32,
}

impl NotchDeltaField {
    /// Boundary cells start at `N = 1, D = 0`; interior cells get
    /// `N = 1 +- 0.1` and `D` uniform in `[0, 1)`. The initial signal field is
    /// then derived from those values with `params`.
    pub fn new(topology: Topology, params: &SimulationParams, mut rng: StdRng) -> Self {
        let len = topology.len();
        let mut notch = vec![1.0; len];
        let mut delta = vec![0.0; len];

        for idx in 0..len {
            if !topology.is_boundary(idx) {
                notch[idx] = 1.0 + rng.random_range(-0.1..0.1);
                delta[idx] = rng.random_range(0.0..1.0);
            }
        }

        let mut field = Self {
            topology,
            notch,
            delta,
            signal: vec![0.0; len],
            next_notch: vec![0.0; len],
            next_delta: vec![0.0; len],
            next_signal: vec![0.0; len],
            rng,
            time: 0.0,
            steps: 0,
            last_flux: 0.0,
        };
        field.seed_signal(params);
        field
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn len(&self) -> usize {
        self.topology.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topology.is_empty()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn cell(&self, idx: usize) -> CellSnapshot {
        CellSnapshot {
            position: self.topology.position(idx),
            is_boundary: self.topology.is_boundary(idx),
            notch: self.notch[idx],
            delta: self.delta[idx],
            notch_signal: self.signal[idx],
        }
    }

    pub fn cells(&self) -> impl ExactSizeIterator<Item = CellSnapshot> + '_ {
        (0..self.len()).map(|idx| self.cell(idx))
    }

    /// Overwrites an interior cell's levels. Boundary cells stay frozen, so
    /// the call is ignored for them and `false` is returned.
    pub fn set_cell_state(&mut self, idx: usize, notch: f32, delta: f32) -> bool {
        if self.topology.is_boundary(idx) {
            return false;
        }
        self.notch[idx] = notch;
        self.delta[idx] = delta;
        true
    }

    fn seed_signal(&mut self, params: &SimulationParams) {
        for idx in 0..self.len() {
            if self.topology.is_boundary(idx) {
                continue;
            }
            let (notch, delta, _) = sanitized(self.notch[idx], self.delta[idx]);
            let avg_delta = self.mean_neighbor_delta(idx);
            self.signal[idx] = notch_signal(notch, delta, avg_delta, params.lambda);
        }
    }

    pub fn step(&mut self, params: &SimulationParams) -> LatticeFeatures {
        let alpha_d = params.alpha_d.max(0.0);
        let noise = noise_distribution(params.noise_amplitude);

        let mut flux_sum = 0.0;
        let mut recovered = 0usize;

        for idx in 0..self.len() {
            if self.topology.is_boundary(idx) {
                self.next_notch[idx] = self.notch[idx];
                self.next_delta[idx] = self.delta[idx];
                self.next_signal[idx] = self.signal[idx];
                continue;
            }

            let (notch, delta, was_nan) = sanitized(self.notch[idx], self.delta[idx]);
            if was_nan {
                recovered += 1;
            }

            let avg_delta = self.mean_neighbor_delta(idx);
            let signal = notch_signal(notch, delta, avg_delta, params.lambda);

            let noise = noise.as_ref().map_or(0.0, |dist| dist.sample(&mut self.rng));

            let next_delta = delta
                + TIME_STEP * (alpha_d - params.beta_d * delta - params.gamma_d * signal + noise);
            let next_notch = notch + TIME_STEP * (params.alpha_n - params.beta_n * notch);

            let next_delta = settle(next_delta, 0.0);
            flux_sum += (next_delta - delta).abs();

            self.next_notch[idx] = settle(next_notch, 1.0);
            self.next_delta[idx] = next_delta;
            self.next_signal[idx] = signal;
        }

        std::mem::swap(&mut self.notch, &mut self.next_notch);
        std::mem::swap(&mut self.delta, &mut self.next_delta);
        std::mem::swap(&mut self.signal, &mut self.next_signal);

        if recovered > 0 {
            warn!(recovered, step = self.steps, "replaced NaN cell levels with defaults");
        }

        let interior = self.topology.interior_count();
        self.last_flux = if interior > 0 {
            flux_sum / interior as f32
        } else {
            0.0
        };
        self.time += TIME_STEP;
        self.steps += 1;

        self.features()
    }

    pub fn features(&self) -> LatticeFeatures {
        let mut count = 0usize;
        let mut notch_sum = 0.0;
        let mut delta_sum = 0.0;
        let mut signal_sum = 0.0;
        let mut senders = 0usize;

        for idx in self.interior() {
            count += 1;
            notch_sum += self.notch[idx];
            delta_sum += self.delta[idx];
            signal_sum += self.signal[idx];
            if self.delta[idx] > 0.5 {
                senders += 1;
            }
        }

        if count == 0 {
            return LatticeFeatures {
                temporal_flux: self.last_flux,
                ..LatticeFeatures::default()
            };
        }

        let norm = count as f32;
        let mean_delta = delta_sum / norm;

        let mut variance = 0.0;
        let mut contrast_sum = 0.0;
        let mut pairs = 0usize;
        for idx in self.interior() {
            let d = self.delta[idx] - mean_delta;
            variance += d * d;
            for &other in self.topology.neighbors(idx) {
                // Each unordered pair once.
                if other > idx && !self.topology.is_boundary(other) {
                    contrast_sum += (self.delta[idx] - self.delta[other]).abs();
                    pairs += 1;
                }
            }
        }

        LatticeFeatures {
            mean_notch: notch_sum / norm,
            mean_delta,
            delta_variance: variance / norm,
            mean_signal: signal_sum / norm,
            sender_fraction: senders as f32 / norm,
            temporal_flux: self.last_flux,
            lateral_contrast: if pairs > 0 {
                contrast_sum / pairs as f32
            } else {
                0.0
            },
        }
    }

    fn interior(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&idx| !self.topology.is_boundary(idx))
    }

    /// Mean pre-step Delta over interior neighbours; boundary cells are
    /// adjacent but do not signal.
    fn mean_neighbor_delta(&self, idx: usize) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &other in self.topology.neighbors(idx) {
            if !self.topology.is_boundary(other) {
                sum += self.delta[other];
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

/// `N^h * <D_neighbours> - lambda * D`, clamped to `[0, 1]` with NaN read as
/// no activation.
fn notch_signal(notch: f32, delta: f32, avg_delta: f32, lambda: f32) -> f32 {
    let raw = notch.powi(HILL_EXPONENT) * avg_delta - lambda * delta;
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Zero amplitude means no noise. An amplitude that cannot span a float
/// range also disables it, with a warning, instead of aborting the step.
fn noise_distribution(amplitude: f32) -> Option<Uniform<f32>> {
    let amplitude = amplitude.abs();
    if amplitude == 0.0 {
        return None;
    }
    match Uniform::new(-amplitude, amplitude) {
        Ok(dist) => Some(dist),
        Err(err) => {
            warn!(amplitude, %err, "noise amplitude unusable, stepping without noise");
            None
        }
    }
}

fn sanitized(notch: f32, delta: f32) -> (f32, f32, bool) {
    let was_nan = notch.is_nan() || delta.is_nan();
    let notch = if notch.is_nan() { 1.0 } else { notch };
    let delta = if delta.is_nan() { 0.0 } else { delta };
    (notch, delta, was_nan)
}

fn settle(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn notch_color(signal: f32) -> [u8; 3] {
    let t = if signal.is_nan() {
        0.0
    } else {
        signal.clamp(0.0, 1.0)
    };
    let lerp = |lo: u8, hi: u8| (lo as f32 + (hi as f32 - lo as f32) * t).floor() as u8;
    [
        lerp(LOW_SIGNAL_COLOR[0], HIGH_SIGNAL_COLOR[0]),
        lerp(LOW_SIGNAL_COLOR[1], HIGH_SIGNAL_COLOR[1]),
        lerp(LOW_SIGNAL_COLOR[2], HIGH_SIGNAL_COLOR[2]),
    ]
}
