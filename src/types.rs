use serde::Deserialize;

pub const HILL_EXPONENT: i32 = 3;

pub const TIME_STEP: f32 = 0.1;

/// Kinetic coefficients read by the integrator at the start of every step.
///
/// Negative `alpha_d` is treated as zero production. Every other coefficient is
/// used as given, so a negative decay rate turns into growth.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationParams {
    pub alpha_n: f32,
    pub beta_n: f32,
    pub alpha_d: f32,
    pub beta_d: f32,
    pub gamma_d: f32,
    pub lambda: f32,
    pub noise_amplitude: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            alpha_n: 2.0,
            beta_n: 1.0,
            alpha_d: 2.0,
            beta_d: 2.0,
            gamma_d: 5.0,
            lambda: 0.2,
            noise_amplitude: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeFeatures {
    pub mean_notch: f32,
    pub mean_delta: f32,
    pub delta_variance: f32,
    pub mean_signal: f32,
    pub sender_fraction: f32,
    pub temporal_flux: f32,
    /// Mean absolute Delta difference across interior neighbour pairs.
    pub lateral_contrast: f32,
}

impl Default for LatticeFeatures {
    fn default() -> Self {
        Self {
            mean_notch: 1.0,
            mean_delta: 0.0,
            delta_variance: 0.0,
            mean_signal: 0.0,
            sender_fraction: 0.0,
            temporal_flux: 0.0,
            lateral_contrast: 0.0,
        }
    }
}
