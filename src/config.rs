//! Runtime configuration.
//!
//! Every section is optional; missing keys fall back to radius 25 cells on
//! an 800x600 canvas with the default kinetics.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::lattice::{BoundaryLayout, LatticeGeometry};
use crate::types::SimulationParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cell radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("canvas size must be finite, got {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },
    #[error("noise amplitude must be finite and below f32::MAX / 2, got {0}")]
    InvalidNoiseAmplitude(f32),
    #[error("lattice has no interior cells ({columns} columns x {rows} rows)")]
    EmptyLattice { columns: usize, rows: usize },
    #[error("steps per frame must be at least 1")]
    NoStepsPerFrame,
}

/// Keeps `2 * amplitude` representable.
pub const MAX_NOISE_AMPLITUDE: f32 = f32::MAX / 2.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub lattice: LatticeConfig,
    pub params: SimulationParams,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatticeConfig {
    /// Derived from the canvas width when absent.
    pub columns: Option<usize>,
    /// Derived from the canvas height when absent.
    pub rows: Option<usize>,
    pub radius: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub boundary: BoundaryLayout,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            columns: None,
            rows: None,
            radius: 25.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            boundary: BoundaryLayout::Ring,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Random seed for reproducibility (None for random)
    pub seed: Option<u64>,
    pub steps_per_frame: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            steps_per_frame: 1,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lattice.geometry()?;
        let noise = self.params.noise_amplitude;
        if !(noise.is_finite() && noise.abs() < MAX_NOISE_AMPLITUDE) {
            return Err(ConfigError::InvalidNoiseAmplitude(noise));
        }
        if self.run.steps_per_frame == 0 {
            return Err(ConfigError::NoStepsPerFrame);
        }
        Ok(())
    }
}

impl LatticeConfig {
    /// Resolves missing dimensions against the canvas and checks that at
    /// least one interior cell exists.
    pub fn geometry(&self) -> Result<LatticeGeometry, ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        if !(self.canvas_width.is_finite() && self.canvas_height.is_finite()) {
            return Err(ConfigError::InvalidCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }

        let fitted =
            LatticeGeometry::fit_canvas(self.canvas_width, self.canvas_height, self.radius);
        let geometry = LatticeGeometry {
            columns: self.columns.unwrap_or(fitted.columns),
            rows: self.rows.unwrap_or(fitted.rows),
            boundary: self.boundary,
            ..fitted
        };

        let (columns, rows) = (geometry.columns, geometry.rows);
        let empty = match geometry.boundary {
            BoundaryLayout::Ring => columns == 0 || rows == 0,
            BoundaryLayout::Reference => rows < 2,
        };
        if empty {
            return Err(ConfigError::EmptyLattice { columns, rows });
        }
        Ok(geometry)
    }
}
