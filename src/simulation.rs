use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::lattice::{LatticeGeometry, Topology};
use crate::notch_delta::NotchDeltaField;
use crate::types::{LatticeFeatures, SimulationParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Owns the lattice, the live parameters and the start/stop state. The host
/// calls [`Simulation::frame`] once per display refresh.
pub struct Simulation {
    geometry: LatticeGeometry,
    params: SimulationParams,
    params_revision: u64,
    steps_per_frame: usize,
    seed: u64,
    generation: u64,
    field: NotchDeltaField,
    features: LatticeFeatures,
    state: RunState,
}

impl Simulation {
    pub fn new(
        geometry: LatticeGeometry,
        params: SimulationParams,
        steps_per_frame: usize,
        seed: Option<u64>,
    ) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        info!(
            seed,
            columns = geometry.columns,
            rows = geometry.rows,
            "building lattice"
        );

        let field = build_field(&geometry, &params, seed, 0);
        let features = field.features();
        Self {
            geometry,
            params,
            params_revision: 0,
            steps_per_frame: steps_per_frame.max(1),
            seed,
            generation: 0,
            field,
            features,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn toggle(&mut self) -> RunState {
        self.state = match self.state {
            RunState::Idle => RunState::Running,
            RunState::Running => RunState::Idle,
        };
        info!(state = ?self.state, step = self.field.steps(), "run state changed");
        self.state
    }

    pub fn start(&mut self) {
        if !self.is_running() {
            self.toggle();
        }
    }

    /// Stops before the next frame; a step already taken is kept.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.toggle();
        }
    }

    /// Discards the lattice, builds a fresh one and goes idle.
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.generation += 1;
        self.field = build_field(&self.geometry, &self.params, self.seed, self.generation);
        self.features = self.field.features();
        info!(generation = self.generation, "lattice reset");
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Replaces the coefficients; the next step reads them. Running state and
    /// lattice are left alone.
    pub fn set_params(&mut self, params: SimulationParams) {
        if params != self.params {
            self.params = params;
            self.params_revision += 1;
            debug!(revision = self.params_revision, ?params, "parameters updated");
        }
    }

    pub fn params_revision(&self) -> u64 {
        self.params_revision
    }

    pub fn steps_per_frame(&self) -> usize {
        self.steps_per_frame
    }

    pub fn set_steps_per_frame(&mut self, steps: usize) {
        self.steps_per_frame = steps.max(1);
    }

    /// Advances by `steps_per_frame` steps when running. Returns the fresh
    /// features, or `None` when idle.
    pub fn frame(&mut self) -> Option<LatticeFeatures> {
        if !self.is_running() {
            return None;
        }
        for _ in 0..self.steps_per_frame {
            self.features = self.field.step(&self.params);
        }
        debug!(
            step = self.field.steps(),
            mean_delta = self.features.mean_delta,
            contrast = self.features.lateral_contrast,
            flux = self.features.temporal_flux,
            "frame"
        );
        Some(self.features)
    }

    pub fn field(&self) -> &NotchDeltaField {
        &self.field
    }

    pub fn features(&self) -> LatticeFeatures {
        self.features
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn geometry(&self) -> &LatticeGeometry {
        &self.geometry
    }
}

fn build_field(
    geometry: &LatticeGeometry,
    params: &SimulationParams,
    seed: u64,
    generation: u64,
) -> NotchDeltaField {
    let rng = StdRng::seed_from_u64(seed ^ generation.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    NotchDeltaField::new(Topology::hexagonal(geometry), params, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::BoundaryLayout;

    fn simulation(seed: u64) -> Simulation {
        let geometry = LatticeGeometry {
            columns: 6,
            rows: 5,
            radius: 25.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            boundary: BoundaryLayout::Ring,
        };
        Simulation::new(geometry, SimulationParams::default(), 1, Some(seed))
    }

    #[test]
    fn starts_idle_and_does_not_step() {
        let mut sim = simulation(1);
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(sim.frame(), None);
        assert_eq!(sim.field().steps(), 0);
    }

    #[test]
    fn toggle_runs_and_stops() {
        let mut sim = simulation(2);
        assert_eq!(sim.toggle(), RunState::Running);
        assert!(sim.frame().is_some());
        assert!(sim.frame().is_some());
        assert_eq!(sim.field().steps(), 2);

        assert_eq!(sim.toggle(), RunState::Idle);
        assert!(sim.frame().is_none());
        assert_eq!(sim.field().steps(), 2);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut sim = simulation(3);
        sim.start();
        sim.start();
        assert!(sim.is_running());
        sim.stop();
        sim.stop();
        assert!(!sim.is_running());
    }

    #[test]
    fn steps_per_frame_controls_step_count() {
        let mut sim = simulation(4);
        sim.set_steps_per_frame(0);
        assert_eq!(sim.steps_per_frame(), 1);
        sim.set_steps_per_frame(5);
        sim.start();
        sim.frame();
        assert_eq!(sim.field().steps(), 5);
    }

    #[test]
    fn reset_forces_idle_and_keeps_shape() {
        let mut sim = simulation(5);
        let len = sim.field().len();
        let mask: Vec<bool> = sim.field().cells().map(|c| c.is_boundary).collect();
        let first: Vec<f32> = sim.field().cells().map(|c| c.delta).collect();

        sim.start();
        sim.frame();
        sim.reset();
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(sim.field().steps(), 0);
        sim.reset();

        assert_eq!(sim.field().len(), len);
        let after: Vec<bool> = sim.field().cells().map(|c| c.is_boundary).collect();
        assert_eq!(after, mask);
        let positions_match = sim
            .field()
            .cells()
            .zip(simulation(5).field().cells())
            .all(|(a, b)| a.position == b.position);
        assert!(positions_match);

        let second: Vec<f32> = sim.field().cells().map(|c| c.delta).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn same_seed_reproduces_run() {
        let mut a = simulation(6);
        let mut b = simulation(6);
        a.start();
        b.start();
        for _ in 0..10 {
            assert_eq!(a.frame(), b.frame());
        }
    }

    #[test]
    fn params_change_without_pausing() {
        let mut sim = simulation(7);
        sim.start();
        sim.frame();

        let params = SimulationParams {
            gamma_d: 1.0,
            ..*sim.params()
        };
        sim.set_params(params);
        assert_eq!(sim.params_revision(), 1);
        assert!(sim.is_running());
        assert_eq!(sim.params().gamma_d, 1.0);

        sim.set_params(params);
        assert_eq!(sim.params_revision(), 1);

        assert!(sim.frame().is_some());
        assert_eq!(sim.field().steps(), 2);
    }
}
