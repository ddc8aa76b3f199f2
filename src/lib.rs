//! Notch-Delta lateral inhibition on a hexagonal cell lattice.
//!
//! [`lattice`] builds the fixed topology, [`notch_delta`] integrates the
//! signaling state over it and [`simulation`] drives runs frame by frame.

pub mod config;
pub mod lattice;
pub mod notch_delta;
pub mod simulation;
pub mod types;
