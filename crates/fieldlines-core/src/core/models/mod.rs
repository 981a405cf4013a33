//! # Core Models Module
//!
//! Data structures describing an electrostatic scene: point charges, the fields
//! they source, per-simulation settings and the multi-simulation project.
//!
//! ## Key Components
//!
//! - [`charge`] - Point charges, their polarity and interaction state
//! - [`field`] - Per-field tracing parameters and cached field lines
//! - [`settings`] - Defaults used when new charges are created
//! - [`simulation`] - The charge store and a single scene
//! - [`project`] - A session of independent simulations
//! - [`ids`] - Identifier types for charges and simulations
//!
//! ## Usage
//!
//! ```ignore
//! use fieldlines::core::models::{charge::Polarity, settings::Settings, simulation::Simulation};
//! use nalgebra::Point2;
//!
//! let mut sim = Simulation::new("Dipole", 800.0, 600.0, Settings::default());
//! let plus = sim.add_charge(Point2::new(350.0, 300.0), Polarity::Positive);
//! let minus = sim.add_charge(Point2::new(450.0, 300.0), Polarity::Negative);
//! ```

pub mod charge;
pub mod field;
pub mod ids;
pub mod project;
pub mod settings;
pub mod simulation;
