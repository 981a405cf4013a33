//! # Physics Module
//!
//! The numerical heart of the engine: Coulomb superposition in the plane, seed
//! placement around a source, and fixed-step integration of field lines.
//!
//! Everything here is a pure function of its inputs. Given the same charges,
//! parameters and bounds, tracing always yields the same points in the same
//! order, which is what lets persisted projects omit their lines.
//!
//! - [`evaluator`] - Field vector at a point
//! - [`seeds`] - Starting points on a source's boundary circle
//! - [`tracer`] - Line integration and termination

pub mod evaluator;
pub mod seeds;
pub mod tracer;

use nalgebra::Point2;

pub const DEFAULT_DISTANCE_EPSILON: f64 = 1e-9;
pub const DEFAULT_STALL_EPSILON: f64 = 1e-12;

/// A charge as seen by the numerical routines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceCharge {
    pub position: Point2<f64>,
    pub magnitude: f64,
    /// Radius of the charge; also the absorption radius for other lines.
    pub r: f64,
}

/// The rectangle `[0, width] x [0, height]` lines are traced in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Non-finite coordinates are never contained.
    #[inline]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }
}

/// Numerical guards used while evaluating and tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Lower bound on the distance used in the inverse-square term.
    pub distance_epsilon: f64,
    /// Field strength below which a trace is considered stalled.
    pub stall_epsilon: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            distance_epsilon: DEFAULT_DISTANCE_EPSILON,
            stall_epsilon: DEFAULT_STALL_EPSILON,
        }
    }
}
