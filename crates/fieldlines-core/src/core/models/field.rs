use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Per-field tracing parameters, seeded from the simulation settings when the
/// charge is created and editable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Radius of the source charge; seeds sit on this circle and other lines
    /// are absorbed inside it.
    pub r: f64,
    /// Number of lines seeded around the source.
    pub density: usize,
    /// Maximum number of integration steps per line.
    pub steps: usize,
    /// Arc length of one integration step.
    pub delta: f64,
}

/// Why a trace stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    OutOfBounds,
    Absorbed,
    Stalled,
    MaxSteps,
}

/// A traced field line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub points: Vec<Point2<f64>>,
    pub termination: Termination,
}

impl Line {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point2<f64>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2<f64>> {
        self.points.last()
    }
}

/// The field bound to one source charge: its overrides and the cached lines of
/// the last accepted trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub params: FieldParams,
    lines: Vec<Line>,
}

impl Field {
    pub fn new(params: FieldParams) -> Self {
        Self {
            params,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Swaps in a complete line list. Lines are never edited piecemeal.
    pub fn replace_lines(&mut self, lines: Vec<Line>) {
        self.lines = lines;
    }

    pub fn clear_lines(&mut self) {
        self.lines.clear();
    }
}
