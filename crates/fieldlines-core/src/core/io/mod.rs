//! Reading and writing engine data as JSON documents.
//!
//! Two documents are supported: the persisted project (charges, field
//! overrides and settings of every simulation, without lines) and the lines
//! export consumed by renderers. Both go through the [`traits::JsonDocument`]
//! interface.

pub mod lines;
pub mod project;
pub mod traits;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid project document: {0}")]
    Invalid(String),
}

/// A point as it appears in JSON: `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
}

impl From<Point2<f64>> for PointRecord {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<&Point2<f64>> for PointRecord {
    fn from(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<PointRecord> for Point2<f64> {
    fn from(p: PointRecord) -> Self {
        Point2::new(p.x, p.y)
    }
}
