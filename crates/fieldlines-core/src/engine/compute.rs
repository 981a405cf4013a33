use super::progress::{Progress, ProgressReporter};
use crate::core::io::PointRecord;
use crate::core::models::field::{FieldParams, Line, Termination};
use crate::core::models::ids::ChargeId;
use crate::core::models::simulation::Simulation;
use crate::core::physics::tracer::trace_field;
use crate::core::physics::{Bounds, SourceCharge, Tolerances};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One field to trace: its source charge and tracing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub source_id: ChargeId,
    pub position: PointRecord,
    pub magnitude: f64,
    pub r: f64,
    pub density: usize,
    pub steps: usize,
    pub delta: f64,
}

impl FieldSpec {
    pub fn params(&self) -> FieldParams {
        FieldParams {
            r: self.r,
            density: self.density,
            steps: self.steps,
            delta: self.delta,
        }
    }

    fn source(&self) -> SourceCharge {
        SourceCharge {
            position: self.position.into(),
            magnitude: self.magnitude,
            r: self.r,
        }
    }
}

/// The traced lines of one field, in seed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub source_id: ChargeId,
    pub lines: Vec<Vec<PointRecord>>,
    /// Why each line stopped; parallel to `lines`.
    pub terminations: Vec<Termination>,
}

impl FieldResult {
    pub fn from_lines(source_id: ChargeId, lines: &[Line]) -> Self {
        Self {
            source_id,
            lines: lines
                .iter()
                .map(|line| line.points.iter().map(PointRecord::from).collect())
                .collect(),
            terminations: lines.iter().map(|line| line.termination).collect(),
        }
    }

    pub fn into_lines(self) -> Vec<Line> {
        self.lines
            .into_iter()
            .zip(self.terminations)
            .map(|(points, termination)| Line {
                points: points.into_iter().map(Into::into).collect(),
                termination,
            })
            .collect()
    }
}

/// Snapshots every field of `simulation` in charge-id order.
pub fn field_specs(simulation: &Simulation) -> Vec<FieldSpec> {
    simulation
        .charges()
        .iter()
        .map(|entry| FieldSpec {
            source_id: entry.charge.id,
            position: entry.charge.position.into(),
            magnitude: entry.charge.magnitude,
            r: entry.field.params.r,
            density: entry.field.params.density,
            steps: entry.field.params.steps,
            delta: entry.field.params.delta,
        })
        .collect()
}

/// Traces every field in `specs` inside a `width` x `height` canvas with the
/// default tolerances. Results are returned in input order.
pub fn compute_fields(width: f64, height: f64, specs: &[FieldSpec]) -> Vec<FieldResult> {
    compute_fields_with(
        width,
        height,
        specs,
        &Tolerances::default(),
        &ProgressReporter::new(),
    )
}

#[instrument(skip_all, fields(fields = specs.len()))]
pub fn compute_fields_with(
    width: f64,
    height: f64,
    specs: &[FieldSpec],
    tolerances: &Tolerances,
    reporter: &ProgressReporter,
) -> Vec<FieldResult> {
    let bounds = Bounds::new(width, height);
    let charges: Vec<SourceCharge> = specs.iter().map(FieldSpec::source).collect();

    reporter.report(Progress::TraceStart {
        fields: specs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = specs.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = specs.par_iter().enumerate();

    let results: Vec<FieldResult> = iterator
        .map(|(index, spec)| {
            let lines = trace_field(index, &charges, &spec.params(), &bounds, tolerances);
            reporter.report(Progress::FieldTraced { lines: lines.len() });
            FieldResult::from_lines(spec.source_id, &lines)
        })
        .collect();

    reporter.report(Progress::TraceFinish);
    debug!(
        lines = results.iter().map(|r| r.lines.len()).sum::<usize>(),
        "Traced fields."
    );
    results
}

/// Replaces the cached lines of every field in `simulation` with `results`.
///
/// Fields without a matching result are cleared; results for charges that no
/// longer exist are dropped. Returns the number of fields that received lines.
pub fn apply_results(simulation: &mut Simulation, results: Vec<FieldResult>) -> usize {
    let mut by_source: HashMap<ChargeId, FieldResult> = results
        .into_iter()
        .map(|result| (result.source_id, result))
        .collect();

    let mut applied = 0;
    for entry in simulation.charges_mut().iter_mut() {
        match by_source.remove(&entry.charge.id) {
            Some(result) => {
                entry.field.replace_lines(result.into_lines());
                applied += 1;
            }
            None => entry.field.clear_lines(),
        }
    }

    if !by_source.is_empty() {
        debug!(
            dropped = by_source.len(),
            "Dropped results for charges that no longer exist."
        );
    }
    applied
}
