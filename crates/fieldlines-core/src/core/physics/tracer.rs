use super::evaluator::evaluate_with_epsilon;
use super::seeds::{Seed, generate_seeds};
use super::{Bounds, SourceCharge, Tolerances};
use crate::core::models::field::{FieldParams, Line, Termination};

// Upper bound on the up-front allocation for one line; long lines grow past it.
const MAX_PREALLOCATED_POINTS: usize = 4096;

/// Integrates one field line from `seed`.
///
/// `source` is the index in `charges` of the charge the seed belongs to; that
/// charge never absorbs its own lines. At every point the trace stops on the
/// first of: leaving `bounds`, entering another charge's radius, a field too
/// weak to normalize, or having taken `steps` steps. Otherwise it moves
/// `delta` along the (signed) field direction.
pub fn trace_line(
    seed: &Seed,
    source: usize,
    charges: &[SourceCharge],
    steps: usize,
    delta: f64,
    bounds: &Bounds,
    tolerances: &Tolerances,
) -> Line {
    let mut points = Vec::with_capacity(steps.saturating_add(1).min(MAX_PREALLOCATED_POINTS));
    let mut p = seed.position;
    points.push(p);
    let mut taken = 0usize;

    let termination = loop {
        if !bounds.contains(&p) {
            break Termination::OutOfBounds;
        }

        let absorbed = charges
            .iter()
            .enumerate()
            .any(|(j, charge)| j != source && (p - charge.position).norm() < charge.r);
        if absorbed {
            break Termination::Absorbed;
        }

        let e = evaluate_with_epsilon(&p, charges, tolerances.distance_epsilon);
        let strength = e.norm();
        if strength < tolerances.stall_epsilon {
            break Termination::Stalled;
        }

        if taken == steps {
            break Termination::MaxSteps;
        }

        p += e * (delta * seed.direction / strength);
        points.push(p);
        taken += 1;
    };

    Line {
        points,
        termination,
    }
}

/// Traces every line of the field sourced by `charges[source]`.
pub fn trace_field(
    source: usize,
    charges: &[SourceCharge],
    params: &FieldParams,
    bounds: &Bounds,
    tolerances: &Tolerances,
) -> Vec<Line> {
    let Some(origin) = charges.get(source) else {
        return Vec::new();
    };
    generate_seeds(&origin.position, origin.magnitude, params.r, params.density)
        .iter()
        .map(|seed| {
            trace_line(
                seed,
                source,
                charges,
                params.steps,
                params.delta,
                bounds,
                tolerances,
            )
        })
        .collect()
}
