use super::{DEFAULT_DISTANCE_EPSILON, SourceCharge};
use nalgebra::{Point2, Vector2};

/// Superposed field vector at `point`.
///
/// Each charge contributes `magnitude * d / |d|^3` with `d = point - position`.
/// The distance in the denominator is clamped from below by the charge radius
/// (and by a small epsilon), so evaluating inside or at the centre of a charge
/// stays finite. An empty charge set yields the zero vector.
#[inline]
pub fn evaluate(point: &Point2<f64>, charges: &[SourceCharge]) -> Vector2<f64> {
    evaluate_with_epsilon(point, charges, DEFAULT_DISTANCE_EPSILON)
}

#[inline]
pub fn evaluate_with_epsilon(
    point: &Point2<f64>,
    charges: &[SourceCharge],
    distance_epsilon: f64,
) -> Vector2<f64> {
    charges.iter().fold(Vector2::zeros(), |sum, charge| {
        let d = point - charge.position;
        let dist = d.norm().max(charge.r).max(distance_epsilon);
        sum + d * (charge.magnitude / (dist * dist * dist))
    })
}
