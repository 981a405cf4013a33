use crate::core::models::charge::Polarity;
use nalgebra::{Point2, Vector2};
use std::f64::consts::TAU;

/// Starting point of one field line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub position: Point2<f64>,
    /// `+1` to follow the field vector, `-1` to follow its negation.
    pub direction: f64,
}

/// Places `density` seeds evenly on the circle of radius `r` around `center`.
///
/// The first seed sits on the +x axis and the rest follow at `2π / density`
/// intervals, so identical inputs always produce identical seeds. Every seed
/// carries the direction sign of the source's polarity.
pub fn generate_seeds(center: &Point2<f64>, magnitude: f64, r: f64, density: usize) -> Vec<Seed> {
    let direction = Polarity::of(magnitude).direction_sign();
    let step = TAU / density as f64;
    (0..density)
        .map(|k| {
            let angle = step * k as f64;
            Seed {
                position: center + Vector2::new(angle.cos(), angle.sin()) * r,
                direction,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_count_equals_density() {
        let center = Point2::new(50.0, 50.0);
        for density in [1, 2, 7, 32] {
            assert_eq!(generate_seeds(&center, 1.0, 5.0, density).len(), density);
        }
    }

    #[test]
    fn zero_density_yields_no_seeds() {
        assert!(generate_seeds(&Point2::new(0.0, 0.0), 1.0, 5.0, 0).is_empty());
    }

    #[test]
    fn seeds_lie_on_source_circle() {
        let center = Point2::new(10.0, -4.0);
        for seed in generate_seeds(&center, 1.0, 3.0, 12) {
            assert!(((seed.position - center).norm() - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn first_seed_uses_fixed_reference_phase() {
        let seeds = generate_seeds(&Point2::new(0.0, 0.0), 1.0, 2.0, 4);
        assert_eq!(seeds[0].position, Point2::new(2.0, 0.0));
        assert!((seeds[1].position - Point2::new(0.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn direction_follows_polarity() {
        let center = Point2::new(0.0, 0.0);
        assert!(generate_seeds(&center, 2.0, 1.0, 3).iter().all(|s| s.direction == 1.0));
        assert!(generate_seeds(&center, -2.0, 1.0, 3).iter().all(|s| s.direction == -1.0));
    }

    #[test]
    fn negation_flips_direction_but_not_positions() {
        let center = Point2::new(30.0, 40.0);
        let positive = generate_seeds(&center, 1.5, 8.0, 9);
        let negative = generate_seeds(&center, -1.5, 8.0, 9);

        for (p, n) in positive.iter().zip(&negative) {
            assert_eq!(p.position, n.position);
            assert_eq!(p.direction, -n.direction);
        }
    }
}
