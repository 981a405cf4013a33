use super::ids::ChargeId;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Polarity of a charge, derived from the sign of its magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Direction sign used when tracing lines out of a source of this polarity.
    #[inline]
    pub fn direction_sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }

    #[inline]
    pub fn of(magnitude: f64) -> Self {
        if magnitude < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }
}

/// Interaction state of a single charge.
///
/// The store guarantees that at most one charge of a simulation is in a
/// non-`Idle` state at any time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ChargeState {
    #[default]
    Idle,
    Selected,
    /// The charge follows the pointer; `grab_offset` is the vector from the
    /// pointer to the charge centre captured when the drag began.
    Dragging { grab_offset: Vector2<f64> },
}

impl ChargeState {
    #[inline]
    pub fn is_selected(&self) -> bool {
        !matches!(self, ChargeState::Idle)
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self, ChargeState::Dragging { .. })
    }
}

/// A point charge in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub id: ChargeId,
    pub position: Point2<f64>,
    /// Signed relative magnitude; the sign is the polarity.
    pub magnitude: f64,
    pub(crate) state: ChargeState,
}

impl Charge {
    pub fn new(id: ChargeId, position: Point2<f64>, magnitude: f64) -> Self {
        Self {
            id,
            position,
            magnitude,
            state: ChargeState::Idle,
        }
    }

    #[inline]
    pub fn polarity(&self) -> Polarity {
        Polarity::of(self.magnitude)
    }

    #[inline]
    pub fn state(&self) -> ChargeState {
        self.state
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.state.is_selected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_follows_sign_of_magnitude() {
        assert_eq!(Polarity::of(2.5), Polarity::Positive);
        assert_eq!(Polarity::of(-0.01), Polarity::Negative);
        assert_eq!(Polarity::Positive.direction_sign(), 1.0);
        assert_eq!(Polarity::Negative.direction_sign(), -1.0);
    }

    #[test]
    fn new_charge_starts_idle() {
        let charge = Charge::new(ChargeId(3), Point2::new(1.0, 2.0), -1.0);
        assert_eq!(charge.state(), ChargeState::Idle);
        assert!(!charge.is_selected());
        assert_eq!(charge.polarity(), Polarity::Negative);
    }

    #[test]
    fn dragging_counts_as_selected() {
        let state = ChargeState::Dragging {
            grab_offset: Vector2::new(1.0, 0.0),
        };
        assert!(state.is_selected());
        assert!(state.is_dragging());
        assert!(!ChargeState::Selected.is_dragging());
    }
}
