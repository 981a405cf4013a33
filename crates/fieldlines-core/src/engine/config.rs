use crate::core::physics::{DEFAULT_DISTANCE_EPSILON, DEFAULT_STALL_EPSILON, Tolerances};
use nalgebra::Vector2;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Change in absolute magnitude per scroll notch.
    pub scroll_step: f64,
    /// Smallest absolute magnitude scrolling may leave a charge with.
    pub magnitude_floor: f64,
    /// Displacement of a duplicated charge relative to its original.
    pub duplicate_offset: Vector2<f64>,
    /// Minimum interval between drag-triggered recomputes.
    pub drag_throttle: Duration,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            scroll_step: 0.1,
            magnitude_floor: 0.01,
            duplicate_offset: Vector2::new(20.0, 20.0),
            drag_throttle: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub trace: Tolerances,
    pub interaction: InteractionConfig,
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    distance_epsilon: Option<f64>,
    stall_epsilon: Option<f64>,
    scroll_step: Option<f64>,
    magnitude_floor: Option<f64>,
    duplicate_offset: Option<Vector2<f64>>,
    drag_throttle: Option<Duration>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_epsilon(mut self, epsilon: f64) -> Self {
        self.distance_epsilon = Some(epsilon);
        self
    }
    pub fn stall_epsilon(mut self, epsilon: f64) -> Self {
        self.stall_epsilon = Some(epsilon);
        self
    }
    pub fn scroll_step(mut self, step: f64) -> Self {
        self.scroll_step = Some(step);
        self
    }
    pub fn magnitude_floor(mut self, floor: f64) -> Self {
        self.magnitude_floor = Some(floor);
        self
    }
    pub fn duplicate_offset(mut self, offset: Vector2<f64>) -> Self {
        self.duplicate_offset = Some(offset);
        self
    }
    pub fn drag_throttle(mut self, interval: Duration) -> Self {
        self.drag_throttle = Some(interval);
        self
    }

    /// Builds the configuration, filling unset values with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for epsilons, steps or floors
    /// that are not finite and strictly positive, or a non-finite offset.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let defaults = InteractionConfig::default();
        let trace = Tolerances {
            distance_epsilon: positive(
                "distance_epsilon",
                self.distance_epsilon.unwrap_or(DEFAULT_DISTANCE_EPSILON),
            )?,
            stall_epsilon: positive(
                "stall_epsilon",
                self.stall_epsilon.unwrap_or(DEFAULT_STALL_EPSILON),
            )?,
        };

        let duplicate_offset = self.duplicate_offset.unwrap_or(defaults.duplicate_offset);
        if !(duplicate_offset.x.is_finite() && duplicate_offset.y.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "duplicate_offset",
                reason: "must be finite".to_string(),
            });
        }

        let interaction = InteractionConfig {
            scroll_step: positive("scroll_step", self.scroll_step.unwrap_or(defaults.scroll_step))?,
            magnitude_floor: positive(
                "magnitude_floor",
                self.magnitude_floor.unwrap_or(defaults.magnitude_floor),
            )?,
            duplicate_offset,
            drag_throttle: self.drag_throttle.unwrap_or(defaults.drag_throttle),
        };

        Ok(EngineConfig {
            trace,
            interaction,
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("expected a finite positive number, got {}", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_without_overrides_matches_default() {
        let config = EngineConfigBuilder::new().build().unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn builder_applies_overrides() {
        let config = EngineConfigBuilder::new()
            .stall_epsilon(1e-6)
            .scroll_step(0.5)
            .drag_throttle(Duration::from_millis(40))
            .build()
            .unwrap();
        assert_eq!(config.trace.stall_epsilon, 1e-6);
        assert_eq!(config.interaction.scroll_step, 0.5);
        assert_eq!(config.interaction.drag_throttle, Duration::from_millis(40));
        assert_eq!(config.trace.distance_epsilon, DEFAULT_DISTANCE_EPSILON);
    }

    #[test]
    fn builder_rejects_non_positive_values() {
        let err = EngineConfigBuilder::new().magnitude_floor(0.0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "magnitude_floor",
                ..
            }
        ));
        assert!(EngineConfigBuilder::new().stall_epsilon(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_rejects_non_finite_offset() {
        let result = EngineConfigBuilder::new()
            .duplicate_offset(Vector2::new(f64::INFINITY, 0.0))
            .build();
        assert!(result.is_err());
    }
}
