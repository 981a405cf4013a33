use super::config::InteractionConfig;
use crate::core::io::PointRecord;
use crate::core::models::charge::{ChargeState, Polarity};
use crate::core::models::field::FieldParams;
use crate::core::models::ids::ChargeId;
use crate::core::models::simulation::Simulation;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A user action on one simulation, as produced by a pointer, wheel or
/// keyboard handler (or read from a replay script).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    Click { id: ChargeId },
    DoubleClick { id: ChargeId },
    DragStart { id: ChargeId, at: PointRecord },
    DragMove { at: PointRecord },
    DragEnd,
    Delete { id: ChargeId },
    Duplicate { id: ChargeId },
    Deselect { id: ChargeId },
    /// `direction` is positive to grow the charge and negative to shrink it.
    Scroll { id: ChargeId, direction: f64 },
    AddCharge { at: PointRecord, polarity: Polarity },
    ClickBackground,
    /// Partial settings edit; with `push_to_fields` the new values are also
    /// written to every existing charge and field.
    UpdateSettings {
        values: Map<String, Value>,
        #[serde(default)]
        push_to_fields: bool,
    },
    SetFieldParams { id: ChargeId, params: FieldParams },
    Resize { width: f64, height: f64 },
}

/// What an action did to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Unknown target or no effect.
    Ignored,
    /// Only selection or cosmetic state changed; lines are still valid.
    Redraw,
    /// Geometry changed; a recompute must be requested.
    GeometryChanged,
    /// Geometry changed during a drag but the recompute is deferred until the
    /// throttle admits or releases one, or the drag ends.
    Throttled,
}

impl Outcome {
    #[inline]
    pub fn needs_recompute(self) -> bool {
        matches!(self, Outcome::GeometryChanged)
    }
}

/// Rate limiter for drag-triggered recomputes.
#[derive(Debug, Clone)]
pub struct DragThrottle {
    interval: Duration,
    last_admitted: Option<Instant>,
    pending: bool,
}

impl DragThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
            pending: false,
        }
    }

    /// Returns `true` if a recompute may run at `now`. A refused call leaves a
    /// pending recompute behind.
    pub fn admit_at(&mut self, now: Instant) -> bool {
        let ready = self
            .last_admitted
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if ready {
            self.last_admitted = Some(now);
            self.pending = false;
        } else {
            self.pending = true;
        }
        ready
    }

    pub fn admit(&mut self) -> bool {
        self.admit_at(Instant::now())
    }

    /// Trailing edge: releases a refused recompute once the interval since the
    /// last admitted one has elapsed.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        self.pending && self.admit_at(now)
    }

    /// Releases a refused recompute regardless of the interval, keeping the
    /// drag going.
    pub fn take_pending(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.last_admitted = Some(now);
        true
    }

    /// Ends the current drag. Returns whether a refused recompute is still
    /// owed.
    pub fn flush(&mut self) -> bool {
        let pending = self.pending;
        self.pending = false;
        self.last_admitted = None;
        pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Translates [`Action`]s into charge mutations and decides which of them
/// dirty the traced geometry.
#[derive(Debug, Clone)]
pub struct InteractionController {
    config: InteractionConfig,
    throttle: DragThrottle,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        let throttle = DragThrottle::new(config.drag_throttle);
        Self { config, throttle }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn handle(&mut self, simulation: &mut Simulation, action: &Action) -> Outcome {
        self.handle_at(simulation, action, Instant::now())
    }

    /// Like [`handle`](Self::handle) with an explicit clock for the drag
    /// throttle.
    pub fn handle_at(&mut self, simulation: &mut Simulation, action: &Action, now: Instant) -> Outcome {
        let outcome = match action {
            Action::Click { id } => {
                if simulation.charges_mut().select(*id) {
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
            Action::DoubleClick { id } => match simulation.charges_mut().get_mut(*id) {
                Some(entry) => {
                    entry.charge.magnitude = -entry.charge.magnitude;
                    Outcome::GeometryChanged
                }
                None => Outcome::Ignored,
            },
            Action::DragStart { id, at } => self.drag_start(simulation, *id, *at),
            Action::DragMove { at } => self.drag_move(simulation, *at, now),
            Action::DragEnd => self.drag_end(simulation),
            Action::Delete { id } => match simulation.charges_mut().remove(*id) {
                Some(_) => Outcome::GeometryChanged,
                None => Outcome::Ignored,
            },
            Action::Duplicate { id } => {
                match simulation
                    .charges_mut()
                    .duplicate(*id, self.config.duplicate_offset)
                {
                    Some(_) => Outcome::GeometryChanged,
                    None => Outcome::Ignored,
                }
            }
            Action::Deselect { id } => {
                let selected = simulation
                    .charge(*id)
                    .is_some_and(|charge| charge.is_selected());
                if selected {
                    simulation.charges_mut().clear_states();
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
            Action::Scroll { id, direction } => self.scroll(simulation, *id, *direction),
            Action::AddCharge { at, polarity } => {
                let position = Point2::from(*at);
                if is_finite(&position) {
                    simulation.add_charge(position, *polarity);
                    Outcome::GeometryChanged
                } else {
                    Outcome::Ignored
                }
            }
            Action::ClickBackground => {
                if simulation.charges().selected().is_some() {
                    simulation.charges_mut().clear_states();
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
            Action::UpdateSettings {
                values,
                push_to_fields,
            } => update_settings(simulation, values, *push_to_fields),
            Action::SetFieldParams { id, params } => set_field_params(simulation, *id, params),
            Action::Resize { width, height } => {
                let valid = width.is_finite() && height.is_finite() && *width > 0.0 && *height > 0.0;
                if valid && simulation.resize(*width, *height) {
                    Outcome::GeometryChanged
                } else {
                    Outcome::Ignored
                }
            }
        };
        trace!(?action, ?outcome, "Handled interaction.");
        outcome
    }

    /// Releases a throttled drag recompute whose interval has elapsed. Meant
    /// to be called by the control loop while no pointer events arrive.
    pub fn poll_at(&mut self, now: Instant) -> Outcome {
        if self.throttle.poll_at(now) {
            debug!("Releasing throttled drag recompute.");
            Outcome::GeometryChanged
        } else {
            Outcome::Ignored
        }
    }

    pub fn poll(&mut self) -> Outcome {
        self.poll_at(Instant::now())
    }

    /// Releases a throttled drag recompute immediately, for callers that stop
    /// feeding actions while a drag may still be in progress.
    pub fn release_pending(&mut self) -> Outcome {
        if self.throttle.take_pending(Instant::now()) {
            debug!("Releasing throttled drag recompute.");
            Outcome::GeometryChanged
        } else {
            Outcome::Ignored
        }
    }

    fn drag_start(&mut self, simulation: &mut Simulation, id: ChargeId, at: PointRecord) -> Outcome {
        let pointer = Point2::from(at);
        let Some(charge) = simulation.charge(id) else {
            return Outcome::Ignored;
        };
        if !is_finite(&pointer) {
            return Outcome::Ignored;
        }
        let grab_offset = charge.position - pointer;
        simulation
            .charges_mut()
            .set_state(id, ChargeState::Dragging { grab_offset });
        self.throttle.flush();
        Outcome::Redraw
    }

    fn drag_move(&mut self, simulation: &mut Simulation, at: PointRecord, now: Instant) -> Outcome {
        let pointer = Point2::from(at);
        let Some((id, grab_offset)) = simulation.charges().dragging() else {
            return Outcome::Ignored;
        };
        if !is_finite(&pointer) {
            return Outcome::Ignored;
        }
        let target = pointer + grab_offset;
        let Some(entry) = simulation.charges_mut().get_mut(id) else {
            return Outcome::Ignored;
        };
        if entry.charge.position == target {
            return Outcome::Ignored;
        }
        entry.charge.position = target;

        if self.throttle.admit_at(now) {
            Outcome::GeometryChanged
        } else {
            Outcome::Throttled
        }
    }

    fn drag_end(&mut self, simulation: &mut Simulation) -> Outcome {
        let Some((id, _)) = simulation.charges().dragging() else {
            return Outcome::Ignored;
        };
        simulation.charges_mut().select(id);
        if self.throttle.flush() {
            debug!(charge = %id, "Flushing throttled drag recompute.");
            Outcome::GeometryChanged
        } else {
            Outcome::Redraw
        }
    }

    fn scroll(&self, simulation: &mut Simulation, id: ChargeId, direction: f64) -> Outcome {
        if !direction.is_finite() || direction == 0.0 {
            return Outcome::Ignored;
        }
        let Some(entry) = simulation.charges_mut().get_mut(id) else {
            return Outcome::Ignored;
        };
        let sign = entry.charge.polarity().direction_sign();
        let grown = entry.charge.magnitude.abs() + self.config.scroll_step * direction;
        let magnitude = sign * grown.max(self.config.magnitude_floor);
        if magnitude == entry.charge.magnitude {
            return Outcome::Ignored;
        }
        entry.charge.magnitude = magnitude;
        Outcome::GeometryChanged
    }
}

fn is_finite(p: &Point2<f64>) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

fn update_settings(simulation: &mut Simulation, values: &Map<String, Value>, push: bool) -> Outcome {
    let before = simulation.settings.clone();
    simulation.settings.apply_update(values);
    let settings_changed = simulation.settings != before;

    if push {
        let snapshot = geometry_snapshot(simulation);
        simulation.push_settings_to_fields();
        if geometry_snapshot(simulation) != snapshot {
            return Outcome::GeometryChanged;
        }
    }

    if settings_changed {
        Outcome::Redraw
    } else {
        Outcome::Ignored
    }
}

fn geometry_snapshot(simulation: &Simulation) -> Vec<(f64, FieldParams)> {
    simulation
        .charges()
        .iter()
        .map(|entry| (entry.charge.magnitude, entry.field.params))
        .collect()
}

fn set_field_params(simulation: &mut Simulation, id: ChargeId, params: &FieldParams) -> Outcome {
    let valid = params.r.is_finite() && params.r >= 0.0 && params.delta.is_finite() && params.delta > 0.0;
    if !valid {
        return Outcome::Ignored;
    }
    match simulation.charges_mut().get_mut(id) {
        Some(entry) if entry.field.params != *params => {
            entry.field.params = *params;
            Outcome::GeometryChanged
        }
        _ => Outcome::Ignored,
    }
}
