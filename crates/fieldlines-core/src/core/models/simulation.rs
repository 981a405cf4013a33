use super::charge::{Charge, ChargeState, Polarity};
use super::field::{Field, FieldParams};
use super::ids::ChargeId;
use super::settings::Settings;
use nalgebra::{Point2, Vector2};
use std::collections::BTreeMap;

/// Whether a simulation is waiting on a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationState {
    /// A recompute request is outstanding; the visible lines may be stale.
    Running,
    /// The lines reflect the most recently issued request.
    #[default]
    Resting,
}

/// A charge together with the field it sources. Both share one lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeEntry {
    pub charge: Charge,
    pub field: Field,
}

/// Storage for the charges of one simulation.
///
/// Entries are kept in id order, which is also creation order because ids are
/// allocated monotonically. The store is the only place where interaction
/// states are written, so it can guarantee that at most one charge is
/// selected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChargeStore {
    entries: BTreeMap<ChargeId, ChargeEntry>,
    next_id: u64,
}

impl ChargeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ChargeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: ChargeId) -> Option<&ChargeEntry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: ChargeId) -> Option<&mut ChargeEntry> {
        self.entries.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargeEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChargeEntry> {
        self.entries.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = ChargeId> + '_ {
        self.entries.keys().copied()
    }

    /// The id the next inserted charge will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Inserts a new charge and its field, allocating a fresh id.
    pub fn add(&mut self, position: Point2<f64>, magnitude: f64, params: FieldParams) -> ChargeId {
        let id = ChargeId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            ChargeEntry {
                charge: Charge::new(id, position, magnitude),
                field: Field::new(params),
            },
        );
        id
    }

    /// Inserts an entry under an id chosen by the caller, as done when a
    /// persisted simulation is restored.
    ///
    /// Returns `false` without touching the store if the id is already taken
    /// or not below [`ChargeId::LIMIT`]. The id counter is advanced past `id`
    /// so it is never handed out again.
    pub fn restore(&mut self, charge: Charge, field: Field) -> bool {
        let id = charge.id;
        if id.0 >= ChargeId::LIMIT || self.entries.contains_key(&id) {
            return false;
        }
        if charge.state.is_selected() {
            self.clear_states();
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.entries.insert(id, ChargeEntry { charge, field });
        true
    }

    /// Raises the id counter; never lowers it. Counters above
    /// [`ChargeId::LIMIT`] are refused with `false`.
    pub fn reserve_ids_below(&mut self, next_id: u64) -> bool {
        if next_id > ChargeId::LIMIT {
            return false;
        }
        self.next_id = self.next_id.max(next_id);
        true
    }

    pub fn remove(&mut self, id: ChargeId) -> Option<ChargeEntry> {
        self.entries.remove(&id)
    }

    /// Copies a charge and its field parameters under a fresh id, shifted by
    /// `offset`. Cached lines are not copied.
    pub fn duplicate(&mut self, id: ChargeId, offset: Vector2<f64>) -> Option<ChargeId> {
        let source = self.entries.get(&id)?;
        let position = source.charge.position + offset;
        let magnitude = source.charge.magnitude;
        let params = source.field.params;
        Some(self.add(position, magnitude, params))
    }

    /// The charge currently selected or being dragged, if any.
    pub fn selected(&self) -> Option<ChargeId> {
        self.entries
            .values()
            .find(|entry| entry.charge.state.is_selected())
            .map(|entry| entry.charge.id)
    }

    /// The charge currently being dragged, with its grab offset.
    pub fn dragging(&self) -> Option<(ChargeId, Vector2<f64>)> {
        self.entries
            .values()
            .find_map(|entry| match entry.charge.state {
                ChargeState::Dragging { grab_offset } => Some((entry.charge.id, grab_offset)),
                _ => None,
            })
    }

    /// Puts `id` into `state`, resetting every other charge to `Idle`.
    ///
    /// Returns `false` if the charge does not exist; nothing changes then.
    pub fn set_state(&mut self, id: ChargeId, state: ChargeState) -> bool {
        if !self.entries.contains_key(&id) {
            return false;
        }
        for entry in self.entries.values_mut() {
            entry.charge.state = if entry.charge.id == id {
                state
            } else {
                ChargeState::Idle
            };
        }
        true
    }

    pub fn select(&mut self, id: ChargeId) -> bool {
        self.set_state(id, ChargeState::Selected)
    }

    pub fn clear_states(&mut self) {
        for entry in self.entries.values_mut() {
            entry.charge.state = ChargeState::Idle;
        }
    }
}

/// One independent scene: a canvas size, its charges and their settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub settings: Settings,
    charges: ChargeStore,
    state: SimulationState,
}

impl Simulation {
    pub fn new(name: &str, width: f64, height: f64, settings: Settings) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            settings,
            charges: ChargeStore::new(),
            state: SimulationState::Resting,
        }
    }

    pub fn charges(&self) -> &ChargeStore {
        &self.charges
    }

    pub fn charges_mut(&mut self) -> &mut ChargeStore {
        &mut self.charges
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SimulationState) {
        self.state = state;
    }

    pub fn charge(&self, id: ChargeId) -> Option<&Charge> {
        self.charges.get(id).map(|entry| &entry.charge)
    }

    pub fn field(&self, id: ChargeId) -> Option<&Field> {
        self.charges.get(id).map(|entry| &entry.field)
    }

    /// Creates a charge of the given polarity at `position`, with magnitude
    /// and field parameters taken from the current settings.
    pub fn add_charge(&mut self, position: Point2<f64>, polarity: Polarity) -> ChargeId {
        let magnitude = self.settings.magnitude.abs() * polarity.direction_sign();
        self.charges
            .add(position, magnitude, self.settings.field_params())
    }

    /// Pushes the current settings onto every existing charge and field.
    ///
    /// Field parameters are overwritten and each magnitude takes the settings
    /// magnitude while keeping its own sign.
    pub fn push_settings_to_fields(&mut self) {
        let params = self.settings.field_params();
        let magnitude = self.settings.magnitude.abs();
        for entry in self.charges.iter_mut() {
            entry.field.params = params;
            entry.charge.magnitude = magnitude * entry.charge.polarity().direction_sign();
        }
    }

    /// Changes the canvas size. Returns `true` when the bounds actually changed.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}
