use super::traits::JsonDocument;
use super::{PointRecord, ProjectIoError};
use crate::core::models::charge::{Charge, ChargeState};
use crate::core::models::field::{Field, FieldParams};
use crate::core::models::ids::ChargeId;
use crate::core::models::project::Project;
use crate::core::models::settings::Settings;
use crate::core::models::simulation::Simulation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// On-disk form of a [`Project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub simulations: Vec<SimulationRecord>,
    pub active_simulation: usize,
    #[serde(default)]
    pub default_simulation_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    #[serde(default)]
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub next_charge_id: u64,
    /// Kept as raw JSON so malformed individual fields can be skipped.
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub charges: Vec<ChargeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRecord {
    pub id: ChargeId,
    pub position: PointRecord,
    pub magnitude: f64,
    #[serde(default)]
    pub selected: bool,
    pub field: FieldParams,
}

impl JsonDocument for ProjectDocument {}

impl ProjectDocument {
    pub fn from_project(project: &Project) -> Result<Self, ProjectIoError> {
        let simulations = project
            .iter()
            .map(|(_, simulation)| SimulationRecord::from_simulation(simulation))
            .collect::<Result<Vec<_>, _>>()?;
        let active_simulation = project
            .active_id()
            .and_then(|id| project.index_of(id))
            .unwrap_or(0);

        Ok(Self {
            simulations,
            active_simulation,
            default_simulation_index: project.default_index(),
        })
    }

    /// Builds a project from the document, validating it as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectIoError::Invalid`] if any simulation or charge is
    /// inconsistent, or if the active index does not name a simulation.
    pub fn into_project(self) -> Result<Project, ProjectIoError> {
        let mut project = Project::new();

        if !self.simulations.is_empty() && self.active_simulation >= self.simulations.len() {
            return Err(ProjectIoError::Invalid(format!(
                "active simulation index {} is out of range ({} simulations)",
                self.active_simulation,
                self.simulations.len()
            )));
        }

        for (index, record) in self.simulations.into_iter().enumerate() {
            let simulation = record
                .into_simulation()
                .map_err(|e| ProjectIoError::Invalid(format!("simulation {}: {}", index, e)))?;
            project.add_simulation(simulation);
        }

        if let Some(id) = project.id_at(self.active_simulation) {
            project.set_active(id);
        }
        if !project.set_default_index(self.default_simulation_index) && !project.is_empty() {
            warn!(
                index = self.default_simulation_index,
                "Default simulation index out of range; using 0."
            );
        }

        debug!(simulations = project.len(), "Decoded project document.");
        Ok(project)
    }
}

impl SimulationRecord {
    pub fn from_simulation(simulation: &Simulation) -> Result<Self, ProjectIoError> {
        let charges = simulation
            .charges()
            .iter()
            .map(|entry| ChargeRecord {
                id: entry.charge.id,
                position: entry.charge.position.into(),
                magnitude: entry.charge.magnitude,
                selected: entry.charge.is_selected(),
                field: entry.field.params,
            })
            .collect();

        Ok(Self {
            name: simulation.name.clone(),
            width: simulation.width,
            height: simulation.height,
            next_charge_id: simulation.charges().next_id(),
            settings: serde_json::to_value(&simulation.settings)?,
            charges,
        })
    }

    fn into_simulation(self) -> Result<Simulation, String> {
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0) {
            return Err(format!("invalid size {}x{}", self.width, self.height));
        }

        let mut settings = Settings::default();
        match &self.settings {
            Value::Object(fields) => {
                settings.apply_update(fields);
            }
            Value::Null => {}
            other => warn!(value = %other, "Ignoring non-object settings; using defaults."),
        }

        let mut simulation = Simulation::new(&self.name, self.width, self.height, settings);
        let store = simulation.charges_mut();
        for record in self.charges {
            validate_charge(&record)?;
            let mut charge = Charge::new(record.id, record.position.into(), record.magnitude);
            if record.selected {
                charge.state = ChargeState::Selected;
            }
            if !store.restore(charge, Field::new(record.field)) {
                return Err(format!("duplicate charge id {}", record.id));
            }
        }
        if !store.reserve_ids_below(self.next_charge_id) {
            return Err(format!("charge id counter {} is out of range", self.next_charge_id));
        }
        Ok(simulation)
    }
}

fn validate_charge(record: &ChargeRecord) -> Result<(), String> {
    if record.id.0 >= ChargeId::LIMIT {
        return Err(format!("charge id {} is out of range", record.id.0));
    }
    let p = record.position;
    if !(p.x.is_finite() && p.y.is_finite() && record.magnitude.is_finite()) {
        return Err(format!("charge {} has a non-finite position or magnitude", record.id));
    }
    if record.magnitude == 0.0 {
        return Err(format!("charge {} has zero magnitude", record.id));
    }
    if !(record.field.r.is_finite() && record.field.r >= 0.0) {
        return Err(format!("charge {} has an invalid radius", record.id));
    }
    if !(record.field.delta.is_finite() && record.field.delta > 0.0) {
        return Err(format!("charge {} has a non-positive delta", record.id));
    }
    Ok(())
}

impl Project {
    pub fn to_json(&self) -> Result<String, ProjectIoError> {
        ProjectDocument::from_project(self)?.to_json_string()
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectIoError> {
        ProjectDocument::from_json_str(json)?.into_project()
    }

    /// Replaces this project with the one encoded in `json`.
    ///
    /// The document is fully parsed and validated first; on any error `self`
    /// is left exactly as it was.
    pub fn replace_from_json(&mut self, json: &str) -> Result<(), ProjectIoError> {
        let loaded = Self::from_json(json)?;
        *self = loaded;
        Ok(())
    }
}
