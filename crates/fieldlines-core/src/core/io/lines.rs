use super::PointRecord;
use super::traits::JsonDocument;
use crate::core::models::charge::Polarity;
use crate::core::models::field::Termination;
use crate::core::models::ids::ChargeId;
use crate::core::models::project::Project;
use crate::core::models::simulation::Simulation;
use serde::{Deserialize, Serialize};

/// Everything a renderer needs to draw the traced scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinesDocument {
    pub simulations: Vec<SimulationLines>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLines {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub active: bool,
    pub show_source_value: bool,
    pub fields: Vec<FieldLines>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLines {
    pub source_id: ChargeId,
    pub position: PointRecord,
    pub magnitude: f64,
    pub polarity: Polarity,
    pub selected: bool,
    pub r: f64,
    pub lines: Vec<Vec<PointRecord>>,
    pub terminations: Vec<Termination>,
}

impl JsonDocument for LinesDocument {}

impl LinesDocument {
    /// Collects the simulations accepted by `filter`, in tab order.
    pub fn from_project<F>(project: &Project, mut filter: F) -> Self
    where
        F: FnMut(usize, &Simulation) -> bool,
    {
        let simulations = project
            .iter()
            .enumerate()
            .filter(|(index, (_, simulation))| filter(*index, simulation))
            .map(|(_, (id, simulation))| SimulationLines::new(simulation, project.is_active(id)))
            .collect();
        Self { simulations }
    }

    pub fn line_count(&self) -> usize {
        self.simulations
            .iter()
            .flat_map(|s| &s.fields)
            .map(|f| f.lines.len())
            .sum()
    }
}

impl SimulationLines {
    pub fn new(simulation: &Simulation, active: bool) -> Self {
        let fields = simulation
            .charges()
            .iter()
            .map(|entry| FieldLines {
                source_id: entry.charge.id,
                position: entry.charge.position.into(),
                magnitude: entry.charge.magnitude,
                polarity: entry.charge.polarity(),
                selected: entry.charge.is_selected(),
                r: entry.field.params.r,
                lines: entry
                    .field
                    .lines()
                    .iter()
                    .map(|line| line.points.iter().map(PointRecord::from).collect())
                    .collect(),
                terminations: entry.field.lines().iter().map(|l| l.termination).collect(),
            })
            .collect();

        Self {
            name: simulation.name.clone(),
            width: simulation.width,
            height: simulation.height,
            active,
            show_source_value: simulation.settings.show_source_value,
            fields,
        }
    }
}
