use super::scheduler::RequestTag;
use crate::core::models::ids::SimulationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Simulation not found: {0:?}")]
    SimulationNotFound(SimulationId),

    #[error("No active simulation")]
    NoActiveSimulation,

    #[error("Invalid simulation selection: {0}")]
    InvalidSelection(String),

    #[error("Recompute {tag} of simulation {simulation:?} failed in its worker")]
    WorkerFailed {
        simulation: SimulationId,
        tag: RequestTag,
    },
}
