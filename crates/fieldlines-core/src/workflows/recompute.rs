use crate::core::models::ids::SimulationId;
use crate::core::models::project::Project;
use crate::core::models::simulation::{Simulation, SimulationState};
use crate::engine::compute::{apply_results, compute_fields_with, field_specs};
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

/// Which simulations of a project to retrace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Active,
    /// Position in tab order.
    Index(usize),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecomputeSummary {
    pub simulations: usize,
    pub fields: usize,
    pub lines: usize,
}

/// Retraces the selected simulations in place, blocking until done.
///
/// Unlike the scheduler this applies results to inactive simulations too; the
/// caller owns the project for the whole call, so nothing can go stale.
#[instrument(skip_all, name = "recompute_workflow")]
pub fn run(
    project: &mut Project,
    selection: Selection,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<RecomputeSummary, EngineError> {
    let targets = resolve_selection(project, selection)?;
    info!(simulations = targets.len(), "Starting recompute.");

    let mut summary = RecomputeSummary::default();
    for id in targets {
        let simulation = project
            .get_mut(id)
            .ok_or(EngineError::SimulationNotFound(id))?;

        reporter.report(Progress::PhaseStart { name: "Tracing" });
        reporter.message(format!("Tracing '{}'", simulation.name));
        let lines = recompute_simulation(simulation, config, reporter);
        reporter.report(Progress::PhaseFinish);

        summary.simulations += 1;
        summary.fields += simulation.charges().len();
        summary.lines += lines;
    }

    info!(
        simulations = summary.simulations,
        fields = summary.fields,
        lines = summary.lines,
        "Recompute finished."
    );
    Ok(summary)
}

/// Retraces one simulation and returns the number of lines it now holds.
pub fn recompute_simulation(
    simulation: &mut Simulation,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> usize {
    let specs = field_specs(simulation);
    let results = compute_fields_with(
        simulation.width,
        simulation.height,
        &specs,
        &config.trace,
        reporter,
    );
    let lines = results.iter().map(|result| result.lines.len()).sum();
    apply_results(simulation, results);
    simulation.set_state(SimulationState::Resting);
    lines
}

fn resolve_selection(
    project: &Project,
    selection: Selection,
) -> Result<Vec<SimulationId>, EngineError> {
    match selection {
        Selection::Active => project
            .active_id()
            .map(|id| vec![id])
            .ok_or(EngineError::NoActiveSimulation),
        Selection::Index(index) => project.id_at(index).map(|id| vec![id]).ok_or_else(|| {
            EngineError::InvalidSelection(format!(
                "index {} is out of range for {} simulation(s)",
                index,
                project.len()
            ))
        }),
        Selection::All => {
            if project.is_empty() {
                warn!("Project has no simulations; nothing to recompute.");
            }
            Ok(project.ids().to_vec())
        }
    }
}
