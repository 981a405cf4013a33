use crate::core::models::project::Project;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::interaction::{Action, InteractionController, Outcome};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scheduler::RecomputeScheduler;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub actions: usize,
    pub ignored: usize,
    pub throttled: usize,
    /// Recompute requests issued, including the initial trace.
    pub requests: usize,
    /// Results applied to the simulation; superseded ones are not counted.
    pub applied: usize,
}

/// Plays `actions` against the active simulation of `project`.
///
/// The active simulation is traced once up front, then every action goes
/// through the interaction controller. Geometry changes issue recompute
/// requests without waiting for them; results that have already arrived are
/// applied between actions. Returns once every request has been delivered, so
/// the visible lines reflect the final state of the charges.
#[instrument(skip_all, name = "replay_workflow")]
pub async fn run(
    project: &mut Project,
    actions: &[Action],
    config: &EngineConfig,
    reporter: &ProgressReporter<'_>,
) -> Result<ReplaySummary, EngineError> {
    let active = project.active_id().ok_or(EngineError::NoActiveSimulation)?;
    info!(actions = actions.len(), "Starting replay.");

    let mut controller = InteractionController::new(config.interaction.clone());
    let mut scheduler = RecomputeScheduler::new(config.trace);
    let mut summary = ReplaySummary::default();

    scheduler.request_simulation(project, active)?;
    summary.requests += 1;

    reporter.report(Progress::PhaseStart { name: "Replaying" });
    for action in actions {
        if controller.poll().needs_recompute() {
            scheduler.request_simulation(project, active)?;
            summary.requests += 1;
        }

        let simulation = project
            .get_mut(active)
            .ok_or(EngineError::SimulationNotFound(active))?;

        match controller.handle(simulation, action) {
            Outcome::GeometryChanged => {
                scheduler.request_simulation(project, active)?;
                summary.requests += 1;
            }
            Outcome::Throttled => summary.throttled += 1,
            Outcome::Ignored => {
                debug!(?action, "Action had no effect.");
                summary.ignored += 1;
            }
            Outcome::Redraw => {}
        }
        summary.actions += 1;
        summary.applied += scheduler.try_deliver(project)?;
    }
    // A script may stop mid-drag; the last position still has to be traced.
    if controller.release_pending().needs_recompute() {
        scheduler.request_simulation(project, active)?;
        summary.requests += 1;
    }
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Settling" });
    while let Some(delivery) = scheduler.deliver_next(project).await? {
        if delivery.is_applied() {
            summary.applied += 1;
        }
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        actions = summary.actions,
        requests = summary.requests,
        applied = summary.applied,
        "Replay finished."
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::PointRecord;
    use crate::core::models::charge::Polarity;
    use crate::core::models::ids::ChargeId;
    use crate::core::models::settings::Settings;
    use crate::core::models::simulation::{Simulation, SimulationState};
    use crate::engine::config::EngineConfigBuilder;
    use crate::workflows::recompute::recompute_simulation;
    use nalgebra::Point2;

    fn project() -> Project {
        let settings = Settings {
            density: 4,
            steps: 200,
            ..Settings::default()
        };
        let mut simulation = Simulation::new("replay", 600.0, 400.0, settings);
        simulation.add_charge(Point2::new(200.0, 200.0), Polarity::Positive);
        let mut project = Project::new();
        project.add_simulation(simulation);
        project
    }

    #[tokio::test]
    async fn replay_ends_with_lines_of_final_state() {
        let mut project = project();
        let actions = vec![
            Action::AddCharge {
                at: PointRecord { x: 400.0, y: 200.0 },
                polarity: Polarity::Negative,
            },
            Action::Click { id: ChargeId(0) },
            Action::Scroll { id: ChargeId(0), direction: 3.0 },
            Action::DoubleClick { id: ChargeId(1) },
            Action::Delete { id: ChargeId(7) },
        ];

        let summary = run(
            &mut project,
            &actions,
            &EngineConfig::default(),
            &ProgressReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.actions, 5);
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.requests, 4);
        assert!(summary.applied >= 1);

        let simulation = project.active().unwrap();
        assert_eq!(simulation.state(), SimulationState::Resting);
        assert_eq!(simulation.charges().selected(), Some(ChargeId(0)));
        assert_eq!(simulation.charge(ChargeId(1)).unwrap().magnitude, 1.0);

        let mut expected = simulation.clone();
        recompute_simulation(&mut expected, &EngineConfig::default(), &ProgressReporter::new());
        assert_eq!(simulation.charges(), expected.charges());
    }

    #[tokio::test]
    async fn replay_stopping_mid_drag_traces_last_position() {
        let mut project = project();
        let actions = vec![
            Action::DragStart {
                id: ChargeId(0),
                at: PointRecord { x: 200.0, y: 200.0 },
            },
            Action::DragMove {
                at: PointRecord { x: 210.0, y: 200.0 },
            },
            Action::DragMove {
                at: PointRecord { x: 300.0, y: 200.0 },
            },
        ];
        let config = EngineConfigBuilder::new()
            .drag_throttle(std::time::Duration::from_secs(3600))
            .build()
            .unwrap();

        let summary = run(&mut project, &actions, &config, &ProgressReporter::new())
            .await
            .unwrap();

        assert_eq!(summary.throttled, 1);
        assert_eq!(summary.requests, 3);

        let simulation = project.active().unwrap();
        assert_eq!(simulation.state(), SimulationState::Resting);
        assert_eq!(
            simulation.charge(ChargeId(0)).unwrap().position,
            Point2::new(300.0, 200.0)
        );

        let mut expected = simulation.clone();
        recompute_simulation(&mut expected, &config, &ProgressReporter::new());
        assert_eq!(simulation.charges(), expected.charges());
    }

    #[tokio::test]
    async fn replay_without_simulations_fails() {
        let mut project = Project::new();
        let result = run(
            &mut project,
            &[],
            &EngineConfig::default(),
            &ProgressReporter::new(),
        )
        .await;
        assert!(matches!(result, Err(EngineError::NoActiveSimulation)));
    }
}
