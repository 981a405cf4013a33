use super::compute::{FieldResult, FieldSpec, apply_results, compute_fields_with, field_specs};
use super::error::EngineError;
use super::progress::ProgressReporter;
use crate::core::models::ids::SimulationId;
use crate::core::models::project::Project;
use crate::core::models::simulation::SimulationState;
use crate::core::physics::Tolerances;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, trace, warn};

/// Identifies one recompute request of one simulation. Later requests of the
/// same simulation carry larger tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTag(u64);

impl RequestTag {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// What a worker produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOutput {
    Traced(Vec<FieldResult>),
    /// The request was already superseded when the worker picked it up.
    Skipped,
    /// The trace panicked.
    Failed,
}

/// The answer to one request, as sent back by a worker.
#[derive(Debug, Clone)]
pub struct ComputeResponse {
    pub simulation: SimulationId,
    pub tag: RequestTag,
    pub output: TraceOutput,
}

/// What happened to a delivered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied { fields: usize },
    /// A newer request for the same simulation exists.
    Superseded,
    /// The simulation is no longer the active one.
    Inactive,
    /// The simulation was removed from the project.
    Missing,
}

impl Delivery {
    pub fn is_applied(self) -> bool {
        matches!(self, Delivery::Applied { .. })
    }
}

struct Job {
    simulation: SimulationId,
    tag: RequestTag,
    width: f64,
    height: f64,
    fields: Vec<FieldSpec>,
    tolerances: Tolerances,
    latest: Arc<AtomicU64>,
    sender: UnboundedSender<ComputeResponse>,
}

impl Job {
    fn run(self) {
        let superseded = self.latest.load(Ordering::Acquire) != self.tag.0;
        let output = if superseded {
            trace!(tag = %self.tag, "Skipping superseded recompute.");
            TraceOutput::Skipped
        } else {
            guarded(|| {
                compute_fields_with(
                    self.width,
                    self.height,
                    &self.fields,
                    &self.tolerances,
                    &ProgressReporter::new(),
                )
            })
        };
        if output == TraceOutput::Failed {
            warn!(simulation = ?self.simulation, tag = %self.tag, "Recompute worker panicked.");
        }

        let response = ComputeResponse {
            simulation: self.simulation,
            tag: self.tag,
            output,
        };
        if self.sender.send(response).is_err() {
            trace!("Scheduler dropped before a recompute finished.");
        }
    }
}

/// Runs a trace so that a panic still yields a response.
fn guarded(trace: impl FnOnce() -> Vec<FieldResult>) -> TraceOutput {
    match catch_unwind(AssertUnwindSafe(trace)) {
        Ok(results) => TraceOutput::Traced(results),
        Err(_) => TraceOutput::Failed,
    }
}

#[cfg(feature = "parallel")]
fn spawn(job: Job) {
    rayon::spawn(move || job.run());
}

#[cfg(not(feature = "parallel"))]
fn spawn(job: Job) {
    std::thread::spawn(move || job.run());
}

/// Runs traces off the caller's path and applies only the freshest result of
/// each simulation.
///
/// Every request gets a tag from a per-simulation counter. A response is
/// applied only if its simulation is still active and its tag is still the
/// latest one issued for it; anything else is discarded. Workers read the same
/// counter to skip requests that were superseded before they started.
pub struct RecomputeScheduler {
    tolerances: Tolerances,
    latest: HashMap<SimulationId, Arc<AtomicU64>>,
    in_flight: usize,
    sender: UnboundedSender<ComputeResponse>,
    receiver: UnboundedReceiver<ComputeResponse>,
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self::new(Tolerances::default())
    }
}

impl RecomputeScheduler {
    pub fn new(tolerances: Tolerances) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            tolerances,
            latest: HashMap::new(),
            in_flight: 0,
            sender,
            receiver,
        }
    }

    /// Issues a request and returns at once; the trace runs on a worker.
    pub fn request(
        &mut self,
        simulation: SimulationId,
        width: f64,
        height: f64,
        fields: Vec<FieldSpec>,
    ) -> RequestTag {
        let latest = Arc::clone(self.latest.entry(simulation).or_default());
        let tag = RequestTag(latest.fetch_add(1, Ordering::AcqRel) + 1);
        debug!(?simulation, %tag, fields = fields.len(), "Requesting recompute.");

        self.in_flight += 1;
        spawn(Job {
            simulation,
            tag,
            width,
            height,
            fields,
            tolerances: self.tolerances,
            latest,
            sender: self.sender.clone(),
        });
        tag
    }

    /// Snapshots a simulation of `project`, marks it running and requests a
    /// recompute of it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SimulationNotFound`] if `simulation` is not part
    /// of the project.
    pub fn request_simulation(
        &mut self,
        project: &mut Project,
        simulation: SimulationId,
    ) -> Result<RequestTag, EngineError> {
        let target = project
            .get_mut(simulation)
            .ok_or(EngineError::SimulationNotFound(simulation))?;
        let fields = field_specs(target);
        let (width, height) = (target.width, target.height);
        target.set_state(SimulationState::Running);
        Ok(self.request(simulation, width, height, fields))
    }

    /// Requests a recompute of the active simulation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoActiveSimulation`] for an empty project.
    pub fn request_active(&mut self, project: &mut Project) -> Result<RequestTag, EngineError> {
        let active = project.active_id().ok_or(EngineError::NoActiveSimulation)?;
        self.request_simulation(project, active)
    }

    /// Applies one response under the staleness rules.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerFailed`] if the worker panicked while
    /// tracing. The simulation keeps its lines and stays running.
    pub fn accept(
        &self,
        project: &mut Project,
        response: ComputeResponse,
    ) -> Result<Delivery, EngineError> {
        let ComputeResponse {
            simulation,
            tag,
            output,
        } = response;
        let results = match output {
            TraceOutput::Traced(results) => Some(results),
            TraceOutput::Skipped => None,
            TraceOutput::Failed => return Err(EngineError::WorkerFailed { simulation, tag }),
        };

        let is_active = project.is_active(simulation);
        let Some(target) = project.get_mut(simulation) else {
            debug!(?simulation, %tag, "Discarding result for a removed simulation.");
            return Ok(Delivery::Missing);
        };
        if !is_active {
            debug!(?simulation, %tag, "Discarding result for an inactive simulation.");
            return Ok(Delivery::Inactive);
        }
        if self.latest_tag(simulation) != Some(tag) {
            debug!(?simulation, %tag, "Discarding superseded result.");
            return Ok(Delivery::Superseded);
        }
        let Some(results) = results else {
            return Ok(Delivery::Superseded);
        };

        let fields = apply_results(target, results);
        target.set_state(SimulationState::Resting);
        debug!(?simulation, %tag, fields, "Applied recompute result.");
        Ok(Delivery::Applied { fields })
    }

    /// Applies every response that has already arrived, without waiting.
    /// Returns the number of responses that were applied.
    ///
    /// # Errors
    ///
    /// Stops at the first failed worker, see [`accept`](Self::accept).
    pub fn try_deliver(&mut self, project: &mut Project) -> Result<usize, EngineError> {
        let mut applied = 0;
        while let Ok(response) = self.receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if self.accept(project, response)?.is_applied() {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Waits for the next response and applies it. Returns `None` when no
    /// request is in flight.
    ///
    /// Every issued request answers exactly once, so the wait always ends.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerFailed`] for a response whose trace
    /// panicked.
    pub async fn deliver_next(
        &mut self,
        project: &mut Project,
    ) -> Result<Option<Delivery>, EngineError> {
        if self.in_flight == 0 {
            return Ok(None);
        }
        // The scheduler holds a sender itself, so the channel cannot close.
        let Some(response) = self.receiver.recv().await else {
            return Ok(None);
        };
        self.in_flight -= 1;
        self.accept(project, response).map(Some)
    }

    /// Waits until every issued request has been delivered.
    pub async fn settle(&mut self, project: &mut Project) -> Result<(), EngineError> {
        while self.deliver_next(project).await?.is_some() {}
        Ok(())
    }

    pub fn latest_tag(&self, simulation: SimulationId) -> Option<RequestTag> {
        self.latest
            .get(&simulation)
            .map(|latest| latest.load(Ordering::Acquire))
            .filter(|&tag| tag > 0)
            .map(RequestTag)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Stops tracking a simulation; any of its responses still in flight will
    /// be discarded.
    pub fn forget(&mut self, simulation: SimulationId) {
        self.latest.remove(&simulation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::charge::Polarity;
    use crate::core::models::settings::Settings;
    use crate::core::models::simulation::Simulation;
    use crate::engine::compute::compute_fields;
    use crate::engine::interaction::{Action, InteractionController};
    use crate::engine::config::InteractionConfig;
    use crate::core::io::PointRecord;
    use nalgebra::Point2;

    fn small_settings() -> Settings {
        Settings {
            density: 6,
            steps: 150,
            ..Settings::default()
        }
    }

    fn project_with(names: &[&str]) -> (Project, Vec<SimulationId>) {
        let mut project = Project::new();
        let ids = names
            .iter()
            .map(|name| {
                let mut simulation = Simulation::new(name, 400.0, 300.0, small_settings());
                simulation.add_charge(Point2::new(150.0, 150.0), Polarity::Positive);
                simulation.add_charge(Point2::new(250.0, 150.0), Polarity::Negative);
                project.add_simulation(simulation)
            })
            .collect();
        (project, ids)
    }

    fn traced(project: &Project, id: SimulationId) -> Vec<FieldResult> {
        let simulation = project.get(id).unwrap();
        let specs = field_specs(simulation);
        compute_fields(simulation.width, simulation.height, &specs)
    }

    fn visible(project: &Project, id: SimulationId) -> Vec<FieldResult> {
        project
            .get(id)
            .unwrap()
            .charges()
            .iter()
            .map(|entry| FieldResult::from_lines(entry.charge.id, entry.field.lines()))
            .collect()
    }

    fn move_first_charge(project: &mut Project, id: SimulationId, x: f64) {
        let simulation = project.get_mut(id).unwrap();
        let first = simulation.charges().ids().next().unwrap();
        simulation.charges_mut().get_mut(first).unwrap().charge.position.x = x;
    }

    #[tokio::test]
    async fn settle_applies_request_and_rests_simulation() {
        let (mut project, ids) = project_with(&["main"]);
        let mut scheduler = RecomputeScheduler::default();

        let tag = scheduler.request_active(&mut project).unwrap();
        assert_eq!(project.get(ids[0]).unwrap().state(), SimulationState::Running);
        assert_eq!(scheduler.latest_tag(ids[0]), Some(tag));

        scheduler.settle(&mut project).await.unwrap();

        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(project.get(ids[0]).unwrap().state(), SimulationState::Resting);
        assert_eq!(visible(&project, ids[0]), traced(&project, ids[0]));
    }

    #[tokio::test]
    async fn last_request_wins_even_when_older_result_arrives_later() {
        let (mut project, ids) = project_with(&["main"]);
        let id = ids[0];
        let mut scheduler = RecomputeScheduler::default();

        let first_results = traced(&project, id);
        let first = scheduler.request_simulation(&mut project, id).unwrap();
        move_first_charge(&mut project, id, 120.0);
        let second_results = traced(&project, id);
        let second = scheduler.request_simulation(&mut project, id).unwrap();
        assert!(second > first);

        let newer = ComputeResponse {
            simulation: id,
            tag: second,
            output: TraceOutput::Traced(second_results.clone()),
        };
        let older = ComputeResponse {
            simulation: id,
            tag: first,
            output: TraceOutput::Traced(first_results),
        };
        assert!(scheduler.accept(&mut project, newer).unwrap().is_applied());
        assert_eq!(scheduler.accept(&mut project, older).unwrap(), Delivery::Superseded);
        assert_eq!(visible(&project, id), second_results);

        scheduler.settle(&mut project).await.unwrap();
        assert_eq!(visible(&project, id), second_results);
    }

    #[tokio::test]
    async fn results_for_inactive_simulation_are_discarded() {
        let (mut project, ids) = project_with(&["first", "second"]);
        let mut scheduler = RecomputeScheduler::default();

        scheduler.request_simulation(&mut project, ids[0]).unwrap();
        project.set_active(ids[1]);
        scheduler.settle(&mut project).await.unwrap();

        let first = project.get(ids[0]).unwrap();
        assert!(first.charges().iter().all(|entry| entry.field.lines().is_empty()));
        assert_eq!(first.state(), SimulationState::Running);
    }

    #[tokio::test]
    async fn simulations_do_not_share_tags_or_lines() {
        let (mut project, ids) = project_with(&["first", "second"]);
        let mut scheduler = RecomputeScheduler::default();
        move_first_charge(&mut project, ids[1], 60.0);

        let a = scheduler.request_simulation(&mut project, ids[0]).unwrap();
        scheduler.request_simulation(&mut project, ids[1]).unwrap();
        scheduler.settle(&mut project).await.unwrap();
        assert_eq!(scheduler.latest_tag(ids[0]), Some(a));
        assert_eq!(visible(&project, ids[0]), traced(&project, ids[0]));

        project.set_active(ids[1]);
        scheduler.request_active(&mut project).unwrap();
        scheduler.settle(&mut project).await.unwrap();

        assert_eq!(visible(&project, ids[1]), traced(&project, ids[1]));
        assert_eq!(visible(&project, ids[0]), traced(&project, ids[0]));
        assert_ne!(visible(&project, ids[0]), visible(&project, ids[1]));
    }

    #[tokio::test]
    async fn removed_simulation_results_are_missing() {
        let (mut project, ids) = project_with(&["first", "second"]);
        let mut scheduler = RecomputeScheduler::default();

        scheduler.request_simulation(&mut project, ids[0]).unwrap();
        project.remove_simulation(ids[0]);
        scheduler.forget(ids[0]);

        let delivery = scheduler.deliver_next(&mut project).await.unwrap();
        assert_eq!(delivery, Some(Delivery::Missing));
        assert_eq!(scheduler.deliver_next(&mut project).await.unwrap(), None);
    }

    #[test]
    fn panicking_trace_becomes_failed_output() {
        let output = guarded(|| panic!("trace blew up"));
        assert_eq!(output, TraceOutput::Failed);
        assert_eq!(guarded(Vec::new), TraceOutput::Traced(Vec::new()));
    }

    #[tokio::test]
    async fn failed_worker_surfaces_as_error_instead_of_hanging() {
        let (mut project, ids) = project_with(&["main"]);
        let id = ids[0];
        let mut scheduler = RecomputeScheduler::default();
        let tag = scheduler.request_simulation(&mut project, id).unwrap();
        scheduler.settle(&mut project).await.unwrap();
        let lines = visible(&project, id);

        project.get_mut(id).unwrap().set_state(SimulationState::Running);
        scheduler.in_flight += 1;
        scheduler
            .sender
            .send(ComputeResponse {
                simulation: id,
                tag,
                output: TraceOutput::Failed,
            })
            .unwrap();

        let result = scheduler.settle(&mut project).await;
        assert!(matches!(
            result,
            Err(EngineError::WorkerFailed { simulation, tag: failed }) if simulation == id && failed == tag
        ));
        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(visible(&project, id), lines);
        assert_eq!(project.get(id).unwrap().state(), SimulationState::Running);
    }

    #[test]
    fn unknown_simulation_request_is_an_error() {
        let (mut project, ids) = project_with(&["only"]);
        project.remove_simulation(ids[0]);
        let mut scheduler = RecomputeScheduler::default();

        assert!(matches!(
            scheduler.request_simulation(&mut project, ids[0]),
            Err(EngineError::SimulationNotFound(_))
        ));
        assert!(matches!(
            scheduler.request_active(&mut project),
            Err(EngineError::NoActiveSimulation)
        ));
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn throttled_drag_still_traces_final_position() {
        let (mut project, ids) = project_with(&["main"]);
        let id = ids[0];
        let mut scheduler = RecomputeScheduler::default();
        let mut controller = InteractionController::new(InteractionConfig::default());
        let charge = project.get(id).unwrap().charges().ids().next().unwrap();
        let point = |x: f64| PointRecord { x, y: 150.0 };

        let actions = [
            Action::DragStart { id: charge, at: point(150.0) },
            Action::DragMove { at: point(140.0) },
            Action::DragMove { at: point(130.0) },
            Action::DragMove { at: point(100.0) },
            Action::DragEnd,
        ];
        for action in &actions {
            let outcome = controller.handle(project.active_mut().unwrap(), action);
            if outcome.needs_recompute() {
                scheduler.request_active(&mut project).unwrap();
            }
        }
        scheduler.settle(&mut project).await.unwrap();

        let simulation = project.get(id).unwrap();
        assert_eq!(simulation.charge(charge).unwrap().position, Point2::new(100.0, 150.0));
        assert_eq!(visible(&project, id), traced(&project, id));
    }
}
