use super::ids::SimulationId;
use super::simulation::Simulation;
use slotmap::SlotMap;

/// A session holding several independent simulations, one of which is active.
///
/// Simulations are addressed by [`SimulationId`]; a removed simulation's id is
/// never handed out again, so late results tagged with it can always be told
/// apart from results for a newer simulation.
#[derive(Debug, Clone, Default)]
pub struct Project {
    simulations: SlotMap<SimulationId, Simulation>,
    order: Vec<SimulationId>,
    active: Option<SimulationId>,
    default_index: usize,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a simulation. The first simulation added becomes active.
    pub fn add_simulation(&mut self, simulation: Simulation) -> SimulationId {
        let id = self.simulations.insert(simulation);
        self.order.push(id);
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    /// Removes a simulation. If it was active, the neighbouring simulation (or
    /// none) becomes active.
    pub fn remove_simulation(&mut self, id: SimulationId) -> Option<Simulation> {
        let simulation = self.simulations.remove(id)?;
        let index = self.order.iter().position(|&other| other == id);
        self.order.retain(|&other| other != id);

        if self.active == Some(id) {
            self.active = index
                .and_then(|i| self.order.get(i.min(self.order.len().saturating_sub(1))))
                .copied();
        }
        if self.default_index >= self.order.len() {
            self.default_index = self.order.len().saturating_sub(1);
        }
        Some(simulation)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: SimulationId) -> Option<&Simulation> {
        self.simulations.get(id)
    }

    pub fn get_mut(&mut self, id: SimulationId) -> Option<&mut Simulation> {
        self.simulations.get_mut(id)
    }

    /// Simulations in tab order.
    pub fn iter(&self) -> impl Iterator<Item = (SimulationId, &Simulation)> {
        self.order
            .iter()
            .filter_map(|&id| self.simulations.get(id).map(|sim| (id, sim)))
    }

    pub fn ids(&self) -> &[SimulationId] {
        &self.order
    }

    pub fn id_at(&self, index: usize) -> Option<SimulationId> {
        self.order.get(index).copied()
    }

    pub fn index_of(&self, id: SimulationId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    pub fn active_id(&self) -> Option<SimulationId> {
        self.active
    }

    pub fn is_active(&self, id: SimulationId) -> bool {
        self.active == Some(id)
    }

    pub fn active(&self) -> Option<&Simulation> {
        self.active.and_then(|id| self.simulations.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Simulation> {
        self.active.and_then(|id| self.simulations.get_mut(id))
    }

    /// Makes `id` the active simulation. Returns `false` for unknown ids.
    pub fn set_active(&mut self, id: SimulationId) -> bool {
        if self.simulations.contains_key(id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    pub fn set_default_index(&mut self, index: usize) -> bool {
        if index < self.order.len() {
            self.default_index = index;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::settings::Settings;

    fn sim(name: &str) -> Simulation {
        Simulation::new(name, 100.0, 100.0, Settings::default())
    }

    #[test]
    fn first_simulation_becomes_active() {
        let mut project = Project::new();
        let a = project.add_simulation(sim("a"));
        let b = project.add_simulation(sim("b"));

        assert!(project.is_active(a));
        assert!(!project.is_active(b));
        assert_eq!(project.active().unwrap().name, "a");
    }

    #[test]
    fn removing_active_simulation_activates_neighbour() {
        let mut project = Project::new();
        let a = project.add_simulation(sim("a"));
        let b = project.add_simulation(sim("b"));
        let c = project.add_simulation(sim("c"));

        project.set_active(b);
        project.remove_simulation(b);
        assert_eq!(project.active_id(), Some(c));

        project.remove_simulation(c);
        assert_eq!(project.active_id(), Some(a));

        project.remove_simulation(a);
        assert_eq!(project.active_id(), None);
        assert!(project.is_empty());
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut project = Project::new();
        let a = project.add_simulation(sim("a"));
        project.remove_simulation(a);
        let b = project.add_simulation(sim("b"));

        assert_ne!(a, b);
        assert!(project.get(a).is_none());
        assert!(!project.set_active(a));
    }

    #[test]
    fn default_index_is_bounded() {
        let mut project = Project::new();
        project.add_simulation(sim("a"));
        let b = project.add_simulation(sim("b"));

        assert!(project.set_default_index(1));
        assert!(!project.set_default_index(2));
        project.remove_simulation(b);
        assert_eq!(project.default_index(), 0);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut project = Project::new();
        project.add_simulation(sim("first"));
        project.add_simulation(sim("second"));
        let names: Vec<_> = project.iter().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
