use std::collections::HashSet;
use log::info;

use super::{LaneChangeController, StepOutcome};
use crate::config::{Enrollment, Params};
use crate::planner::Decision;
use crate::simulation::TrafficSimulator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetStats {
    pub enrolled: u32,
    pub retired: u32,
    pub plans: u32,
    /// Lane changes the simulator accepted.
    pub lane_changes: u32,
    pub overrides: u32,
}

/// Result of one fleet tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub decisions: Vec<(String, Decision)>,
    pub deactivated: Vec<String>,
}

/// The managed set of controllers, in enrollment order.
pub struct ControllerFleet {
    params: Params,
    enrollment: Enrollment,
    controllers: Vec<LaneChangeController>,
    /// Managed or retired ids; retired ids are never enrolled again.
    known: HashSet<String>,
    stats: FleetStats,
}

impl ControllerFleet {
    pub fn new(params: Params, enrollment: Enrollment) -> Self {
        Self {
            params,
            enrollment,
            controllers: Vec::new(),
            known: HashSet::new(),
            stats: FleetStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn stats(&self) -> &FleetStats {
        &self.stats
    }

    pub fn vehicle_ids(&self) -> Vec<&str> {
        self.controllers.iter().map(|c| c.vehicle_id()).collect()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&LaneChangeController> {
        self.controllers.iter().find(|c| c.vehicle_id() == vehicle_id)
    }

    /// Add a controller for `vehicle_id`. Returns `false` if the id is already
    /// managed or was managed before.
    pub fn enroll(&mut self, vehicle_id: &str) -> bool {
        if !self.known.insert(vehicle_id.to_string()) {
            return false;
        }

        info!("Enrolled {} ({} managed)", vehicle_id, self.controllers.len() + 1);
        self.controllers.push(LaneChangeController::new(vehicle_id, self.params.clone()));
        self.stats.enrolled += 1;
        true
    }

    /// Enroll vehicles that appeared in the simulation since the last call.
    pub fn enroll_new_vehicles<S: TrafficSimulator + ?Sized>(&mut self, sim: &S) {
        let candidates: Vec<String> = match &self.enrollment {
            Enrollment::Explicit { vehicles } => vehicles
                .iter()
                .filter(|id| !self.known.contains(id.as_str()) && sim.vehicle_exists(id))
                .cloned()
                .collect(),
            Enrollment::Auto { vehicle_type } => sim
                .vehicle_ids()
                .into_iter()
                .filter(|id| !self.known.contains(id.as_str()))
                .filter(|id| sim.vehicle_type(id).as_deref() == Some(vehicle_type.as_str()))
                .collect(),
        };

        for id in candidates {
            self.enroll(&id);
        }
    }

    /// Enroll newcomers, step every controller once in enrollment order, then
    /// drop the ones that deactivated.
    pub fn tick<S: TrafficSimulator + ?Sized>(&mut self, sim: &mut S, sim_time: f64) -> TickReport {
        self.enroll_new_vehicles(&*sim);

        let mut report = TickReport::default();
        for controller in self.controllers.iter_mut() {
            match controller.step(sim, sim_time) {
                StepOutcome::Planned { decision, commanded } => {
                    self.stats.plans += 1;
                    if commanded {
                        self.stats.lane_changes += 1;
                    }
                    if decision.overridden {
                        self.stats.overrides += 1;
                    }
                    report.decisions.push((controller.vehicle_id().to_string(), decision));
                }
                StepOutcome::Deactivated => {
                    report.deactivated.push(controller.vehicle_id().to_string());
                }
                StepOutcome::Waiting | StepOutcome::Skipped | StepOutcome::Inactive => {}
            }
        }

        if !report.deactivated.is_empty() {
            self.controllers.retain(|c| c.is_active());
            self.stats.retired += report.deactivated.len() as u32;
        }

        report
    }
}
