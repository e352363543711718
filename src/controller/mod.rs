use log::{debug, info, warn};

use crate::config::Params;
use crate::planner::{Decision, LaneOffset, Planner};
use crate::simulation::{SimError, StateSampler, TrafficSimulator};

pub mod fleet;

pub use fleet::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Active,
    /// Terminal. The vehicle left the simulation.
    Inactive,
}

/// What a single [`LaneChangeController::step`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Already inactive; nothing queried.
    Inactive,
    /// The vehicle was gone on this call.
    Deactivated,
    /// Next replan time not reached yet.
    Waiting,
    /// The vehicle is present but its state could not be read this tick
    /// (e.g. it sits on a junction-internal edge). Retried on the next call.
    Skipped,
    /// A planning cycle ran. `commanded` is set when a lane change was
    /// accepted by the simulator.
    Planned { decision: Decision, commanded: bool },
}

/// Lane-change controller for one vehicle.
pub struct LaneChangeController {
    vehicle_id: String,
    params: Params,
    planner: Planner,
    next_replan: f64,
    state: ControllerState,
}

impl LaneChangeController {
    pub fn new(vehicle_id: impl Into<String>, params: Params) -> Self {
        let planner = Planner::new(&params);
        Self {
            vehicle_id: vehicle_id.into(),
            params,
            planner,
            next_replan: 0.0,
            state: ControllerState::Active,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ControllerState::Active
    }

    pub fn next_replan(&self) -> f64 {
        self.next_replan
    }

    pub fn step<S: TrafficSimulator + ?Sized>(&mut self, sim: &mut S, sim_time: f64) -> StepOutcome {
        if !self.is_active() {
            return StepOutcome::Inactive;
        }

        if !StateSampler::is_present(&*sim, &self.vehicle_id) {
            self.deactivate("left the simulation");
            return StepOutcome::Deactivated;
        }

        if sim_time < self.next_replan {
            return StepOutcome::Waiting;
        }

        // Presence is re-checked on the next call; the schedule is untouched.
        let Some(sample) = StateSampler::sample(&*sim, &self.vehicle_id) else {
            debug!("{}: t={:.1} state unavailable, skipping", self.vehicle_id, sim_time);
            return StepOutcome::Skipped;
        };
        self.next_replan = sim_time + self.params.replan_interval();

        let decision = self.planner.plan(&sample);
        debug!(
            "{}: t={:.1} lane {}/{} on {} -> {} (nominal {}, exit in {:.1} m)",
            self.vehicle_id, sim_time, sample.vehicle.lane, sample.lane_count,
            sample.edge_id, decision.offset, decision.nominal, decision.distance_to_exit
        );

        let mut commanded = false;
        if decision.offset != LaneOffset::Stay {
            match sim.change_lane_relative(&self.vehicle_id, decision.offset.delta(), self.params.step) {
                Ok(()) => {
                    commanded = true;
                    info!(
                        "{}: lane change {} from lane {}{}",
                        self.vehicle_id,
                        decision.offset,
                        sample.vehicle.lane,
                        if decision.overridden { " (mandatory override)" } else { "" }
                    );
                }
                Err(SimError::UnknownVehicle(_)) => {
                    self.deactivate("vanished before the lane change");
                    return StepOutcome::Deactivated;
                }
                Err(e) => {
                    warn!("{}: lane change {} rejected: {}", self.vehicle_id, decision.offset, e);
                }
            }
        }

        StepOutcome::Planned { decision, commanded }
    }

    fn deactivate(&mut self, reason: &str) {
        info!("{}: controller deactivated ({})", self.vehicle_id, reason);
        self.state = ControllerState::Inactive;
    }
}
