use thiserror::Error;

pub mod sampler;
pub mod physics;
pub mod traffic;
pub mod highway;

pub use sampler::*;
pub use physics::*;
pub use traffic::*;
pub use highway::*;

/// Errors reported by a simulator when a command cannot be carried out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("vehicle '{0}' is not in the simulation")]
    UnknownVehicle(String),
    #[error("edge '{0}' is not in the network")]
    UnknownEdge(String),
    #[error("lane {lane} is out of range for vehicle '{vehicle}' ({lanes} lanes)")]
    LaneOutOfRange { vehicle: String, lane: i64, lanes: u32 },
}

/// Query/command boundary to the traffic simulation engine.
///
/// Queries keyed by vehicle id return `None` once the vehicle has left the
/// simulation; absence is a normal condition, never a failure.
pub trait TrafficSimulator {
    /// Current simulation time in seconds.
    fn time(&self) -> f64;

    /// Advance the simulation by one discrete step.
    fn step(&mut self) -> Result<(), SimError>;

    /// Vehicles still running plus vehicles still waiting to depart.
    fn min_expected_vehicles(&self) -> usize;

    fn vehicle_ids(&self) -> Vec<String>;

    fn vehicle_exists(&self, id: &str) -> bool {
        self.vehicle_ids().iter().any(|v| v == id)
    }

    fn vehicle_type(&self, id: &str) -> Option<String>;
    fn lane_position(&self, id: &str) -> Option<f64>;
    fn speed(&self, id: &str) -> Option<f64>;
    fn lane_index(&self, id: &str) -> Option<u32>;
    fn road_id(&self, id: &str) -> Option<String>;

    fn edge_lane_count(&self, edge: &str) -> Option<u32>;
    fn edge_length(&self, edge: &str) -> Option<f64>;

    /// Request a change of `offset` lanes (positive = towards higher lane
    /// indices), completed within `duration` seconds.
    fn change_lane_relative(&mut self, id: &str, offset: i32, duration: f64) -> Result<(), SimError>;
}

/// Kinematic snapshot of one vehicle, captured once per planning tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    /// Distance travelled along the current lane (m).
    pub position: f64,
    pub speed: f64,
    pub lane: u32,
}
