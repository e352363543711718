use super::{TrafficSimulator, VehicleState};

/// Everything the planner reads from the simulator in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSample {
    pub vehicle: VehicleState,
    pub edge_id: String,
    pub lane_count: u32,
    /// `f64::INFINITY` when the simulator does not know the edge length.
    pub edge_length: f64,
}

/// Read-only access to the simulator state of one vehicle.
pub struct StateSampler;

impl StateSampler {
    pub fn is_present<S: TrafficSimulator + ?Sized>(sim: &S, vehicle_id: &str) -> bool {
        sim.vehicle_exists(vehicle_id)
    }

    /// Returns `None` if the vehicle vanished between queries or its edge has
    /// no lane count.
    pub fn sample<S: TrafficSimulator + ?Sized>(sim: &S, vehicle_id: &str) -> Option<StateSample> {
        let position = sim.lane_position(vehicle_id)?;
        let speed = sim.speed(vehicle_id)?;
        let lane = sim.lane_index(vehicle_id)?;
        let edge_id = sim.road_id(vehicle_id)?;
        let lane_count = sim.edge_lane_count(&edge_id)?;
        let edge_length = sim.edge_length(&edge_id).unwrap_or(f64::INFINITY);

        Some(StateSample {
            vehicle: VehicleState { position, speed, lane },
            edge_id,
            lane_count,
            edge_length,
        })
    }
}
