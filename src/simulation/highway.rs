use super::{PhysicsEngine, SimError, TrafficManager, TrafficSimulator};
use crate::config::{DemandConfig, ExperimentConfig, NetworkConfig};

/// Position of an edge inside the network tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRef {
    Main(usize),
    Exit(usize),
}

impl EdgeRef {
    pub fn id<'a>(&self, network: &'a NetworkConfig) -> &'a str {
        match *self {
            EdgeRef::Main(i) => &network.edges[i].id,
            EdgeRef::Exit(i) => &network.exits[i].id,
        }
    }

    pub fn lanes(&self, network: &NetworkConfig) -> u32 {
        match *self {
            EdgeRef::Main(i) => network.edges[i].lanes,
            EdgeRef::Exit(i) => network.exits[i].lanes,
        }
    }

    pub fn length(&self, network: &NetworkConfig) -> f64 {
        match *self {
            EdgeRef::Main(i) => network.edges[i].length,
            EdgeRef::Exit(i) => network.exits[i].length,
        }
    }

    pub fn resolve(network: &NetworkConfig, id: &str) -> Option<EdgeRef> {
        network.edge_index(id)
            .map(EdgeRef::Main)
            .or_else(|| network.exits.iter().position(|x| x.id == id).map(EdgeRef::Exit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLaneChange {
    pub offset: i32,
    pub remaining: f64,
}

#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: String,
    pub type_id: String,
    pub edge: EdgeRef,
    pub lane: u32,
    pub position: f64,
    pub speed: f64,
    pub desired_speed: f64,
    pub max_acceleration: f64,
    pub max_deceleration: f64,
    pub length: f64,
    /// Exit ramp this vehicle is routed to, if any.
    pub exit: Option<usize>,
    pub pending_change: Option<PendingLaneChange>,
}

impl SimVehicle {
    /// A vehicle cruising at `speed` with default vehicle dynamics.
    pub fn new(id: &str, type_id: &str, edge: EdgeRef, lane: u32, position: f64, speed: f64) -> Self {
        Self {
            id: id.to_string(),
            type_id: type_id.to_string(),
            edge,
            lane,
            position,
            speed,
            desired_speed: speed,
            max_acceleration: 2.6,
            max_deceleration: 4.5,
            length: 5.0,
            exit: None,
            pending_change: None,
        }
    }

    pub fn with_exit(mut self, exit: usize) -> Self {
        self.exit = Some(exit);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub spawned: u32,
    pub arrived: u32,
    pub exits_taken: u32,
    pub exits_missed: u32,
    pub lane_changes: u32,
}

#[derive(Debug, Clone)]
pub struct HighwayState {
    pub network: NetworkConfig,
    pub vehicles: Vec<SimVehicle>,
    pub time: f64,
    pub dt: f64,
    pub stats: SimStats,
}

impl HighwayState {
    pub fn new(network: NetworkConfig, dt: f64) -> Self {
        Self {
            network,
            vehicles: Vec::new(),
            time: 0.0,
            dt,
            stats: SimStats::default(),
        }
    }

    pub fn get_vehicle(&self, id: &str) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn get_vehicle_mut(&mut self, id: &str) -> Option<&mut SimVehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn add_vehicle(&mut self, vehicle: SimVehicle) {
        self.vehicles.push(vehicle);
        self.stats.spawned += 1;
    }
}

/// Small deterministic highway simulator: a linear main line with exit ramps,
/// seeded demand, gap-keeping longitudinal control and timed lane changes.
pub struct HighwaySim {
    state: HighwayState,
    traffic_manager: TrafficManager,
    physics_engine: PhysicsEngine,
}

impl HighwaySim {
    pub fn new(network: NetworkConfig, demand: DemandConfig, dt: f64, seed: Option<u64>) -> Self {
        let physics_engine = PhysicsEngine::new(demand.following.clone());
        let traffic_manager = TrafficManager::new(demand, seed);

        Self {
            state: HighwayState::new(network, dt),
            traffic_manager,
            physics_engine,
        }
    }

    pub fn from_config(config: &ExperimentConfig, seed: Option<u64>) -> Self {
        Self::new(
            config.network.clone(),
            config.demand.clone(),
            config.simulation.step_length,
            seed.or(config.simulation.seed),
        )
    }

    /// Place a vehicle directly, bypassing the demand model.
    pub fn insert_vehicle(&mut self, vehicle: SimVehicle) -> Result<(), SimError> {
        let lanes = vehicle.edge.lanes(&self.state.network);
        if vehicle.lane >= lanes {
            return Err(SimError::LaneOutOfRange {
                vehicle: vehicle.id.clone(),
                lane: vehicle.lane as i64,
                lanes,
            });
        }

        self.state.add_vehicle(vehicle);
        Ok(())
    }

    pub fn state(&self) -> &HighwayState {
        &self.state
    }

    pub fn stats(&self) -> &SimStats {
        &self.state.stats
    }
}

impl TrafficSimulator for HighwaySim {
    fn time(&self) -> f64 {
        self.state.time
    }

    fn step(&mut self) -> Result<(), SimError> {
        // Departures first, then movement
        self.traffic_manager.update(&mut self.state);
        self.physics_engine.update(&mut self.state);
        Ok(())
    }

    fn min_expected_vehicles(&self) -> usize {
        self.state.vehicles.len() + self.traffic_manager.remaining() as usize
    }

    fn vehicle_ids(&self) -> Vec<String> {
        self.state.vehicles.iter().map(|v| v.id.clone()).collect()
    }

    fn vehicle_exists(&self, id: &str) -> bool {
        self.state.get_vehicle(id).is_some()
    }

    fn vehicle_type(&self, id: &str) -> Option<String> {
        self.state.get_vehicle(id).map(|v| v.type_id.clone())
    }

    fn lane_position(&self, id: &str) -> Option<f64> {
        self.state.get_vehicle(id).map(|v| v.position)
    }

    fn speed(&self, id: &str) -> Option<f64> {
        self.state.get_vehicle(id).map(|v| v.speed)
    }

    fn lane_index(&self, id: &str) -> Option<u32> {
        self.state.get_vehicle(id).map(|v| v.lane)
    }

    fn road_id(&self, id: &str) -> Option<String> {
        self.state.get_vehicle(id).map(|v| v.edge.id(&self.state.network).to_string())
    }

    fn edge_lane_count(&self, edge: &str) -> Option<u32> {
        EdgeRef::resolve(&self.state.network, edge).map(|e| e.lanes(&self.state.network))
    }

    fn edge_length(&self, edge: &str) -> Option<f64> {
        EdgeRef::resolve(&self.state.network, edge).map(|e| e.length(&self.state.network))
    }

    fn change_lane_relative(&mut self, id: &str, offset: i32, duration: f64) -> Result<(), SimError> {
        let (edge, lane) = self.state.get_vehicle(id)
            .map(|v| (v.edge, v.lane))
            .ok_or_else(|| SimError::UnknownVehicle(id.to_string()))?;

        let lanes = edge.lanes(&self.state.network);
        let target = lane as i64 + offset as i64;
        if target < 0 || target >= lanes as i64 {
            return Err(SimError::LaneOutOfRange {
                vehicle: id.to_string(),
                lane: target,
                lanes,
            });
        }

        if let Some(vehicle) = self.state.get_vehicle_mut(id) {
            vehicle.pending_change = Some(PendingLaneChange {
                offset,
                remaining: duration.max(0.0),
            });
        }

        Ok(())
    }
}
