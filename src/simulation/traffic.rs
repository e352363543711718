use super::{EdgeRef, HighwayState, SimVehicle};
use crate::config::{DemandConfig, VehicleType};
use log::debug;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;

/// Minimum clear distance behind the entry point before a vehicle departs.
const MIN_SPAWN_GAP: f64 = 10.0;

/// Slowest desired speed a sampled vehicle may get.
const MIN_DESIRED_SPEED: f64 = 1.0;

/// Departs vehicles onto the first main-line edge according to the demand.
pub struct TrafficManager {
    demand: DemandConfig,
    rng: StdRng,
    spawn_timer: f64,
    spawned: u32,
    type_counters: HashMap<String, u32>,
}

impl TrafficManager {
    pub fn new(demand: DemandConfig, seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        Self {
            demand,
            rng,
            spawn_timer: 0.0,
            spawned: 0,
            type_counters: HashMap::new(),
        }
    }

    /// Vehicles still waiting to depart.
    pub fn remaining(&self) -> u32 {
        self.demand.total_vehicles.saturating_sub(self.spawned)
    }

    pub fn update(&mut self, state: &mut HighwayState) {
        if self.remaining() == 0 {
            return;
        }

        self.spawn_timer -= state.dt;
        if self.spawn_timer > 0.0 {
            return;
        }

        let Some(lane) = self.pick_spawn_lane(state) else {
            debug!("Entry blocked at t={:.1}, retrying next step", state.time);
            return;
        };

        let Some(vehicle_type) = self.select_vehicle_type() else {
            return;
        };

        let vehicle = self.create_vehicle(&vehicle_type, lane, state);
        debug!("Spawned {} in lane {} at {:.1} m/s", vehicle.id, lane, vehicle.speed);
        state.add_vehicle(vehicle);
        self.spawned += 1;

        self.spawn_timer = self.rng.gen_range(self.demand.min_interval..=self.demand.max_interval);
    }

    fn pick_spawn_lane(&mut self, state: &HighwayState) -> Option<u32> {
        let entry = EdgeRef::Main(0);
        let lanes = entry.lanes(&state.network);

        let free: Vec<u32> = (0..lanes)
            .filter(|&lane| {
                !state.vehicles.iter().any(|v| {
                    v.edge == entry && v.lane == lane && v.position - v.length < MIN_SPAWN_GAP
                })
            })
            .collect();

        if free.is_empty() {
            None
        } else {
            Some(free[self.rng.gen_range(0..free.len())])
        }
    }

    fn select_vehicle_type(&mut self) -> Option<VehicleType> {
        let total_weight: u32 = self.demand.vehicle_types.iter().map(|vt| vt.weight).sum();
        if total_weight == 0 {
            return None;
        }

        let mut random_value = self.rng.gen_range(0..total_weight);
        for vehicle_type in &self.demand.vehicle_types {
            if random_value < vehicle_type.weight {
                return Some(vehicle_type.clone());
            }
            random_value -= vehicle_type.weight;
        }

        self.demand.vehicle_types.first().cloned()
    }

    fn create_vehicle(&mut self, vehicle_type: &VehicleType, lane: u32, state: &HighwayState) -> SimVehicle {
        let counter = self.type_counters.entry(vehicle_type.id.clone()).or_insert(0);
        let id = format!("{}.{}", vehicle_type.id, counter);
        *counter += 1;

        let desired_speed = self.sample_desired_speed(vehicle_type);

        let exits = &state.network.exits;
        let exit = if !exits.is_empty() && self.rng.gen::<f64>() < vehicle_type.exit_probability {
            Some(self.rng.gen_range(0..exits.len()))
        } else {
            None
        };

        SimVehicle {
            id,
            type_id: vehicle_type.id.clone(),
            edge: EdgeRef::Main(0),
            lane,
            position: 0.0,
            speed: desired_speed,
            desired_speed,
            max_acceleration: vehicle_type.max_acceleration,
            max_deceleration: vehicle_type.max_deceleration,
            length: vehicle_type.length,
            exit,
            pending_change: None,
        }
    }

    fn sample_desired_speed(&mut self, vehicle_type: &VehicleType) -> f64 {
        let mean = vehicle_type.desired_speed;
        let sampled = if vehicle_type.speed_deviation > 0.0 {
            Normal::new(mean, vehicle_type.speed_deviation)
                .map(|normal| normal.sample(&mut self.rng))
                .unwrap_or(mean)
        } else {
            mean
        };

        sampled.max(MIN_DESIRED_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgeSpec, FollowingConfig, NetworkConfig};

    fn demand(total: u32) -> DemandConfig {
        DemandConfig {
            total_vehicles: total,
            min_interval: 1.0,
            max_interval: 2.0,
            vehicle_types: vec![
                VehicleType {
                    id: "cav".into(),
                    weight: 30,
                    desired_speed: 25.0,
                    speed_deviation: 2.0,
                    exit_probability: 0.0,
                    max_acceleration: 2.6,
                    max_deceleration: 4.5,
                    length: 5.0,
                },
                VehicleType {
                    id: "car".into(),
                    weight: 70,
                    desired_speed: 22.0,
                    speed_deviation: 0.0,
                    exit_probability: 0.0,
                    max_acceleration: 2.6,
                    max_deceleration: 4.5,
                    length: 5.0,
                },
            ],
            following: FollowingConfig::default(),
        }
    }

    fn state() -> HighwayState {
        let network = NetworkConfig {
            edges: vec![EdgeSpec { id: "E1".into(), length: 500.0, lanes: 2 }],
            exits: Vec::new(),
        };
        HighwayState::new(network, 0.5)
    }

    #[test]
    fn test_spawns_up_to_total() {
        let mut manager = TrafficManager::new(demand(3), Some(42));
        let mut state = state();

        for _ in 0..100 {
            manager.update(&mut state);
            // Move departed vehicles clear of the entry
            for v in state.vehicles.iter_mut() {
                v.position += 20.0;
            }
        }

        assert_eq!(state.vehicles.len(), 3);
        assert_eq!(manager.remaining(), 0);
        assert!(state.vehicles.iter().all(|v| v.desired_speed >= MIN_DESIRED_SPEED));
    }

    #[test]
    fn test_same_seed_same_departures() {
        let run = |seed| {
            let mut manager = TrafficManager::new(demand(5), Some(seed));
            let mut state = state();
            for _ in 0..200 {
                manager.update(&mut state);
                for v in state.vehicles.iter_mut() {
                    v.position += 20.0;
                }
            }
            state.vehicles.iter().map(|v| (v.id.clone(), v.lane)).collect::<Vec<_>>()
        };

        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_blocked_entry_defers_spawn() {
        let mut manager = TrafficManager::new(demand(1), Some(1));
        let mut state = state();
        state.add_vehicle(SimVehicle::new("a", "car", EdgeRef::Main(0), 0, 0.0, 0.0));
        state.add_vehicle(SimVehicle::new("b", "car", EdgeRef::Main(0), 1, 0.0, 0.0));

        manager.update(&mut state);
        assert_eq!(manager.remaining(), 1);
        assert_eq!(state.vehicles.len(), 2);
    }
}
