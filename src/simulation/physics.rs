use super::{EdgeRef, HighwayState, SimStats, SimVehicle};
use crate::config::{FollowingConfig, NetworkConfig};
use log::{debug, info, warn};

/// Remaining lane-change time below which the change is applied.
const COMPLETION_EPSILON: f64 = 1e-9;

pub struct PhysicsEngine {
    following: FollowingConfig,
}

impl PhysicsEngine {
    pub fn new(following: FollowingConfig) -> Self {
        Self { following }
    }

    pub fn update(&self, state: &mut HighwayState) {
        let dt = state.dt;

        // Compute every new speed against the same snapshot, then apply
        let speeds: Vec<f64> = state.vehicles
            .iter()
            .map(|vehicle| self.calculate_speed(vehicle, &state.vehicles, dt))
            .collect();

        for (vehicle, speed) in state.vehicles.iter_mut().zip(speeds) {
            vehicle.speed = speed;
            vehicle.position += speed * dt;
        }

        Self::update_lane_changes(state, dt);
        Self::update_edge_transitions(state);

        state.time += dt;
    }

    fn calculate_speed(&self, vehicle: &SimVehicle, vehicles: &[SimVehicle], dt: f64) -> f64 {
        let mut target_speed = vehicle.desired_speed;

        if let Some((leader, gap)) = Self::find_leader(vehicle, vehicles) {
            let emergency = self.following.emergency_brake_distance;
            let warning = self.following.warning_distance;
            let following_distance = self.following.time_headway * vehicle.speed + warning;

            if gap < emergency {
                target_speed = 0.0;
            } else if gap < warning {
                target_speed *= (gap - emergency) / (warning - emergency);
            } else if gap < following_distance {
                target_speed = leader.speed.min(target_speed);
            }
        }

        let speed_diff = target_speed - vehicle.speed;
        let acceleration = if speed_diff > 0.0 {
            (speed_diff / dt).min(vehicle.max_acceleration)
        } else {
            (speed_diff / dt).max(-vehicle.max_deceleration)
        };

        (vehicle.speed + acceleration * dt).max(0.0)
    }

    /// Closest vehicle ahead on the same edge and lane, with the bumper gap.
    fn find_leader<'a>(vehicle: &SimVehicle, vehicles: &'a [SimVehicle]) -> Option<(&'a SimVehicle, f64)> {
        vehicles
            .iter()
            .filter(|other| {
                other.id != vehicle.id
                    && other.edge == vehicle.edge
                    && other.lane == vehicle.lane
                    && other.position > vehicle.position
            })
            .map(|other| (other, other.position - other.length - vehicle.position))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn update_lane_changes(state: &mut HighwayState, dt: f64) {
        let network = &state.network;
        let stats = &mut state.stats;

        for vehicle in state.vehicles.iter_mut() {
            let Some(mut pending) = vehicle.pending_change else {
                continue;
            };

            pending.remaining -= dt;
            if pending.remaining > COMPLETION_EPSILON {
                vehicle.pending_change = Some(pending);
                continue;
            }

            let max_lane = vehicle.edge.lanes(network).saturating_sub(1) as i64;
            let target = (vehicle.lane as i64 + pending.offset as i64).clamp(0, max_lane) as u32;
            if target != vehicle.lane {
                debug!("{}: lane {} -> {}", vehicle.id, vehicle.lane, target);
                vehicle.lane = target;
                stats.lane_changes += 1;
            }
            vehicle.pending_change = None;
        }
    }

    fn update_edge_transitions(state: &mut HighwayState) {
        let network = &state.network;
        let stats = &mut state.stats;
        let mut arrived = Vec::new();

        for vehicle in state.vehicles.iter_mut() {
            loop {
                let length = vehicle.edge.length(network);
                if vehicle.position < length {
                    break;
                }

                let overflow = vehicle.position - length;
                match Self::next_edge(vehicle, network, stats) {
                    Some(next) => {
                        vehicle.edge = next;
                        vehicle.position = overflow;
                        vehicle.lane = vehicle.lane.min(next.lanes(network).saturating_sub(1));
                    }
                    None => {
                        arrived.push(vehicle.id.clone());
                        break;
                    }
                }
            }
        }

        if !arrived.is_empty() {
            state.vehicles.retain(|v| !arrived.contains(&v.id));
            state.stats.arrived += arrived.len() as u32;
        }
    }

    fn next_edge(vehicle: &mut SimVehicle, network: &NetworkConfig, stats: &mut SimStats) -> Option<EdgeRef> {
        let EdgeRef::Main(index) = vehicle.edge else {
            // Ramps end the route
            return None;
        };

        if let Some(exit_index) = vehicle.exit {
            let exit = &network.exits[exit_index];
            if exit.from_edge == network.edges[index].id {
                if vehicle.lane == exit.lane {
                    info!("{} took exit {}", vehicle.id, exit.id);
                    stats.exits_taken += 1;
                    vehicle.lane = 0;
                    vehicle.pending_change = None;
                    return Some(EdgeRef::Exit(exit_index));
                }

                warn!("{} missed exit {} (lane {}, exit lane {})", vehicle.id, exit.id, vehicle.lane, exit.lane);
                stats.exits_missed += 1;
                vehicle.exit = None;
            }
        }

        if index + 1 < network.edges.len() {
            Some(EdgeRef::Main(index + 1))
        } else {
            None
        }
    }
}
