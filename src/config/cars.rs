use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemandConfig {
    pub total_vehicles: u32,
    pub min_interval: f64,
    pub max_interval: f64,
    pub vehicle_types: Vec<VehicleType>,
    #[serde(default)]
    pub following: FollowingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleType {
    pub id: String,
    pub weight: u32,
    pub desired_speed: f64,
    #[serde(default)]
    pub speed_deviation: f64,
    /// Probability that a spawned vehicle of this type is routed via an exit.
    #[serde(default)]
    pub exit_probability: f64,
    #[serde(default = "default_max_acceleration")]
    pub max_acceleration: f64,
    #[serde(default = "default_max_deceleration")]
    pub max_deceleration: f64,
    #[serde(default = "default_length")]
    pub length: f64,
}

fn default_max_acceleration() -> f64 {
    2.6
}

fn default_max_deceleration() -> f64 {
    4.5
}

fn default_length() -> f64 {
    5.0
}

/// Gap keeping in the built-in car-following model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FollowingConfig {
    pub time_headway: f64,
    pub emergency_brake_distance: f64,
    pub warning_distance: f64,
}

impl Default for FollowingConfig {
    fn default() -> Self {
        Self {
            time_headway: 1.5,
            emergency_brake_distance: 2.0,
            warning_distance: 10.0,
        }
    }
}

impl Validate for DemandConfig {
    fn validate(&self) -> Result<()> {
        if self.min_interval <= 0.0 || self.max_interval < self.min_interval {
            return Err(anyhow!(
                "Spawn interval must satisfy 0 < min <= max, got [{}, {}]",
                self.min_interval, self.max_interval
            ));
        }

        if self.vehicle_types.is_empty() {
            return Err(anyhow!("At least one vehicle type must be defined"));
        }

        let total_weight: u32 = self.vehicle_types.iter().map(|vt| vt.weight).sum();
        if total_weight == 0 {
            return Err(anyhow!("Vehicle type weights must not all be zero"));
        }

        for vt in &self.vehicle_types {
            if vt.desired_speed <= 0.0 {
                return Err(anyhow!("Desired speed for '{}' must be positive", vt.id));
            }

            if vt.speed_deviation < 0.0 {
                return Err(anyhow!("Speed deviation for '{}' must be non-negative", vt.id));
            }

            if !(0.0..=1.0).contains(&vt.exit_probability) {
                return Err(anyhow!("Exit probability for '{}' must be in range [0, 1]", vt.id));
            }

            if vt.max_acceleration <= 0.0 || vt.max_deceleration <= 0.0 {
                return Err(anyhow!("Acceleration limits for '{}' must be positive", vt.id));
            }

            if vt.length <= 0.0 {
                return Err(anyhow!("Length for '{}' must be positive", vt.id));
            }
        }

        let following = &self.following;
        if following.time_headway < 0.0 {
            return Err(anyhow!("Time headway must be non-negative"));
        }

        if following.emergency_brake_distance <= 0.0
            || following.emergency_brake_distance >= following.warning_distance
        {
            return Err(anyhow!("Emergency brake distance must be positive and below warning distance"));
        }

        Ok(())
    }
}
