use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

pub mod route;
pub mod cars;
pub mod params;

pub use route::*;
pub use cars::*;
pub use params::*;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExperimentConfig {
    pub simulation: SimulationParams,
    pub network: NetworkConfig,
    pub demand: DemandConfig,
    #[serde(default)]
    pub controller: Params,
    pub enrollment: Enrollment,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationParams {
    pub step_length: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Hard stop for the driving loop, in simulated seconds.
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
}

fn default_time_limit() -> f64 {
    3600.0
}

/// Which vehicles get a lane-change controller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Enrollment {
    /// Only the listed ids, each enrolled when first seen in the simulation.
    Explicit { vehicles: Vec<String> },
    /// Every newly observed vehicle of the given type.
    Auto { vehicle_type: String },
}

impl ExperimentConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ExperimentConfig = toml::from_str(content)?;

        // Validate configurations
        config.validate()?;

        Ok(config)
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for ExperimentConfig {
    fn validate(&self) -> Result<()> {
        if !self.simulation.step_length.is_finite() || self.simulation.step_length <= 0.0 {
            return Err(anyhow!("Simulation step length must be positive"));
        }

        if self.simulation.time_limit.is_nan() || self.simulation.time_limit <= 0.0 {
            return Err(anyhow!("Simulation time limit must be positive"));
        }

        self.network.validate()?;
        self.demand.validate()?;
        self.controller.validate()?;

        match &self.enrollment {
            Enrollment::Explicit { vehicles } => {
                if vehicles.iter().any(|id| id.is_empty()) {
                    return Err(anyhow!("Explicit enrollment contains an empty vehicle id"));
                }
            }
            Enrollment::Auto { vehicle_type } => {
                if !self.demand.vehicle_types.iter().any(|vt| &vt.id == vehicle_type) {
                    return Err(anyhow!(
                        "Auto enrollment type '{}' is not produced by the demand model",
                        vehicle_type
                    ));
                }
            }
        }

        let exit = &self.controller.mandatory.exit_edge;
        if !exit.is_empty() && !self.network.has_edge(exit) {
            return Err(anyhow!("Mandatory exit edge '{}' is not part of the network", exit));
        }

        Ok(())
    }
}
