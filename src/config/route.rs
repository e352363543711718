use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::collections::HashSet;
use super::Validate;

/// Highway topology: a linear main line plus exit ramps.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub exits: Vec<ExitSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeSpec {
    pub id: String,
    pub length: f64,
    pub lanes: u32,
}

/// Ramp leaving the main line at the end of `from_edge`, reachable only from
/// `lane` of that edge.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExitSpec {
    pub id: String,
    pub from_edge: String,
    #[serde(default)]
    pub lane: u32,
    pub length: f64,
    #[serde(default = "default_ramp_lanes")]
    pub lanes: u32,
}

fn default_ramp_lanes() -> u32 {
    1
}

impl NetworkConfig {
    pub fn has_edge(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id) || self.exits.iter().any(|x| x.id == id)
    }

    pub fn edge_index(&self, id: &str) -> Option<usize> {
        self.edges.iter().position(|e| e.id == id)
    }
}

impl Validate for NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.edges.is_empty() {
            return Err(anyhow!("Network needs at least one main-line edge"));
        }

        let mut seen = HashSet::new();
        for edge in &self.edges {
            if edge.id.is_empty() {
                return Err(anyhow!("Edge ids must not be empty"));
            }

            if !seen.insert(edge.id.as_str()) {
                return Err(anyhow!("Duplicate edge id '{}'", edge.id));
            }

            if edge.length <= 0.0 || edge.lanes == 0 {
                return Err(anyhow!("Edge '{}' needs positive length and lane count", edge.id));
            }
        }

        for exit in &self.exits {
            if !seen.insert(exit.id.as_str()) {
                return Err(anyhow!("Duplicate edge id '{}'", exit.id));
            }

            let from = self.edges.iter()
                .find(|e| e.id == exit.from_edge)
                .ok_or_else(|| anyhow!("Exit '{}' branches from unknown edge '{}'", exit.id, exit.from_edge))?;

            if exit.lane >= from.lanes {
                return Err(anyhow!(
                    "Exit '{}' connects from lane {} but '{}' has {} lanes",
                    exit.id, exit.lane, from.id, from.lanes
                ));
            }

            if exit.length <= 0.0 || exit.lanes == 0 {
                return Err(anyhow!("Exit '{}' needs positive length and lane count", exit.id));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> NetworkConfig {
        NetworkConfig {
            edges: vec![
                EdgeSpec { id: "E1".into(), length: 400.0, lanes: 3 },
                EdgeSpec { id: "E2".into(), length: 300.0, lanes: 3 },
            ],
            exits: vec![ExitSpec {
                id: "E1_exit".into(),
                from_edge: "E1".into(),
                lane: 0,
                length: 150.0,
                lanes: 1,
            }],
        }
    }

    #[test]
    fn test_valid_network() {
        let net = network();
        assert!(net.validate().is_ok());
        assert!(net.has_edge("E1_exit"));
        assert_eq!(net.edge_index("E2"), Some(1));
    }

    #[test]
    fn test_exit_lane_out_of_range() {
        let mut net = network();
        net.exits[0].lane = 3;
        assert!(net.validate().is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut net = network();
        net.exits[0].id = "E2".into();
        assert!(net.validate().is_err());
    }
}
