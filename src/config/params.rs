use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;
use crate::planner::MAX_ROLLOUT_SAMPLES;

/// Planner parameters shared by every controller instance of an experiment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Rollout horizon T_p in seconds.
    pub horizon: f64,
    /// Rollout step in seconds, also the lane-change completion window.
    pub step: f64,
    /// Replanning frequency in Hz.
    pub replan_hz: f64,
    pub weights: Weights,
    pub mandatory: MandatoryCfg,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            horizon: 8.0,
            step: 0.5,
            replan_hz: 1.0,
            weights: Weights::default(),
            mandatory: MandatoryCfg::default(),
        }
    }
}

impl Params {
    pub fn replan_interval(&self) -> f64 {
        1.0 / self.replan_hz
    }
}

/// Cost weights. Not normalized: relative magnitudes set relative influence.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Weights {
    pub safety: f64,
    pub efficiency: f64,
    pub comfort: f64,
    pub route: f64,
    /// Lane preference. Reserved, its term is always zero.
    pub pref: f64,
    pub switch: f64,
    /// Cooperation. Reserved, its term is always zero.
    pub coop: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            safety: 0.7,
            efficiency: 0.2,
            comfort: 0.05,
            route: 0.02,
            pref: 0.01,
            switch: 0.01,
            coop: 0.01,
        }
    }
}

impl Weights {
    fn as_array(&self) -> [(&'static str, f64); 7] {
        [
            ("safety", self.safety),
            ("efficiency", self.efficiency),
            ("comfort", self.comfort),
            ("route", self.route),
            ("pref", self.pref),
            ("switch", self.switch),
            ("coop", self.coop),
        ]
    }
}

/// Mandatory merge settings. An empty `exit_edge` means discretionary only.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MandatoryCfg {
    pub exit_edge: String,
    pub goal_lane: u32,
    /// Distance to the exit (m) around which the penalty ramps up.
    pub trigger_distance: f64,
    /// Escalation coefficient k.
    pub escalation: f64,
    pub hard_deadline: bool,
}

impl Default for MandatoryCfg {
    fn default() -> Self {
        Self {
            exit_edge: String::new(),
            goal_lane: 0,
            trigger_distance: 150.0,
            escalation: 10.0,
            hard_deadline: false,
        }
    }
}

impl MandatoryCfg {
    pub fn is_configured(&self) -> bool {
        !self.exit_edge.is_empty()
    }
}

impl Validate for Params {
    fn validate(&self) -> Result<()> {
        if !is_positive(self.horizon) || !is_positive(self.step) {
            return Err(anyhow!("Horizon and step must be finite and positive"));
        }

        if self.step > self.horizon {
            return Err(anyhow!("Step {} must not exceed horizon {}", self.step, self.horizon));
        }

        if self.horizon / self.step >= MAX_ROLLOUT_SAMPLES as f64 {
            return Err(anyhow!(
                "Horizon {} with step {} exceeds {} rollout samples",
                self.horizon, self.step, MAX_ROLLOUT_SAMPLES
            ));
        }

        if !is_positive(self.replan_hz) {
            return Err(anyhow!("Replanning frequency must be finite and positive"));
        }

        for (name, weight) in self.weights.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(anyhow!("Weight '{}' must be finite and non-negative, got {}", name, weight));
            }
        }

        let mandatory = &self.mandatory;
        if !mandatory.trigger_distance.is_finite() || mandatory.trigger_distance < 0.0 {
            return Err(anyhow!("Trigger distance must be finite and non-negative"));
        }

        if !mandatory.escalation.is_finite() || mandatory.escalation < 0.0 {
            return Err(anyhow!("Escalation coefficient must be finite and non-negative"));
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
