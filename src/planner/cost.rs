use super::Trajectory;
use crate::config::Weights;

/// Unweighted term values plus the weighted total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub safety: f64,
    pub efficiency: f64,
    pub comfort: f64,
    pub route: f64,
    pub pref: f64,
    pub switch: f64,
    pub coop: f64,
    pub total: f64,
}

pub struct CostEvaluator {
    weights: Weights,
    step: f64,
}

impl CostEvaluator {
    pub fn new(weights: Weights, step: f64) -> Self {
        Self { weights, step }
    }

    /// Score `trajectory` against the lane the vehicle currently occupies.
    /// `route` is the merge-policy penalty for the trajectory's lane.
    pub fn evaluate(&self, trajectory: &Trajectory, current_lane: u32, route: f64) -> CostBreakdown {
        let safety = self.safety(trajectory);
        let efficiency = -trajectory.last().map_or(0.0, |s| s.speed);
        let comfort = comfort(trajectory);
        let switch = match trajectory.last() {
            Some(s) if s.lane != current_lane => 1.0,
            _ => 0.0,
        };
        // Reserved terms
        let pref = 0.0;
        let coop = 0.0;

        let w = &self.weights;
        let total = if route.is_infinite() {
            f64::INFINITY
        } else {
            w.safety * safety
                + w.efficiency * efficiency
                + w.comfort * comfort
                + w.route * route
                + w.pref * pref
                + w.switch * switch
                + w.coop * coop
        };

        CostBreakdown {
            safety,
            efficiency,
            comfort,
            route,
            pref,
            switch,
            coop,
            total,
        }
    }

    /// Rises sharply as speed approaches zero.
    fn safety(&self, trajectory: &Trajectory) -> f64 {
        self.step * trajectory.samples.iter().map(|s| (-s.speed).exp()).sum::<f64>()
    }
}

/// Population variance of consecutive speed differences.
fn comfort(trajectory: &Trajectory) -> f64 {
    if trajectory.len() < 2 {
        return 0.0;
    }

    let diffs: Vec<f64> = trajectory.samples
        .windows(2)
        .map(|w| w[1].speed - w[0].speed)
        .collect();

    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / diffs.len() as f64
}
