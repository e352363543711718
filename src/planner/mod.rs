use std::fmt;
use log::debug;

use crate::config::Params;
use crate::simulation::StateSample;

pub mod rollout;
pub mod cost;
pub mod mandatory;
pub mod arbitration;

pub use rollout::*;
pub use cost::*;
pub use mandatory::*;
pub use arbitration::*;

/// Relative lane move. Lane 0 is the rightmost lane, so `Right` lowers the
/// lane index and `Left` raises it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneOffset {
    Right,
    Stay,
    Left,
}

impl LaneOffset {
    /// Evaluation order; also the tie-break order.
    pub const CANDIDATES: [LaneOffset; 3] = [LaneOffset::Right, LaneOffset::Stay, LaneOffset::Left];

    pub fn delta(self) -> i32 {
        match self {
            LaneOffset::Right => -1,
            LaneOffset::Stay => 0,
            LaneOffset::Left => 1,
        }
    }

    /// Target lane, or `None` if it falls outside `[0, lane_count)`.
    pub fn apply(self, lane: u32, lane_count: u32) -> Option<u32> {
        let target = lane as i64 + self.delta() as i64;
        if (0..lane_count as i64).contains(&target) {
            Some(target as u32)
        } else {
            None
        }
    }
}

impl fmt::Display for LaneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.delta())
    }
}

/// Candidate offsets that keep the vehicle on the road, in evaluation order.
/// `Stay` is always included for any lane inside the edge.
pub fn feasible_candidates(lane: u32, lane_count: u32) -> Vec<(LaneOffset, u32)> {
    LaneOffset::CANDIDATES
        .iter()
        .filter_map(|&offset| offset.apply(lane, lane_count).map(|target| (offset, target)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateCost {
    pub offset: LaneOffset,
    pub lane: u32,
    pub cost: CostBreakdown,
}

/// Outcome of one planning cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Offset to act on.
    pub offset: LaneOffset,
    /// Arbitration winner before any override.
    pub nominal: LaneOffset,
    pub overridden: bool,
    pub distance_to_exit: f64,
    pub candidates: Vec<CandidateCost>,
}

/// Rollout, costing and arbitration for one vehicle snapshot.
///
/// Speed is held constant in the rollout and is the same for every candidate,
/// so the safety, efficiency and comfort terms come out identical across lanes.
/// In practice the choice is driven by the switch and route terms.
pub struct Planner {
    horizon: f64,
    step: f64,
    evaluator: CostEvaluator,
    merge_policy: MandatoryMergePolicy,
}

impl Planner {
    pub fn new(params: &Params) -> Self {
        Self {
            horizon: params.horizon,
            step: params.step,
            evaluator: CostEvaluator::new(params.weights, params.step),
            merge_policy: MandatoryMergePolicy::new(params.mandatory.clone()),
        }
    }

    pub fn plan(&self, sample: &StateSample) -> Decision {
        let vehicle = &sample.vehicle;
        let distance = self.merge_policy.distance_to_exit(&sample.edge_id, sample.edge_length, vehicle.position);

        let candidates: Vec<CandidateCost> = feasible_candidates(vehicle.lane, sample.lane_count)
            .into_iter()
            .map(|(offset, lane)| {
                let trajectory = Trajectory::rollout(vehicle, offset, lane, self.horizon, self.step);
                let route = self.merge_policy.route_penalty(lane, distance);
                let cost = self.evaluator.evaluate(&trajectory, vehicle.lane, route);
                debug!(
                    "candidate {} -> lane {}: total {:.4} (safety {:.4}, eff {:.2}, route {:.4}, switch {})",
                    offset, lane, cost.total, cost.safety, cost.efficiency, cost.route, cost.switch
                );
                CandidateCost { offset, lane, cost }
            })
            .collect();

        let nominal = ArbitrationEngine::select(&candidates);
        let hard_override = self.merge_policy.hard_override(vehicle.lane, distance);
        let offset = ArbitrationEngine::resolve(nominal, hard_override);

        Decision {
            offset,
            nominal,
            overridden: hard_override.is_some(),
            distance_to_exit: distance,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MandatoryCfg, Weights};
    use crate::simulation::VehicleState;

    fn sample(lane: u32, lane_count: u32, position: f64) -> StateSample {
        StateSample {
            vehicle: VehicleState { position, speed: 20.0, lane },
            edge_id: "E1".into(),
            lane_count,
            edge_length: 400.0,
        }
    }

    #[test]
    fn test_candidates_always_include_stay() {
        for lane_count in 1..6 {
            for lane in 0..lane_count {
                let candidates = feasible_candidates(lane, lane_count);
                assert!(!candidates.is_empty());
                assert!(candidates.contains(&(LaneOffset::Stay, lane)));
                assert!(candidates.iter().all(|&(_, target)| target < lane_count));
            }
        }
    }

    #[test]
    fn test_candidate_order_and_edges() {
        assert_eq!(
            feasible_candidates(1, 3),
            vec![(LaneOffset::Right, 0), (LaneOffset::Stay, 1), (LaneOffset::Left, 2)]
        );
        assert_eq!(feasible_candidates(0, 1), vec![(LaneOffset::Stay, 0)]);
        assert_eq!(feasible_candidates(2, 3), vec![(LaneOffset::Right, 1), (LaneOffset::Stay, 2)]);
    }

    #[test]
    fn test_offset_display() {
        assert_eq!(LaneOffset::Right.to_string(), "-1");
        assert_eq!(LaneOffset::Stay.to_string(), "+0");
        assert_eq!(LaneOffset::Left.to_string(), "+1");
    }

    #[test]
    fn test_discretionary_plan_stays() {
        let planner = Planner::new(&Params::default());
        let decision = planner.plan(&sample(1, 3, 50.0));

        assert_eq!(decision.offset, LaneOffset::Stay);
        assert!(!decision.overridden);
        assert_eq!(decision.candidates.len(), 3);
        assert_eq!(decision.distance_to_exit, f64::INFINITY);
        assert!(decision.candidates.iter().all(|c| c.cost.route == 0.0));
    }

    #[test]
    fn test_soft_merge_pulls_towards_goal_lane() {
        let params = Params {
            weights: Weights { route: 1.0, switch: 0.01, ..Weights::default() },
            mandatory: MandatoryCfg {
                exit_edge: "E1_exit".into(),
                goal_lane: 0,
                trigger_distance: 100.0,
                escalation: 10.0,
                hard_deadline: false,
            },
            ..Params::default()
        };
        let planner = Planner::new(&params);

        // 50 m before the exit, lane 1 of 3
        let decision = planner.plan(&sample(1, 3, 350.0));
        assert_eq!(decision.distance_to_exit, 50.0);
        assert_eq!(decision.offset, LaneOffset::Right);
        assert!(!decision.overridden);
    }

    #[test]
    fn test_hard_override_beats_nominal() {
        let params = Params {
            // Route has no influence, so arbitration alone would stay
            weights: Weights { route: 0.0, ..Weights::default() },
            mandatory: MandatoryCfg {
                exit_edge: "E1_exit".into(),
                goal_lane: 0,
                trigger_distance: 100.0,
                escalation: 10.0,
                hard_deadline: true,
            },
            ..Params::default()
        };
        let planner = Planner::new(&params);

        let decision = planner.plan(&sample(2, 3, 380.0));
        assert_eq!(decision.nominal, LaneOffset::Stay);
        assert_eq!(decision.offset, LaneOffset::Right);
        assert!(decision.overridden);
    }
}
