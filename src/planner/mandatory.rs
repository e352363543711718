use super::LaneOffset;
use crate::config::MandatoryCfg;

/// Distance (m) below which a hard deadline makes off-goal lanes unusable.
pub const HARD_DEADLINE_DISTANCE: f64 = 5.0;

/// Penalty given to off-goal candidates inside the hard deadline. Infinite, so
/// it loses against every finite candidate regardless of the route weight.
pub const DEADLINE_PENALTY: f64 = f64::INFINITY;

/// Slope of the logistic ramp around the trigger distance (1/m).
const ESCALATION_SLOPE: f64 = 0.1;

/// Escalating penalty and hard override that push a vehicle into its goal
/// lane before a configured exit.
pub struct MandatoryMergePolicy {
    cfg: MandatoryCfg,
}

impl MandatoryMergePolicy {
    pub fn new(cfg: MandatoryCfg) -> Self {
        Self { cfg }
    }

    pub fn is_active(&self) -> bool {
        self.cfg.is_configured()
    }

    /// Remaining distance to the exit. Only known on the edge whose id is a
    /// prefix of the exit edge id; infinite everywhere else.
    pub fn distance_to_exit(&self, edge_id: &str, edge_length: f64, position: f64) -> f64 {
        if self.is_active() && !edge_id.is_empty() && self.cfg.exit_edge.starts_with(edge_id) {
            edge_length - position
        } else {
            f64::INFINITY
        }
    }

    /// Route term for a candidate ending in `candidate_lane`.
    pub fn route_penalty(&self, candidate_lane: u32, distance: f64) -> f64 {
        if !self.is_active() || candidate_lane == self.cfg.goal_lane {
            return 0.0;
        }

        if self.cfg.hard_deadline && distance < HARD_DEADLINE_DISTANCE {
            return DEADLINE_PENALTY;
        }

        self.cfg.escalation * logistic(ESCALATION_SLOPE * (distance - self.cfg.trigger_distance))
    }

    /// Offset forced regardless of arbitration, if the deadline is close.
    ///
    /// Only ever moves towards lower lane indices: a vehicle below its goal
    /// lane is held in place rather than pushed up.
    pub fn hard_override(&self, current_lane: u32, distance: f64) -> Option<LaneOffset> {
        let cfg = &self.cfg;
        let fires = self.is_active()
            && current_lane != cfg.goal_lane
            && cfg.hard_deadline
            && distance < cfg.trigger_distance;

        if !fires {
            return None;
        }

        if current_lane > cfg.goal_lane {
            Some(LaneOffset::Right)
        } else {
            Some(LaneOffset::Stay)
        }
    }
}

/// 1 / (1 + e^x): close to 1 for very negative x, 0 at +inf.
fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + x.exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(hard_deadline: bool) -> MandatoryCfg {
        MandatoryCfg {
            exit_edge: "E1_exit".into(),
            goal_lane: 0,
            trigger_distance: 100.0,
            escalation: 10.0,
            hard_deadline,
        }
    }

    #[test]
    fn test_unconfigured_policy_is_inert() {
        let policy = MandatoryMergePolicy::new(MandatoryCfg::default());
        assert!(!policy.is_active());
        assert_eq!(policy.distance_to_exit("E1", 100.0, 99.0), f64::INFINITY);
        assert_eq!(policy.route_penalty(2, 0.0), 0.0);
        assert_eq!(policy.hard_override(2, 0.0), None);
    }

    #[test]
    fn test_distance_only_on_prefix_edge() {
        let policy = MandatoryMergePolicy::new(cfg(false));
        assert_eq!(policy.distance_to_exit("E1", 400.0, 150.0), 250.0);
        assert_eq!(policy.distance_to_exit("E2", 400.0, 150.0), f64::INFINITY);
        assert_eq!(policy.distance_to_exit("", 400.0, 150.0), f64::INFINITY);
    }

    #[test]
    fn test_penalty_escalates_towards_exit() {
        let policy = MandatoryMergePolicy::new(cfg(false));
        let far = policy.route_penalty(1, 300.0);
        let at_trigger = policy.route_penalty(1, 100.0);
        let near = policy.route_penalty(1, 10.0);

        assert!(far < at_trigger && at_trigger < near);
        assert!((at_trigger - 5.0).abs() < 1e-12);
        assert!(near < 10.0);
        assert_eq!(policy.route_penalty(1, f64::INFINITY), 0.0);
        assert_eq!(policy.route_penalty(0, 10.0), 0.0);
    }

    #[test]
    fn test_hard_deadline_sentinel() {
        let policy = MandatoryMergePolicy::new(cfg(true));
        assert_eq!(policy.route_penalty(2, 4.9), DEADLINE_PENALTY);
        assert!(policy.route_penalty(2, 5.0).is_finite());
        assert_eq!(policy.route_penalty(0, 1.0), 0.0);

        // Soft policy never uses the sentinel
        let soft = MandatoryMergePolicy::new(cfg(false));
        assert!(soft.route_penalty(2, 1.0).is_finite());
    }

    #[test]
    fn test_hard_override_direction() {
        let policy = MandatoryMergePolicy::new(cfg(true));
        assert_eq!(policy.hard_override(2, 50.0), Some(LaneOffset::Right));
        assert_eq!(policy.hard_override(0, 50.0), None);
        assert_eq!(policy.hard_override(2, 150.0), None);

        let mut upward = cfg(true);
        upward.goal_lane = 2;
        let policy = MandatoryMergePolicy::new(upward);
        assert_eq!(policy.hard_override(0, 50.0), Some(LaneOffset::Stay));
    }

    #[test]
    fn test_override_requires_hard_deadline() {
        let policy = MandatoryMergePolicy::new(cfg(false));
        assert_eq!(policy.hard_override(2, 1.0), None);
    }
}
