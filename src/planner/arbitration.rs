use super::{CandidateCost, LaneOffset};

pub struct ArbitrationEngine;

impl ArbitrationEngine {
    /// Minimum-cost candidate. Candidates are taken in the order given; a later
    /// one only wins with a strictly lower total, so ties go to the earlier
    /// offset. Falls back to `Stay` when nothing has a finite cost.
    pub fn select(candidates: &[CandidateCost]) -> LaneOffset {
        let mut best = LaneOffset::Stay;
        let mut best_cost = f64::INFINITY;

        for candidate in candidates {
            if candidate.cost.total < best_cost {
                best = candidate.offset;
                best_cost = candidate.cost.total;
            }
        }

        best
    }

    /// The override, when present, replaces the nominal winner unconditionally.
    pub fn resolve(nominal: LaneOffset, hard_override: Option<LaneOffset>) -> LaneOffset {
        hard_override.unwrap_or(nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::CostBreakdown;

    fn candidate(offset: LaneOffset, total: f64) -> CandidateCost {
        CandidateCost {
            offset,
            lane: 1,
            cost: CostBreakdown {
                safety: 0.0,
                efficiency: 0.0,
                comfort: 0.0,
                route: 0.0,
                pref: 0.0,
                switch: 0.0,
                coop: 0.0,
                total,
            },
        }
    }

    #[test]
    fn test_lowest_cost_wins() {
        let candidates = [
            candidate(LaneOffset::Right, 3.0),
            candidate(LaneOffset::Stay, 2.0),
            candidate(LaneOffset::Left, 1.0),
        ];
        assert_eq!(ArbitrationEngine::select(&candidates), LaneOffset::Left);
    }

    #[test]
    fn test_ties_go_to_first_in_order() {
        let candidates = [
            candidate(LaneOffset::Right, 1.0),
            candidate(LaneOffset::Stay, 1.0),
            candidate(LaneOffset::Left, 1.0),
        ];
        assert_eq!(ArbitrationEngine::select(&candidates), LaneOffset::Right);
    }

    #[test]
    fn test_all_infinite_stays() {
        let candidates = [
            candidate(LaneOffset::Right, f64::INFINITY),
            candidate(LaneOffset::Left, f64::INFINITY),
        ];
        assert_eq!(ArbitrationEngine::select(&candidates), LaneOffset::Stay);
        assert_eq!(ArbitrationEngine::select(&[]), LaneOffset::Stay);
    }

    #[test]
    fn test_override_replaces_nominal() {
        assert_eq!(
            ArbitrationEngine::resolve(LaneOffset::Left, Some(LaneOffset::Right)),
            LaneOffset::Right
        );
        assert_eq!(ArbitrationEngine::resolve(LaneOffset::Left, None), LaneOffset::Left);
    }
}
