use super::LaneOffset;
use crate::simulation::VehicleState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub position: f64,
    pub speed: f64,
    pub lane: u32,
}

/// Projected trajectory for one candidate offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub offset: LaneOffset,
    pub step: f64,
    pub samples: Vec<TrajectorySample>,
}

impl Trajectory {
    /// Constant-speed rollout in the candidate lane. No acceleration model and
    /// no interaction with other traffic; the lane offset is taken as
    /// instantaneous. `lane` must already be the in-range candidate lane.
    pub fn rollout(initial: &VehicleState, offset: LaneOffset, lane: u32, horizon: f64, step: f64) -> Self {
        let n = sample_count(horizon, step);
        let mut samples = Vec::with_capacity(n);
        let mut position = initial.position;

        for _ in 0..n {
            samples.push(TrajectorySample {
                position,
                speed: initial.speed,
                lane,
            });
            position += initial.speed * step;
        }

        Self { offset, step, samples }
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Upper bound on samples per rollout accepted by parameter validation.
pub const MAX_ROLLOUT_SAMPLES: usize = 10_000;

/// floor(horizon / step) + 1. Saturates instead of overflowing on unvalidated
/// input; callers are expected to pass validated parameters.
pub fn sample_count(horizon: f64, step: f64) -> usize {
    ((horizon / step).floor() as usize).saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> VehicleState {
        VehicleState { position: 12.0, speed: 20.0, lane: 1 }
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(8.0, 0.5), 17);
        assert_eq!(sample_count(1.0, 0.3), 4);
        assert_eq!(sample_count(0.2, 0.5), 1);
    }

    #[test]
    fn test_rollout_length_over_grid() {
        let horizons = [0.1, 0.7, 1.0, 2.5, 3.3, 8.0, 10.0, 17.9, 60.0];
        let steps = [0.05, 0.1, 0.25, 0.3, 0.5, 0.7, 1.0, 1.3, 2.0, 4.0];

        for &horizon in &horizons {
            for &step in &steps {
                let traj = Trajectory::rollout(&state(), LaneOffset::Right, 0, horizon, step);
                let expected = (horizon / step).floor() as usize + 1;

                assert_eq!(traj.len(), expected, "horizon {} step {}", horizon, step);
                assert_eq!(traj.step, step);
                assert!(traj.samples.iter().all(|s| s.speed == 20.0 && s.lane == 0));
                assert_eq!(traj.samples[0].position, 12.0);
                for pair in traj.samples.windows(2) {
                    assert!((pair[1].position - pair[0].position - 20.0 * step).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_sample_count_saturates() {
        assert_eq!(sample_count(f64::INFINITY, 0.5), usize::MAX);
    }

    #[test]
    fn test_rollout_holds_speed_and_lane() {
        let traj = Trajectory::rollout(&state(), LaneOffset::Left, 2, 8.0, 0.5);

        assert_eq!(traj.len(), 17);
        assert!(traj.samples.iter().all(|s| s.speed == 20.0 && s.lane == 2));
        assert_eq!(traj.samples[0].position, 12.0);
        assert_eq!(traj.samples[1].position, 22.0);
        assert_eq!(traj.last().unwrap().position, 12.0 + 16.0 * 10.0);
    }

    #[test]
    fn test_standing_vehicle_does_not_move() {
        let initial = VehicleState { position: 5.0, speed: 0.0, lane: 0 };
        let traj = Trajectory::rollout(&initial, LaneOffset::Stay, 0, 2.0, 0.5);

        assert_eq!(traj.len(), 5);
        assert!(traj.samples.iter().all(|s| s.position == 5.0));
    }
}
