use anyhow::Result;
use log::{debug, info};
use std::time::{Duration, Instant};

use crate::controller::{ControllerFleet, FleetStats};
use crate::simulation::TrafficSimulator;

#[derive(Debug)]
pub struct PerformanceTracker {
    samples: Vec<Duration>,
    max_samples: usize,
    current_tick_start: Option<Instant>,
    max_tick_time: Duration,
}

impl PerformanceTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            current_tick_start: None,
            max_tick_time: Duration::ZERO,
        }
    }

    pub fn start_tick(&mut self) {
        self.current_tick_start = Some(Instant::now());
    }

    pub fn end_tick(&mut self) {
        if let Some(start) = self.current_tick_start.take() {
            let tick_time = start.elapsed();
            self.max_tick_time = self.max_tick_time.max(tick_time);

            if self.samples.len() >= self.max_samples {
                self.samples.remove(0);
            }
            self.samples.push(tick_time);
        }
    }

    pub fn average_tick_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn max_tick_time(&self) -> Duration {
        self.max_tick_time
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: u64,
    pub sim_time: f64,
    pub fleet: FleetStats,
    pub average_tick_time: Duration,
    pub max_tick_time: Duration,
}

/// Steps the simulator and lets the fleet plan after every step.
pub struct SimulationDriver<S: TrafficSimulator> {
    sim: S,
    fleet: ControllerFleet,
    time_limit: f64,
    tracker: PerformanceTracker,
    steps: u64,
}

impl<S: TrafficSimulator> SimulationDriver<S> {
    pub fn new(sim: S, fleet: ControllerFleet, time_limit: f64) -> Self {
        Self {
            sim,
            fleet,
            time_limit,
            tracker: PerformanceTracker::new(1000),
            steps: 0,
        }
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn fleet(&self) -> &ControllerFleet {
        &self.fleet
    }

    /// False once no more vehicles are expected or the time limit is reached.
    pub fn should_continue(&self) -> bool {
        self.sim.min_expected_vehicles() > 0 && self.sim.time() < self.time_limit
    }

    /// One simulator step followed by one fleet tick.
    pub fn step(&mut self) -> Result<()> {
        self.sim.step()?;
        let sim_time = self.sim.time();

        self.tracker.start_tick();
        let report = self.fleet.tick(&mut self.sim, sim_time);
        self.tracker.end_tick();

        self.steps += 1;
        if !report.decisions.is_empty() {
            debug!("t={:.1}: {} plans, {} managed", sim_time, report.decisions.len(), self.fleet.len());
        }

        Ok(())
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Running until no vehicles are expected (limit {:.0}s)", self.time_limit);

        let mut next_status = 60.0;
        while self.should_continue() {
            self.step()?;

            if self.sim.time() >= next_status {
                info!(
                    "t={:.0}s: {} vehicles expected, {} managed, avg tick {:.3}ms",
                    self.sim.time(),
                    self.sim.min_expected_vehicles(),
                    self.fleet.len(),
                    self.tracker.average_tick_time().as_secs_f64() * 1000.0
                );
                next_status += 60.0;
            }
        }

        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            steps: self.steps,
            sim_time: self.sim.time(),
            fleet: self.fleet.stats().clone(),
            average_tick_time: self.tracker.average_tick_time(),
            max_tick_time: self.tracker.max_tick_time(),
        }
    }
}
