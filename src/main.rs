use anyhow::Result;
use clap::Parser;
use log::info;

use lane_change_sim::{
    config::{Enrollment, ExperimentConfig},
    controller::ControllerFleet,
    driver::SimulationDriver,
    simulation::HighwaySim,
};

#[derive(Parser)]
#[command(name = "lane-change-sim")]
#[command(about = "Horizon-rollout lane-change controllers on a simulated highway")]
struct Args {
    /// Experiment configuration file
    #[arg(short, long, default_value = "experiment.toml")]
    config: String,

    /// Random seed for reproducible demand
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many simulated seconds (overrides the config)
    #[arg(short = 't', long)]
    max_time: Option<f64>,

    /// Enable verbose logging, including per-candidate costs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting lane-change simulation");

    let config = ExperimentConfig::load_from_file(&args.config)?;
    info!(
        "Loaded {}: {} main-line edges, {} exits, {} vehicles",
        args.config,
        config.network.edges.len(),
        config.network.exits.len(),
        config.demand.total_vehicles
    );

    let params = &config.controller;
    info!(
        "Planner: horizon {:.1}s, step {:.2}s, replan {:.2} Hz",
        params.horizon, params.step, params.replan_hz
    );
    if params.mandatory.is_configured() {
        info!(
            "Mandatory merge: exit {} via lane {}, trigger {:.0} m, hard deadline {}",
            params.mandatory.exit_edge,
            params.mandatory.goal_lane,
            params.mandatory.trigger_distance,
            params.mandatory.hard_deadline
        );
    }
    match &config.enrollment {
        Enrollment::Explicit { vehicles } => info!("Controlling {} listed vehicles", vehicles.len()),
        Enrollment::Auto { vehicle_type } => info!("Controlling every '{}' vehicle", vehicle_type),
    }

    let sim = HighwaySim::from_config(&config, args.seed);
    let fleet = ControllerFleet::new(config.controller.clone(), config.enrollment.clone());
    let time_limit = args.max_time.unwrap_or(config.simulation.time_limit);

    let mut driver = SimulationDriver::new(sim, fleet, time_limit);
    let summary = driver.run()?;
    let stats = driver.simulator().stats();

    info!("Simulation completed!");
    info!("Simulated time: {:.1}s over {} steps", summary.sim_time, summary.steps);
    info!("Vehicles: {} spawned, {} arrived", stats.spawned, stats.arrived);
    info!("Exits: {} taken, {} missed", stats.exits_taken, stats.exits_missed);
    info!("Lane changes executed: {}", stats.lane_changes);
    info!(
        "Controllers: {} enrolled, {} retired, {} plans, {} lane changes commanded, {} overrides",
        summary.fleet.enrolled,
        summary.fleet.retired,
        summary.fleet.plans,
        summary.fleet.lane_changes,
        summary.fleet.overrides
    );
    info!(
        "Fleet tick time: avg {:.3}ms, max {:.3}ms",
        summary.average_tick_time.as_secs_f64() * 1000.0,
        summary.max_tick_time.as_secs_f64() * 1000.0
    );

    Ok(())
}
