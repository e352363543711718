use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lane_change_sim::{
    config::{ExperimentConfig, MandatoryCfg, Params},
    controller::ControllerFleet,
    planner::Planner,
    simulation::{HighwaySim, StateSample, TrafficSimulator, VehicleState},
};

fn benchmark_plan_cycle(c: &mut Criterion) {
    let params = Params {
        mandatory: MandatoryCfg {
            exit_edge: "E1_exit".into(),
            goal_lane: 0,
            trigger_distance: 300.0,
            escalation: 10.0,
            hard_deadline: true,
        },
        ..Params::default()
    };
    let planner = Planner::new(&params);
    let sample = StateSample {
        vehicle: VehicleState { position: 420.0, speed: 24.0, lane: 1 },
        edge_id: "E1".into(),
        lane_count: 3,
        edge_length: 600.0,
    };

    c.bench_function("plan_cycle", |b| {
        b.iter(|| planner.plan(black_box(&sample)))
    });
}

fn benchmark_fleet_tick(c: &mut Criterion) {
    let config = ExperimentConfig::load_from_file("experiment.toml")
        .expect("Failed to load configuration");

    let mut group = c.benchmark_group("fleet_tick");

    for warmup_steps in [20, 60, 120].iter() {
        let mut sim = HighwaySim::from_config(&config, Some(42));
        let mut fleet = ControllerFleet::new(config.controller.clone(), config.enrollment.clone());

        // Populate the highway before measuring
        for _ in 0..*warmup_steps {
            sim.step().unwrap();
            let t = sim.time();
            fleet.tick(&mut sim, t);
        }

        // Advance the planning clock by one replan interval per call
        let mut t = sim.time();
        group.bench_function(format!("after_{}_steps", warmup_steps), |b| {
            b.iter(|| {
                t += config.controller.replan_interval();
                fleet.tick(black_box(&mut sim), t)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_plan_cycle, benchmark_fleet_tick);
criterion_main!(benches);
