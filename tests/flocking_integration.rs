use bevy::ecs::message::Messages;
use bevy::prelude::*;
use murmuration::flock::config::spawn_flock_scene;
use murmuration::flock::{
    Boid, FlockCommand, FlockConfig, FlockController, FlockPlugin, FlockTuning, ObstacleShape, ParameterChange,
    TargetForce,
};
use murmuration::flock::config::{CageConfig, ObstacleConfig, TargetConfig};
use std::time::Duration;

const DT: f32 = 1.0 / 60.0;

fn step(app: &mut App) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(DT));
    app.update();
}

fn scene(boids: usize) -> FlockConfig {
    FlockConfig {
        seed: 9,
        cages: vec![CageConfig {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(800.0),
            initial_count: boids,
        }],
        targets: vec![TargetConfig {
            position: Vec3::new(0.0, 300.0, 0.0),
            force: TargetForce::constant(800.0),
            range: None,
        }],
        obstacles: vec![ObstacleConfig {
            position: Vec3::new(300.0, 0.0, 0.0),
            rotation: Vec3::ZERO,
            shape: ObstacleShape::Sphere { radius: 150.0 },
        }],
        ..FlockConfig::default()
    }
}

fn scene_app(config: FlockConfig) -> App {
    let mut app = App::new();
    app.init_resource::<Time>();
    app.add_plugins(FlockPlugin);
    app.insert_resource(config);
    app.add_systems(Startup, spawn_flock_scene);
    app
}

fn flock_entity(app: &mut App) -> Entity {
    let mut query = app.world_mut().query_filtered::<Entity, With<FlockController>>();
    query.single(app.world()).expect("scene should have one flock")
}

fn speeds(app: &mut App) -> Vec<f32> {
    let mut query = app.world_mut().query::<&Boid>();
    query.iter(app.world()).map(|b| b.agent.velocity.length()).collect()
}

#[test]
fn test_scene_spawns_configured_flock() {
    let mut config = scene(25);
    config.tuning = FlockTuning {
        max_speed: 900.0,
        min_speed: 100.0,
        ..FlockTuning::default()
    };
    let mut app = scene_app(config);

    step(&mut app);

    let flock = flock_entity(&mut app);
    let controller = app.world().get::<FlockController>(flock).expect("flock");
    assert_eq!(controller.params().max_speed(), 900.0);
    assert_eq!(controller.params().min_speed(), 100.0);
    assert_eq!(controller.registry().len(), 25);
    assert_eq!(speeds(&mut app).len(), 25);
}

#[test]
fn test_speed_band_holds_for_whole_flock() {
    let mut app = scene_app(scene(60));

    for _ in 0..240 {
        step(&mut app);
        for speed in speeds(&mut app) {
            assert!(speed.is_finite());
            assert!((300.0..=700.0).contains(&speed), "speed {speed} left the band");
        }
    }
}

#[test]
fn test_speed_change_applies_to_whole_flock_next_tick() {
    let mut app = scene_app(scene(40));
    for _ in 0..30 {
        step(&mut app);
    }

    let flock = flock_entity(&mut app);
    app.world_mut()
        .resource_mut::<Messages<FlockCommand>>()
        .write(FlockCommand {
            flock,
            change: ParameterChange::MaxSpeed(320.0),
        });
    step(&mut app);

    for speed in speeds(&mut app) {
        assert!((300.0..=320.0).contains(&speed), "speed {speed} ignored the new band");
    }
}

#[test]
fn test_sensor_count_change_rebuilds_sensors() {
    let mut app = scene_app(scene(5));
    step(&mut app);

    let flock = flock_entity(&mut app);
    app.world_mut()
        .resource_mut::<Messages<FlockCommand>>()
        .write(FlockCommand {
            flock,
            change: ParameterChange::NumSensors(12),
        });
    step(&mut app);

    let controller = app.world().get::<FlockController>(flock).expect("flock");
    assert_eq!(controller.params().num_sensors(), 12);
    assert_eq!(controller.sensors().len(), 12);
}

#[test]
fn test_attractor_draws_flock_in() {
    let mut config = scene(30);
    config.obstacles.clear();
    config.cages[0].half_extents = Vec3::splat(3000.0);
    // Isolate the target force from flocking.
    config.tuning = FlockTuning {
        alignment_strength: 0.0,
        separation_strength: 0.0,
        cohesion_strength: 0.0,
        ..FlockTuning::default()
    };
    config.targets[0] = TargetConfig {
        position: Vec3::ZERO,
        force: TargetForce::constant(5000.0),
        range: None,
    };
    let mut app = scene_app(config);

    step(&mut app);
    let mean_distance = |app: &mut App| {
        let mut query = app.world_mut().query::<&Boid>();
        let positions: Vec<Vec3> = query.iter(app.world()).map(|b| b.agent.position).collect();
        positions.iter().map(|p| p.length()).sum::<f32>() / positions.len() as f32
    };
    let before = mean_distance(&mut app);

    for _ in 0..300 {
        step(&mut app);
    }
    let after = mean_distance(&mut app);

    assert!(after < before, "mean distance to attractor went from {before} to {after}");
}
