use bevy::prelude::*;

use bevy::window::WindowResolution;

use murmuration::flock::{
    Boid, BoidCage, FlockCommand, FlockConfigPlugin, FlockController, FlockPlugin, FlockSet, Obstacle, ObstacleShape,
    ParameterChange, TargetObject, VolumeDespawner, VolumeSpawner,
};

use bevy::log::LogPlugin;
use std::f32::consts::FRAC_PI_2;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_file_logging() -> String {
    // Create logs directory if it doesn't exist
    let log_dir = PathBuf::from("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create logs directory: {}", e);
    }

    // Keep only the last 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("murmuration_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wgpu=error,bevy_render=info,bevy_ecs=info,murmuration=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with("murmuration") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

// ============================================================================
// Demo scene
// ============================================================================

#[derive(Resource)]
struct DemoAssets {
    boid_mesh: Handle<Mesh>,
    boid_material: Handle<StandardMaterial>,
    obstacle_material: Handle<StandardMaterial>,
    attractor_material: Handle<StandardMaterial>,
    repeller_material: Handle<StandardMaterial>,
}

fn setup_demo(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 2500.0, 7000.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(1.0, 3.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(DemoAssets {
        boid_mesh: meshes.add(Cone {
            radius: 15.0,
            height: 60.0,
        }),
        boid_material: materials.add(Color::srgb(0.9, 0.9, 0.95)),
        obstacle_material: materials.add(Color::srgb(0.35, 0.4, 0.45)),
        attractor_material: materials.add(Color::srgb(0.2, 0.8, 0.3)),
        repeller_material: materials.add(Color::srgb(0.9, 0.25, 0.2)),
    });
}

/// Give every new boid a cone pointing along its forward (-Z) axis.
fn attach_boid_meshes(mut commands: Commands, assets: Res<DemoAssets>, boids: Query<Entity, Added<Boid>>) {
    for entity in boids.iter() {
        commands.entity(entity).insert(Visibility::default()).with_children(|parent| {
            parent.spawn((
                Mesh3d(assets.boid_mesh.clone()),
                MeshMaterial3d(assets.boid_material.clone()),
                Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
            ));
        });
    }
}

fn attach_scene_meshes(
    mut commands: Commands,
    assets: Res<DemoAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    obstacles: Query<(Entity, &Obstacle), Added<Obstacle>>,
    targets: Query<(Entity, &TargetObject), Added<TargetObject>>,
) {
    for (entity, obstacle) in obstacles.iter() {
        let mesh = match obstacle.shape {
            ObstacleShape::Sphere { radius } => meshes.add(Sphere::new(radius)),
            ObstacleShape::Cuboid { half_extents } => meshes.add(Cuboid::from_size(half_extents * 2.0)),
        };
        commands
            .entity(entity)
            .insert((Mesh3d(mesh), MeshMaterial3d(assets.obstacle_material.clone())));
    }

    for (entity, target) in targets.iter() {
        let material = if target.force.strength >= 0.0 {
            assets.attractor_material.clone()
        } else {
            assets.repeller_material.clone()
        };
        commands
            .entity(entity)
            .insert((Mesh3d(meshes.add(Sphere::new(40.0))), MeshMaterial3d(material)));
    }
}

fn draw_volumes(
    mut gizmos: Gizmos,
    cages: Query<(&BoidCage, &Transform)>,
    spawners: Query<(&VolumeSpawner, &Transform)>,
    despawners: Query<(&VolumeDespawner, &Transform)>,
) {
    let volume = |center: Vec3, half: Vec3| Transform::from_translation(center).with_scale(half * 2.0);

    for (cage, transform) in cages.iter() {
        gizmos.cuboid(volume(transform.translation, cage.half_extents), Color::srgb(0.5, 0.5, 0.6));
    }
    for (spawner, transform) in spawners.iter() {
        gizmos.cuboid(volume(transform.translation, spawner.half_extents), Color::srgb(0.3, 0.6, 1.0));
        gizmos.arrow(
            transform.translation,
            transform.translation + spawner.flow_direction.normalize_or_zero() * 400.0,
            Color::srgb(0.3, 0.6, 1.0),
        );
    }
    for (despawner, transform) in despawners.iter() {
        gizmos.cuboid(volume(transform.translation, despawner.half_extents), Color::srgb(1.0, 0.5, 0.2));
    }
}

fn orbit_camera(time: Res<Time>, mut cameras: Query<&mut Transform, With<Camera3d>>) {
    let angle = time.elapsed_secs() * 0.05;
    for mut transform in cameras.iter_mut() {
        *transform = Transform::from_xyz(7000.0 * angle.sin(), 2500.0, 7000.0 * angle.cos())
            .looking_at(Vec3::ZERO, Vec3::Y);
    }
}

/// Arrow keys nudge the speed band of every flock.
fn tune_with_keys(
    keys: Res<ButtonInput<KeyCode>>,
    flocks: Query<(Entity, &FlockController)>,
    mut commands_out: MessageWriter<FlockCommand>,
) {
    let step = if keys.just_pressed(KeyCode::ArrowUp) {
        50.0
    } else if keys.just_pressed(KeyCode::ArrowDown) {
        -50.0
    } else {
        return;
    };

    for (entity, flock) in flocks.iter() {
        let params = flock.params();
        let max_speed = (params.max_speed() + step).max(0.0);
        info!("Flock {:?}: max speed {} -> {}", entity, params.max_speed(), max_speed);
        commands_out.write(FlockCommand {
            flock: entity,
            change: ParameterChange::MaxSpeed(max_speed),
        });
    }
}

fn main() {
    let log_file = setup_file_logging();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Murmuration - Logging to file                           ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Murmuration".into(),
                        resolution: WindowResolution::new(1280, 720),
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .build()
                .disable::<LogPlugin>(), // We set up our own subscriber above
        )
        .insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)))
        .add_plugins((FlockPlugin, FlockConfigPlugin::default()))
        .add_systems(Startup, setup_demo)
        .add_systems(
            Update,
            (
                (attach_boid_meshes, attach_scene_meshes).after(FlockSet::Presentation),
                draw_volumes,
                orbit_camera,
                tune_with_keys.before(FlockSet::Commands),
            ),
        )
        .run();
}
