use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

use super::components::{BoidCage, SpawnMode, TargetObject, VolumeDespawner, VolumeSpawner};
use super::controller::FlockController;
use super::obstacles::{Obstacle, ObstacleShape};
use super::parameters::FlockTuning;
use super::resources::{FlockRng, DEFAULT_SEED};
use super::spatial_hash::{SpatialHash, DEFAULT_CELL_SIZE};
use super::targets::TargetForce;

pub const DEFAULT_SCENE_PATH: &str = "assets/flock_config.ron";
pub const DEFAULT_TUNING_ASSET: &str = "default.tuning.ron";

// ============================================================================
// Scene description
// ============================================================================

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CageConfig {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub initial_count: usize,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SpawnerConfig {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub flow_direction: Vec3,
    pub count: usize,
    pub mode: SpawnMode,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DespawnerConfig {
    pub center: Vec3,
    pub half_extents: Vec3,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TargetConfig {
    pub position: Vec3,
    pub force: TargetForce,
    #[serde(default)]
    pub range: Option<f32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ObstacleConfig {
    pub position: Vec3,
    /// XYZ Euler angles in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    pub shape: ObstacleShape,
}

/// Startup scene: one flock plus the volumes, targets and obstacles around it.
///
/// Read synchronously once at startup. Only `tuning` can change later, via
/// the hot-reloaded tuning asset.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FlockConfig {
    pub seed: u64,
    pub cell_size: f32,
    pub tuning: FlockTuning,
    pub cages: Vec<CageConfig>,
    pub spawners: Vec<SpawnerConfig>,
    pub despawners: Vec<DespawnerConfig>,
    pub targets: Vec<TargetConfig>,
    pub obstacles: Vec<ObstacleConfig>,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            cell_size: DEFAULT_CELL_SIZE,
            tuning: FlockTuning::default(),
            cages: vec![CageConfig {
                center: Vec3::ZERO,
                half_extents: Vec3::splat(2500.0),
                initial_count: 150,
            }],
            spawners: Vec::new(),
            despawners: Vec::new(),
            targets: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

pub fn parse_flock_config(contents: &str) -> Result<FlockConfig, ron::error::SpannedError> {
    ron::from_str::<FlockConfig>(contents)
}

/// Read a scene file, falling back to [`FlockConfig::default`] on any error.
pub fn read_flock_config(path: &str) -> FlockConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_flock_config(&contents) {
            Ok(config) => {
                info!("Loaded flock config from {}", path);
                config
            }
            Err(e) => {
                error!("Failed to parse flock config {}: {}", path, e);
                error!("Using default FlockConfig");
                FlockConfig::default()
            }
        },
        Err(e) => {
            error!("Failed to read {}: {}", path, e);
            error!("Using default FlockConfig");
            FlockConfig::default()
        }
    }
}

// ============================================================================
// Plugin
// ============================================================================

/// Handle to the hot-reloadable flock tuning asset.
#[derive(Resource)]
pub struct FlockTuningHandle(pub Handle<FlockTuning>);

/// Loads the startup scene from RON and keeps flock tuning hot-reloadable.
///
/// Requires Bevy's `AssetPlugin` (part of `DefaultPlugins`).
pub struct FlockConfigPlugin {
    pub scene_path: String,
    pub tuning_asset: String,
}

impl Default for FlockConfigPlugin {
    fn default() -> Self {
        Self {
            scene_path: DEFAULT_SCENE_PATH.to_string(),
            tuning_asset: DEFAULT_TUNING_ASSET.to_string(),
        }
    }
}

#[derive(Resource, Clone)]
struct ConfigPaths {
    scene_path: String,
    tuning_asset: String,
}

impl Plugin for FlockConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<FlockTuning>::new(&["tuning.ron"]))
            .insert_resource(ConfigPaths {
                scene_path: self.scene_path.clone(),
                tuning_asset: self.tuning_asset.clone(),
            })
            .add_systems(Startup, (load_flock_config, spawn_flock_scene, load_tuning_asset).chain())
            .add_systems(Update, apply_tuning_changes);
    }
}

/// Load the scene config synchronously; everything seeded from it must see it.
fn load_flock_config(mut commands: Commands, paths: Res<ConfigPaths>) {
    let config = read_flock_config(&paths.scene_path);
    commands.insert_resource(FlockRng::seeded(config.seed));
    commands.insert_resource(SpatialHash::new(config.cell_size));
    commands.insert_resource(config);
}

fn load_tuning_asset(mut commands: Commands, asset_server: Res<AssetServer>, paths: Res<ConfigPaths>) {
    let handle = asset_server.load(paths.tuning_asset.clone());
    commands.insert_resource(FlockTuningHandle(handle));
}

/// Push a (re)loaded tuning asset into every flock.
fn apply_tuning_changes(
    handle: Option<Res<FlockTuningHandle>>,
    tunings: Res<Assets<FlockTuning>>,
    mut events: MessageReader<AssetEvent<FlockTuning>>,
    mut flocks: Query<&mut FlockController>,
) {
    let Some(handle) = handle else { return };
    for event in events.read() {
        if !(event.is_modified(handle.0.id()) || event.is_loaded_with_dependencies(handle.0.id())) {
            continue;
        }
        let Some(tuning) = tunings.get(&handle.0) else { continue };
        for mut flock in flocks.iter_mut() {
            flock.apply_tuning(tuning);
        }
        info!("Applied flock tuning to {} flocks", flocks.iter().len());
    }
}

// ============================================================================
// Scene spawning
// ============================================================================

/// Spawn the flock and every volume, target and obstacle described by `config`.
///
/// Returns the flock entity. Cages and spawners populate themselves once the
/// flock systems run.
pub fn spawn_scene(commands: &mut Commands, config: &FlockConfig) -> Entity {
    let flock = commands
        .spawn((Name::new("Flock"), FlockController::from_tuning(&config.tuning)))
        .id();

    for cage in &config.cages {
        commands.spawn((
            Name::new("Boid Cage"),
            BoidCage {
                half_extents: cage.half_extents,
                initial_count: cage.initial_count,
                flock,
            },
            Transform::from_translation(cage.center),
        ));
    }

    for spawner in &config.spawners {
        commands.spawn((
            Name::new("Volume Spawner"),
            VolumeSpawner::new(spawner.half_extents, spawner.flow_direction, spawner.count, spawner.mode, flock),
            Transform::from_translation(spawner.center),
        ));
    }

    for despawner in &config.despawners {
        commands.spawn((
            Name::new("Volume Despawner"),
            VolumeDespawner {
                half_extents: despawner.half_extents,
            },
            Transform::from_translation(despawner.center),
        ));
    }

    for target in &config.targets {
        commands.spawn((
            Name::new("Target Object"),
            TargetObject {
                force: target.force,
                range: target.range,
            },
            Transform::from_translation(target.position),
        ));
    }

    for obstacle in &config.obstacles {
        let r = obstacle.rotation;
        let rotation = Quat::from_euler(EulerRot::XYZ, r.x.to_radians(), r.y.to_radians(), r.z.to_radians());
        commands.spawn((
            Name::new("Obstacle"),
            Obstacle { shape: obstacle.shape },
            Transform::from_translation(obstacle.position).with_rotation(rotation),
        ));
    }

    info!(
        "Spawned flock scene: {} cages, {} spawners, {} despawners, {} targets, {} obstacles",
        config.cages.len(),
        config.spawners.len(),
        config.despawners.len(),
        config.targets.len(),
        config.obstacles.len()
    );
    flock
}

pub fn spawn_flock_scene(mut commands: Commands, config: Res<FlockConfig>) {
    spawn_scene(&mut commands, &config);
}
