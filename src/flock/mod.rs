//! Boids flocking: a pure steering core plus the Bevy world layer around it.
//!
//! The core (`parameters`, `sensors`, `steering`, `avoidance`, `targets`,
//! `agent`, `registry`, `controller`) only sees the world through the
//! [`NeighborQuery`] and [`ObstacleProbe`] traits. Everything else wires that
//! core into an `App`: boids are entities carrying a [`Boid`] component,
//! flocks are entities carrying a [`FlockController`].

use bevy::prelude::*;

pub mod agent;
pub mod avoidance;
pub mod components;
pub mod config;
pub mod containment;
pub mod controller;
pub mod events;
pub mod math;
pub mod obstacles;
pub mod parameters;
pub mod registry;
pub mod resources;
pub mod sensors;
pub mod spatial_hash;
pub mod spawning;
pub mod steering;
pub mod systems;
pub mod targets;

pub use agent::{BoidAgent, SteeringReport};
pub use avoidance::{ObstacleProbe, OpenSky};
pub use components::{Boid, BoidCage, CagedBy, RegisteredWith, SpawnMode, TargetObject, VolumeDespawner, VolumeSpawner};
pub use config::{FlockConfig, FlockConfigPlugin};
pub use controller::{FlockController, FlockView, ParameterChange};
pub use events::{BoidDespawned, DespawnReason, FlockCommand};
pub use obstacles::{Obstacle, ObstacleField, ObstacleShape};
pub use parameters::{FlockParameters, FlockTuning};
pub use registry::{BoidId, FlockRegistry, Neighbor, NeighborList, NeighborQuery};
pub use resources::{FlockRng, FlockTick};
pub use sensors::AvoidanceSensorSet;
pub use spatial_hash::SpatialHash;
pub use spawning::spawn_boid;
pub use targets::{ProximityScaling, TargetForce};

/// Order of the flocking work inside one `Update` pass.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum FlockSet {
    Commands,     // Parameter changes and spawning
    Membership,   // Flock registry bookkeeping
    Perception,   // Spatial hash and obstacle snapshots
    Targets,      // Attractor/repeller submissions
    Steering,     // Boid updates
    Containment,  // Cage wrap and outlets
    Presentation, // Pose -> Transform
}

/// Runs flocks, boids and their surrounding volumes.
///
/// Needs a `Time` resource; `DefaultPlugins` (or `MinimalPlugins`) provides it.
pub struct FlockPlugin;

impl Plugin for FlockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FlockTick>()
            .init_resource::<FlockRng>()
            .init_resource::<SpatialHash>()
            .init_resource::<ObstacleField>()
            .add_message::<FlockCommand>()
            .add_message::<BoidDespawned>();

        app.configure_sets(
            Update,
            (
                FlockSet::Commands,
                FlockSet::Membership,
                FlockSet::Perception,
                FlockSet::Targets,
                FlockSet::Steering,
                FlockSet::Containment,
                FlockSet::Presentation,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (
                (
                    systems::increment_flock_tick,
                    systems::apply_flock_commands,
                    spawning::seed_cages,
                    spawning::run_volume_spawners,
                )
                    .chain()
                    .in_set(FlockSet::Commands),
                systems::sync_flock_membership.in_set(FlockSet::Membership),
                (systems::rebuild_spatial_hash, systems::rebuild_obstacle_field).in_set(FlockSet::Perception),
                systems::apply_target_objects.in_set(FlockSet::Targets),
                systems::steer_boids.in_set(FlockSet::Steering),
                (containment::wrap_caged_boids, containment::despawn_in_volumes)
                    .chain()
                    .in_set(FlockSet::Containment),
                systems::sync_boid_transforms.in_set(FlockSet::Presentation),
            ),
        );
    }
}
