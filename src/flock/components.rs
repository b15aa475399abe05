use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::agent::BoidAgent;
use super::registry::BoidId;
use super::targets::TargetForce;

// ============================================================================
// Boids
// ============================================================================

/// A flocking agent. `flock` points at an entity holding a `FlockController`.
///
/// Adding this component registers the boid with its flock on the next tick;
/// removing it (or despawning the entity) unregisters it.
#[derive(Component, Debug, Clone)]
pub struct Boid {
    pub agent: BoidAgent,
    pub flock: Option<Entity>,
}

impl Boid {
    /// The agent's id is derived from the entity, so the boid has to be
    /// spawned first and attached afterwards (see `spawn_boid`).
    pub fn new(entity: Entity, position: Vec3, velocity: Vec3, flock: Option<Entity>) -> Self {
        Self {
            agent: BoidAgent::new(BoidId::from(entity), position, velocity),
            flock,
        }
    }
}

/// Flock a boid is currently registered with. Maintained by the membership
/// systems, never written by user code.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredWith(pub Entity);

/// Cage that owns a boid for wrap-around containment.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CagedBy(pub Entity);

// ============================================================================
// Attractors / Repellers
// ============================================================================

/// Pulls (positive strength) or pushes (negative) boids toward the entity's
/// translation every tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct TargetObject {
    pub force: TargetForce,
    /// Only boids within this distance are affected. `None` reaches every boid.
    pub range: Option<f32>,
}

// ============================================================================
// Volumes
// ============================================================================

/// Box that seeds a flock and keeps it inside by wrapping boids to the
/// opposite face. Centered on the entity's translation, axis-aligned.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BoidCage {
    pub half_extents: Vec3,
    pub initial_count: usize,
    pub flock: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnMode {
    /// Spawn once when the spawner appears.
    Burst,
    /// Spawn once on appearance, then again every `interval` seconds.
    Flow { interval: f32 },
}

/// Box spawner that releases boids heading along `flow_direction`.
#[derive(Component, Debug, Clone)]
pub struct VolumeSpawner {
    pub half_extents: Vec3,
    pub flow_direction: Vec3,
    pub count: usize,
    pub mode: SpawnMode,
    pub flock: Entity,
    pub(crate) timer: Option<Timer>,
}

impl VolumeSpawner {
    pub fn new(half_extents: Vec3, flow_direction: Vec3, count: usize, mode: SpawnMode, flock: Entity) -> Self {
        let timer = match mode {
            SpawnMode::Burst => None,
            SpawnMode::Flow { interval } if interval > 0.0 && interval.is_finite() => {
                Some(Timer::from_seconds(interval, TimerMode::Repeating))
            }
            SpawnMode::Flow { interval } => {
                warn!("Flow spawner interval {} is not positive; spawner will only burst", interval);
                None
            }
        };
        Self {
            half_extents,
            flow_direction,
            count,
            mode,
            flock,
            timer,
        }
    }
}

/// Box outlet: boids entering it leave their flock and are despawned.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct VolumeDespawner {
    pub half_extents: Vec3,
}
