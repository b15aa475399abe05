use bevy::prelude::*;

use crate::profile_log;

use super::components::{Boid, RegisteredWith, TargetObject};
use super::controller::FlockController;
use super::events::FlockCommand;
use super::obstacles::{Obstacle, ObstacleField, PlacedObstacle};
use super::registry::{BoidId, Neighbor};
use super::resources::FlockTick;
use super::spatial_hash::{FlockNeighbors, SpatialHash};

// ============================================================================
// Commands
// ============================================================================

pub fn increment_flock_tick(mut tick: ResMut<FlockTick>) {
    tick.increment();
}

/// Apply queued parameter changes before any boid steers this tick.
pub fn apply_flock_commands(
    mut commands_in: MessageReader<FlockCommand>,
    mut flocks: Query<&mut FlockController>,
) {
    for command in commands_in.read() {
        match flocks.get_mut(command.flock) {
            Ok(mut flock) => {
                debug!("Flock {:?}: applying {:?}", command.flock, command.change);
                flock.apply(command.change);
            }
            Err(_) => warn!("Parameter change {:?} for unknown flock {:?} ignored", command.change, command.flock),
        }
    }
}

// ============================================================================
// Membership
// ============================================================================

/// Keep every flock's registry in step with its boids' `flock` field.
///
/// Handles new boids, boids moved between flocks and boids whose `Boid`
/// component went away (including despawns).
pub fn sync_flock_membership(
    mut commands: Commands,
    boids: Query<(Entity, &Boid, Option<&RegisteredWith>)>,
    mut flocks: Query<&mut FlockController>,
    mut removed: RemovedComponents<Boid>,
) {
    for entity in removed.read() {
        let id = BoidId::from(entity);
        for mut flock in flocks.iter_mut() {
            flock.unregister(id);
        }
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.remove::<RegisteredWith>();
        }
    }

    for (entity, boid, registered) in boids.iter() {
        let current = registered.map(|r| r.0);
        if current == boid.flock {
            continue;
        }

        let id = boid.agent.id();
        if let Some(old) = current {
            if let Ok(mut flock) = flocks.get_mut(old) {
                flock.unregister(id);
            }
        }

        let Some(flock_entity) = boid.flock else {
            commands.entity(entity).remove::<RegisteredWith>();
            continue;
        };
        match flocks.get_mut(flock_entity) {
            Ok(mut flock) => {
                flock.register(id);
                commands.entity(entity).insert(RegisteredWith(flock_entity));
            }
            Err(_) => {
                debug!("Boid {:?} points at {:?}, which is not a flock", entity, flock_entity);
                commands.entity(entity).remove::<RegisteredWith>();
            }
        }
    }
}

// ============================================================================
// Perception
// ============================================================================

/// Snapshot every boid into the spatial hash for this tick's neighbor queries.
pub fn rebuild_spatial_hash(mut hash: ResMut<SpatialHash>, boids: Query<&Boid>) {
    hash.clear();
    for boid in boids.iter() {
        hash.insert(Neighbor {
            id: boid.agent.id(),
            position: boid.agent.position,
            velocity: boid.agent.velocity,
        });
    }
}

/// Rebuild the obstacle field when any obstacle was added, moved or removed.
pub fn rebuild_obstacle_field(
    mut field: ResMut<ObstacleField>,
    obstacles: Query<(&Obstacle, &Transform)>,
    changed: Query<(), (With<Obstacle>, Or<(Changed<Obstacle>, Changed<Transform>)>)>,
    mut removed: RemovedComponents<Obstacle>,
) {
    let any_removed = removed.read().count() > 0;
    if changed.is_empty() && !any_removed {
        return;
    }

    field.clear();
    for (obstacle, transform) in obstacles.iter() {
        field.push(PlacedObstacle {
            center: transform.translation,
            rotation: transform.rotation,
            shape: obstacle.shape,
        });
    }
    debug!("Obstacle field rebuilt with {} obstacles", field.len());
}

// ============================================================================
// Targets
// ============================================================================

/// Every target object submits its force to each boid in range.
pub fn apply_target_objects(targets: Query<(&TargetObject, &Transform)>, mut boids: Query<&mut Boid>) {
    if targets.is_empty() {
        return;
    }

    for mut boid in boids.iter_mut() {
        let agent = &mut boid.agent;
        for (target, transform) in targets.iter() {
            let target_pos = transform.translation;
            if let Some(range) = target.range {
                if agent.position.distance_squared(target_pos) > range * range {
                    continue;
                }
            }
            let force = target.force.compute(target_pos, agent.position, agent.velocity);
            agent.submit_force(force);
        }
    }
}

// ============================================================================
// Steering
// ============================================================================

/// Advance every boid by one tick.
///
/// Flock controllers, the spatial hash and the obstacle field are only read
/// here; each boid writes only its own state.
pub fn steer_boids(
    time: Res<Time>,
    #[allow(unused_variables)] tick: Res<FlockTick>,
    hash: Res<SpatialHash>,
    field: Res<ObstacleField>,
    flocks: Query<&FlockController>,
    mut boids: Query<&mut Boid>,
) {
    let delta = time.delta_secs();
    #[cfg(feature = "perf_stats")]
    let (mut degraded, mut avoiding) = (0usize, 0usize);

    for mut boid in boids.iter_mut() {
        let boid = &mut *boid;
        let controller = boid.flock.and_then(|flock| flocks.get(flock).ok());
        #[allow(unused_variables)]
        let report = match controller {
            Some(controller) => {
                let neighbors = FlockNeighbors {
                    hash: &*hash,
                    registry: controller.registry(),
                };
                boid.agent.update(Some(controller.view(&neighbors)), &*field, delta)
            }
            None => boid.agent.update(None, &*field, delta),
        };
        #[cfg(feature = "perf_stats")]
        {
            degraded += usize::from(report.degraded);
            avoiding += usize::from(report.avoidance.is_some());
        }
    }

    profile_log!(
        tick,
        "[FLOCK] tick {} | {} boids | {} avoiding | {} without flock",
        tick.0,
        hash.len(),
        avoiding,
        degraded
    );
}

// ============================================================================
// Presentation
// ============================================================================

/// Copy each boid's simulated pose into its `Transform`.
pub fn sync_boid_transforms(mut boids: Query<(&Boid, &mut Transform)>) {
    for (boid, mut transform) in boids.iter_mut() {
        transform.translation = boid.agent.position;
        transform.rotation = boid.agent.orientation;
    }
}

#[cfg(test)]
#[path = "systems_tests.rs"]
mod tests;
