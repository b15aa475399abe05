use bevy::prelude::*;

use super::components::{Boid, BoidCage, CagedBy, RegisteredWith, VolumeDespawner};
use super::controller::FlockController;
use super::events::{BoidDespawned, DespawnReason};
use super::math::box_contains;
use super::resources::FlockRng;
use super::spawning::spawn_in_cage;

/// Where a boid outside a cage has to go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CageExit {
    Inside,
    /// Re-enter through the opposite face at this position.
    Wrap(Vec3),
    /// Outside but past no face (non-finite position).
    Unexpected,
}

/// Resolve a boid position against a cage.
///
/// Faces are tested X, then Y, then Z, positive side first. The crossed axis
/// is moved to the opposite face and the other two are clamped into the cage.
pub fn resolve_cage_exit(center: Vec3, half_extents: Vec3, position: Vec3) -> CageExit {
    if box_contains(center, half_extents, position) {
        return CageExit::Inside;
    }

    let min = center - half_extents;
    let max = center + half_extents;
    let clamped = position.clamp(min, max);

    for axis in 0..3 {
        if position[axis] > max[axis] {
            let mut wrapped = clamped;
            wrapped[axis] = min[axis];
            return CageExit::Wrap(wrapped);
        }
        if position[axis] < min[axis] {
            let mut wrapped = clamped;
            wrapped[axis] = max[axis];
            return CageExit::Wrap(wrapped);
        }
    }

    CageExit::Unexpected
}

fn remove_boid(
    commands: &mut Commands,
    flocks: &mut Query<&mut FlockController>,
    despawned: &mut MessageWriter<BoidDespawned>,
    entity: Entity,
    boid: &Boid,
    registered: Option<&RegisteredWith>,
    reason: DespawnReason,
) {
    if let Some(flock) = registered.map(|r| r.0) {
        if let Ok(mut controller) = flocks.get_mut(flock) {
            controller.unregister(boid.agent.id());
        }
    }
    commands.entity(entity).despawn();
    despawned.write(BoidDespawned {
        boid: entity,
        flock: boid.flock,
        reason,
    });
}

/// Wrap caged boids that left through a face; replace ones that left any other way.
pub fn wrap_caged_boids(
    mut commands: Commands,
    mut rng: ResMut<FlockRng>,
    mut boids: Query<(Entity, &mut Boid, &CagedBy, Option<&RegisteredWith>)>,
    cages: Query<(&BoidCage, &Transform)>,
    mut flocks: Query<&mut FlockController>,
    mut despawned: MessageWriter<BoidDespawned>,
) {
    for (entity, mut boid, caged_by, registered) in boids.iter_mut() {
        let Ok((cage, cage_transform)) = cages.get(caged_by.0) else {
            continue;
        };
        let center = cage_transform.translation;

        match resolve_cage_exit(center, cage.half_extents, boid.agent.position) {
            CageExit::Inside => {}
            CageExit::Wrap(position) => boid.agent.position = position,
            CageExit::Unexpected => {
                warn!(
                    "Boid {:?} left cage {:?} unexpectedly at {:?}; replacing it",
                    entity, caged_by.0, boid.agent.position
                );
                remove_boid(
                    &mut commands,
                    &mut flocks,
                    &mut despawned,
                    entity,
                    &boid,
                    registered,
                    DespawnReason::EscapedCage,
                );
                match flocks.get(cage.flock) {
                    Ok(flock) => {
                        let params = flock.params().clone();
                        spawn_in_cage(&mut commands, &mut rng, caged_by.0, cage, center, &params, 1);
                    }
                    Err(_) => warn!("No flock found for boid cage {:?}; replacement skipped", caged_by.0),
                }
            }
        }
    }
}

/// Unregister and despawn every boid inside an outlet volume.
pub fn despawn_in_volumes(
    mut commands: Commands,
    volumes: Query<(&VolumeDespawner, &Transform)>,
    boids: Query<(Entity, &Boid, Option<&RegisteredWith>)>,
    mut flocks: Query<&mut FlockController>,
    mut despawned: MessageWriter<BoidDespawned>,
) {
    if volumes.is_empty() {
        return;
    }

    for (entity, boid, registered) in boids.iter() {
        let inside = volumes
            .iter()
            .any(|(volume, transform)| box_contains(transform.translation, volume.half_extents, boid.agent.position));
        if inside {
            remove_boid(
                &mut commands,
                &mut flocks,
                &mut despawned,
                entity,
                boid,
                registered,
                DespawnReason::Outlet,
            );
        }
    }
}
