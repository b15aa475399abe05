use bevy::prelude::*;
use rand::Rng;

use super::components::{Boid, BoidCage, CagedBy, VolumeSpawner};
use super::controller::FlockController;
use super::math::{heading_or, heading_rotation, DEFAULT_FORWARD};
use super::parameters::FlockParameters;
use super::resources::FlockRng;

/// Speed a freshly spawned boid starts with: the middle of its flock's band.
pub fn spawn_speed(params: &FlockParameters) -> f32 {
    0.5 * (params.min_speed() + params.max_speed())
}

/// Uniform point inside the box `center ± half_extents`.
pub fn random_point_in_box<R: Rng + ?Sized>(rng: &mut R, center: Vec3, half_extents: Vec3) -> Vec3 {
    let unit = Vec3::new(
        rng.random::<f32>() * 2.0 - 1.0,
        rng.random::<f32>() * 2.0 - 1.0,
        rng.random::<f32>() * 2.0 - 1.0,
    );
    center + unit * half_extents.abs()
}

/// Uniformly distributed unit vector.
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z = rng.random::<f32>() * 2.0 - 1.0;
    let theta = rng.random::<f32>() * std::f32::consts::TAU;
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), ring * theta.sin(), z)
}

/// Spawn a boid entity. Membership is picked up by the flock on the next tick.
pub fn spawn_boid(commands: &mut Commands, position: Vec3, velocity: Vec3, flock: Option<Entity>) -> Entity {
    let entity = commands.spawn_empty().id();
    let transform = Transform::from_translation(position)
        .with_rotation(heading_rotation(heading_or(velocity, DEFAULT_FORWARD)));
    commands
        .entity(entity)
        .insert((Boid::new(entity, position, velocity, flock), transform));
    entity
}

/// Spawn `count` boids at random spots inside a cage, each on a random heading.
pub(crate) fn spawn_in_cage(
    commands: &mut Commands,
    rng: &mut FlockRng,
    cage_entity: Entity,
    cage: &BoidCage,
    center: Vec3,
    params: &FlockParameters,
    count: usize,
) {
    let speed = spawn_speed(params);
    for _ in 0..count {
        let position = random_point_in_box(&mut rng.0, center, cage.half_extents);
        let velocity = random_direction(&mut rng.0) * speed;
        let boid = spawn_boid(commands, position, velocity, Some(cage.flock));
        commands.entity(boid).insert(CagedBy(cage_entity));
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Populate every newly added cage with its initial flock.
pub fn seed_cages(
    mut commands: Commands,
    mut rng: ResMut<FlockRng>,
    cages: Query<(Entity, &BoidCage, &Transform), Added<BoidCage>>,
    flocks: Query<&FlockController>,
) {
    for (entity, cage, transform) in cages.iter() {
        let Ok(flock) = flocks.get(cage.flock) else {
            warn!("No flock found for boid cage {:?}; nothing spawned", entity);
            continue;
        };
        spawn_in_cage(
            &mut commands,
            &mut rng,
            entity,
            cage,
            transform.translation,
            flock.params(),
            cage.initial_count,
        );
        info!("Boid cage {:?} seeded {} boids", entity, cage.initial_count);
    }
}

/// Burst once when a spawner appears; flow spawners repeat every interval.
pub fn run_volume_spawners(
    mut commands: Commands,
    time: Res<Time>,
    mut rng: ResMut<FlockRng>,
    mut spawners: Query<(Entity, &mut VolumeSpawner, &Transform)>,
    flocks: Query<&FlockController>,
) {
    for (entity, mut spawner, transform) in spawners.iter_mut() {
        let mut waves = u32::from(spawner.is_added());
        if let Some(timer) = spawner.timer.as_mut() {
            timer.tick(time.delta());
            waves += timer.times_finished_this_tick();
        }
        if waves == 0 || spawner.count == 0 {
            continue;
        }

        let Ok(flock) = flocks.get(spawner.flock) else {
            warn!("No flock found for volume spawner {:?}; nothing spawned", entity);
            continue;
        };

        let velocity = spawner.flow_direction.normalize_or(DEFAULT_FORWARD) * spawn_speed(flock.params());
        for _ in 0..waves {
            for _ in 0..spawner.count {
                let position = random_point_in_box(&mut rng.0, transform.translation, spawner.half_extents);
                spawn_boid(&mut commands, position, velocity, Some(spawner.flock));
            }
        }
        debug!("Volume spawner {:?} released {} boids", entity, waves as usize * spawner.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_points_stay_inside_box() {
        let mut rng = StdRng::seed_from_u64(1);
        let center = Vec3::new(10.0, -20.0, 30.0);
        let half = Vec3::new(5.0, 1.0, 100.0);
        for _ in 0..500 {
            let p = random_point_in_box(&mut rng, center, half);
            let local = (p - center).abs();
            assert!(local.x <= half.x && local.y <= half.y && local.z <= half.z);
        }
    }

    #[test]
    fn test_random_directions_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..500 {
            assert!((random_direction(&mut rng).length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_spawn_speed_is_mid_band() {
        assert_eq!(spawn_speed(&FlockParameters::default()), 500.0);
    }
}
