//! Flocking steering behaviors: separation, alignment and cohesion.
//!
//! Each behavior filters neighbors through its own perception cone, so the
//! three forces are independent. A behavior with no qualifying neighbor
//! contributes exactly zero.

use bevy::math::Vec3;

use super::parameters::FlockParameters;
use super::registry::Neighbor;

/// Closest distance used for inverse-distance weighting.
///
/// Neighbors nearer than this (including coincident ones) all get the same,
/// maximal repulsion instead of an unbounded one.
pub const MIN_SEPARATION_DISTANCE: f32 = 1.0;

/// Kinematic state of the boid doing the steering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit forward direction used for the perception cones.
    pub forward: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
}

impl SteeringForces {
    pub const ZERO: Self = Self {
        separation: Vec3::ZERO,
        alignment: Vec3::ZERO,
        cohesion: Vec3::ZERO,
    };

    #[inline]
    pub fn total(&self) -> Vec3 {
        self.separation + self.alignment + self.cohesion
    }
}

/// True if `offset` (neighbor minus self) lies inside the cone `fov` around `forward`.
///
/// Coincident neighbors have no direction and are always perceived.
#[inline]
pub fn in_field_of_view(forward: Vec3, offset: Vec3, fov: f32) -> bool {
    // A full sphere must not lose neighbors directly behind to rounding.
    if fov <= -1.0 {
        return true;
    }
    match offset.try_normalize() {
        Some(dir) => forward.dot(dir) >= fov,
        None => true,
    }
}

/// Push away from neighbors, weighted by inverse distance.
pub fn separation(me: &Kinematics, params: &FlockParameters, neighbors: &[Neighbor]) -> Vec3 {
    let mut force = Vec3::ZERO;
    for neighbor in neighbors {
        let offset = neighbor.position - me.position;
        if !in_field_of_view(me.forward, offset, params.separation_fov()) {
            continue;
        }

        let distance = offset.length();
        let away = (-offset).normalize_or(-me.forward);
        force += away / distance.max(MIN_SEPARATION_DISTANCE);
    }
    force * params.separation_strength()
}

/// Steer velocity toward the mean velocity of perceived neighbors.
pub fn alignment(me: &Kinematics, params: &FlockParameters, neighbors: &[Neighbor]) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0u32;
    for neighbor in neighbors {
        if in_field_of_view(me.forward, neighbor.position - me.position, params.alignment_fov()) {
            sum += neighbor.velocity;
            count += 1;
        }
    }

    if count == 0 {
        return Vec3::ZERO;
    }
    (sum / count as f32 - me.velocity) * params.alignment_strength()
}

/// Steer toward the mean position of perceived neighbors.
pub fn cohesion(me: &Kinematics, params: &FlockParameters, neighbors: &[Neighbor]) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0u32;
    for neighbor in neighbors {
        if in_field_of_view(me.forward, neighbor.position - me.position, params.cohesion_fov()) {
            sum += neighbor.position;
            count += 1;
        }
    }

    if count == 0 {
        return Vec3::ZERO;
    }
    let center = sum / count as f32;
    (center - me.position).normalize_or_zero() * params.cohesion_strength()
}

pub fn steer(me: &Kinematics, params: &FlockParameters, neighbors: &[Neighbor]) -> SteeringForces {
    SteeringForces {
        separation: separation(me, params, neighbors),
        alignment: alignment(me, params, neighbors),
        cohesion: cohesion(me, params, neighbors),
    }
}
