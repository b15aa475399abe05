use std::f32::consts::TAU;

use bevy::math::{Quat, Vec3};

/// Golden ratio used to space points along the spiral.
const GOLDEN_RATIO: f32 = 1.618_034;

/// Fixed set of unit probe directions owned by a flock.
///
/// Built from a golden-angle spiral: index 0 is the +Z pole and the polar
/// angle grows with the index, so scanning in order visits directions by
/// increasing deviation from the pole. The set is only ever rebuilt whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AvoidanceSensorSet {
    directions: Vec<Vec3>,
}

impl AvoidanceSensorSet {
    pub fn new(num_sensors: usize) -> Self {
        Self {
            directions: spiral_directions(num_sensors),
        }
    }

    pub fn rebuild(&mut self, num_sensors: usize) {
        self.directions = spiral_directions(num_sensors);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    #[inline]
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Directions rotated so the pole points along `heading`.
    pub fn oriented(&self, heading: Vec3) -> impl Iterator<Item = Vec3> + '_ {
        let rotation = match heading.try_normalize() {
            Some(dir) => Quat::from_rotation_arc(Vec3::Z, dir),
            None => Quat::IDENTITY,
        };
        self.directions.iter().map(move |dir| rotation * *dir)
    }
}

fn spiral_directions(num_sensors: usize) -> Vec<Vec3> {
    let n = num_sensors as f32;
    (0..num_sensors)
        .map(|i| {
            let i = i as f32;
            let theta = TAU * GOLDEN_RATIO * i;
            let phi = (1.0 - 2.0 * i / n).acos();
            Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), phi.cos())
        })
        .collect()
}
