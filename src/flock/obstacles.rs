use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::avoidance::ObstacleProbe;
use super::math::{ray_aabb, ray_sphere};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Sphere { radius: f32 },
    /// Box centered on the entity, rotated with its transform.
    Cuboid { half_extents: Vec3 },
}

/// Solid static geometry. Placement comes from the entity's `Transform`
/// (translation and rotation; scale is ignored).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub shape: ObstacleShape,
}

impl Obstacle {
    pub fn sphere(radius: f32) -> Self {
        Self { shape: ObstacleShape::Sphere { radius } }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self { shape: ObstacleShape::Cuboid { half_extents } }
    }
}

/// One obstacle frozen in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedObstacle {
    pub center: Vec3,
    pub rotation: Quat,
    pub shape: ObstacleShape,
}

impl PlacedObstacle {
    /// Distance along the unit ray to the first surface hit within `max_distance`.
    pub fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        match self.shape {
            ObstacleShape::Sphere { radius } => ray_sphere(origin, direction, max_distance, self.center, radius),
            ObstacleShape::Cuboid { half_extents } => {
                let to_local = self.rotation.inverse();
                let local_origin = to_local * (origin - self.center);
                let local_direction = to_local * direction;
                ray_aabb(local_origin, local_direction, max_distance, -half_extents, half_extents)
            }
        }
    }
}

/// Snapshot of every obstacle in the world, rebuilt whenever one changes.
#[derive(Resource, Debug, Default)]
pub struct ObstacleField {
    obstacles: Vec<PlacedObstacle>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<PlacedObstacle>) -> Self {
        Self { obstacles }
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn push(&mut self, obstacle: PlacedObstacle) {
        self.obstacles.push(obstacle);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl ObstacleProbe for ObstacleField {
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.ray_cast(origin, direction, max_distance).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_blocks_only_within_range() {
        let field = ObstacleField::new(vec![PlacedObstacle {
            center: Vec3::new(200.0, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            shape: ObstacleShape::Sphere { radius: 50.0 },
        }]);

        assert!(field.probe(Vec3::ZERO, Vec3::X, 300.0));
        assert!(!field.probe(Vec3::ZERO, Vec3::X, 100.0));
        assert!(!field.probe(Vec3::ZERO, Vec3::Y, 300.0));
    }

    #[test]
    fn test_rotated_cuboid_uses_its_own_frame() {
        // A thin slab along local X, rotated 90 degrees about Z so it spans world Y.
        let slab = PlacedObstacle {
            center: Vec3::new(100.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            shape: ObstacleShape::Cuboid { half_extents: Vec3::new(200.0, 5.0, 200.0) },
        };

        // Ray along world X crosses the slab's thin dimension.
        let t = slab.ray_cast(Vec3::ZERO, Vec3::X, 300.0).expect("slab should be hit");
        assert!((t - 95.0).abs() < 1e-2);

        // Ray parallel to the slab, offset beyond its thickness, misses.
        assert!(slab.ray_cast(Vec3::new(0.0, 0.0, 0.0), Vec3::Y, 300.0).is_none());
    }

    #[test]
    fn test_empty_field_never_blocks() {
        let field = ObstacleField::default();
        assert!(!field.probe(Vec3::ZERO, Vec3::X, f32::MAX));
    }
}
