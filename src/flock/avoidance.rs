use bevy::math::Vec3;

use super::parameters::FlockParameters;
use super::sensors::AvoidanceSensorSet;

/// Ray probe supplied by the world/physics layer.
pub trait ObstacleProbe {
    /// True if a ray from `origin` along unit `direction` hits an obstacle
    /// within `max_distance`.
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool;
}

/// A world with nothing in it.
pub struct OpenSky;

impl ObstacleProbe for OpenSky {
    fn probe(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> bool {
        false
    }
}

/// Probe straight ahead along the velocity.
///
/// A boid with no velocity has no "ahead" and never reports an obstacle.
pub fn is_obstacle_ahead<P>(world: &P, position: Vec3, velocity: Vec3, sensor_radius: f32) -> bool
where
    P: ObstacleProbe + ?Sized,
{
    match velocity.try_normalize() {
        Some(heading) => world.probe(position, heading, sensor_radius),
        None => false,
    }
}

/// Escape force toward the least-deviating open sensor direction.
///
/// Sensors are scanned pole-first after rotating the pole onto the heading,
/// so the first open direction is also the one closest to the current
/// course. When every direction is blocked the boid turns around.
pub fn avoid_obstacle<P>(
    world: &P,
    sensors: &AvoidanceSensorSet,
    params: &FlockParameters,
    position: Vec3,
    heading: Vec3,
) -> Vec3
where
    P: ObstacleProbe + ?Sized,
{
    let escape = sensors
        .oriented(heading)
        .find(|dir| !world.probe(position, *dir, params.sensor_radius()))
        .unwrap_or(-heading);

    escape * params.avoidance_strength()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Blocks every direction whose dot with `normal` exceeds `threshold`.
    struct Wall {
        normal: Vec3,
        threshold: f32,
    }

    impl ObstacleProbe for Wall {
        fn probe(&self, _origin: Vec3, direction: Vec3, _max_distance: f32) -> bool {
            direction.dot(self.normal) > self.threshold
        }
    }

    struct Enclosed;

    impl ObstacleProbe for Enclosed {
        fn probe(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> bool {
            true
        }
    }

    #[test]
    fn test_nothing_ahead_in_open_sky() {
        assert!(!is_obstacle_ahead(&OpenSky, Vec3::ZERO, Vec3::X * 300.0, 300.0));
    }

    #[test]
    fn test_stationary_boid_sees_nothing_ahead() {
        assert!(!is_obstacle_ahead(&Enclosed, Vec3::ZERO, Vec3::ZERO, 300.0));
    }

    #[test]
    fn test_escape_direction_is_open_and_close_to_heading() {
        let params = FlockParameters::default();
        let sensors = AvoidanceSensorSet::new(params.num_sensors());
        let wall = Wall { normal: Vec3::X, threshold: 0.33 };

        let force = avoid_obstacle(&wall, &sensors, &params, Vec3::ZERO, Vec3::X);
        let dir = force / params.avoidance_strength();

        assert!((dir.length() - 1.0).abs() < 1e-4);
        assert!(!wall.probe(Vec3::ZERO, dir, params.sensor_radius()));
        // Closest open direction sits right at the wall's edge.
        assert!(dir.dot(Vec3::X) > 0.1);
    }

    #[test]
    fn test_fully_enclosed_boid_reverses() {
        let params = FlockParameters::default();
        let sensors = AvoidanceSensorSet::new(params.num_sensors());
        let force = avoid_obstacle(&Enclosed, &sensors, &params, Vec3::ZERO, Vec3::Y);
        assert!((force - Vec3::NEG_Y * params.avoidance_strength()).length() < 1e-2);
    }

    #[test]
    fn test_empty_sensor_set_reverses() {
        let params = FlockParameters::default();
        let force = avoid_obstacle(&OpenSky, &AvoidanceSensorSet::new(0), &params, Vec3::ZERO, Vec3::Z);
        assert_eq!(force, Vec3::NEG_Z * params.avoidance_strength());
    }
}
