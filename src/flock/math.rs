use bevy::math::{Quat, Vec3};

pub const EPSILON: f32 = 1.0e-6;

/// Forward axis of an unrotated boid (Bevy's `Transform::forward`).
pub const DEFAULT_FORWARD: Vec3 = Vec3::NEG_Z;

/// Unit heading of `velocity`, or `fallback` when the velocity is degenerate.
#[inline]
pub fn heading_or(velocity: Vec3, fallback: Vec3) -> Vec3 {
    velocity.normalize_or(fallback)
}

/// Clamp the magnitude of `velocity` into `[min_speed, max_speed]`.
///
/// The band holds exactly for `length()`, not just to within rounding. A
/// velocity already inside the band is returned untouched so repeated
/// clamping never drifts. A zero velocity is restored along `fallback_heading`
/// at `min_speed`.
pub fn clamp_speed(velocity: Vec3, min_speed: f32, max_speed: f32, fallback_heading: Vec3) -> Vec3 {
    if velocity.length_squared() <= EPSILON {
        let heading = heading_or(fallback_heading, DEFAULT_FORWARD);
        return rescale_into_band(heading, min_speed, min_speed, max_speed);
    }

    let speed = velocity.length();
    if speed < min_speed {
        rescale_into_band(velocity, min_speed, min_speed, max_speed)
    } else if speed > max_speed {
        rescale_into_band(velocity, max_speed, min_speed, max_speed)
    } else {
        velocity
    }
}

/// Scale `velocity` to `speed`, then step one ulp at a time until rounding
/// puts its length inside `[min_speed, max_speed]`.
fn rescale_into_band(velocity: Vec3, speed: f32, min_speed: f32, max_speed: f32) -> Vec3 {
    let mut scaled = velocity * (speed / velocity.length());
    for _ in 0..8 {
        let length = scaled.length();
        if length > max_speed {
            scaled *= 1.0 - f32::EPSILON;
        } else if length < min_speed {
            scaled *= 1.0 + f32::EPSILON;
        } else {
            break;
        }
    }
    scaled
}

/// Rotation that takes [`DEFAULT_FORWARD`] onto `heading`.
pub fn heading_rotation(heading: Vec3) -> Quat {
    let dir = heading.normalize_or_zero();
    if dir == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(DEFAULT_FORWARD, dir)
}

/// Frame-rate independent interpolation factor for exponential smoothing.
///
/// `sharpness` is the inverse time constant; `1 - e^(-sharpness * dt)` gives
/// the same curve regardless of how a second is sliced into ticks.
#[inline]
pub fn smoothing_factor(sharpness: f32, delta: f32) -> f32 {
    (1.0 - (-sharpness * delta).exp()).clamp(0.0, 1.0)
}

// ============================================================================
// Ray casts
// ============================================================================

/// Distance along a unit ray to the first hit on a sphere, if within `max_distance`.
///
/// A ray starting inside the sphere hits at distance zero.
pub fn ray_sphere(origin: Vec3, direction: Vec3, max_distance: f32, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let b = to_origin.dot(direction);
    if b > 0.0 {
        // Outside and pointing away.
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    (t <= max_distance).then_some(t.max(0.0))
}

/// Slab test against an axis-aligned box given in the ray's frame.
pub fn ray_aabb(origin: Vec3, direction: Vec3, max_distance: f32, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = 0.0_f32;
    let mut t_far = max_distance;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() <= EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    Some(t_near)
}

/// True when `point` lies inside the axis-aligned box `center ± half_extents`.
///
/// Non-finite points are never inside.
#[inline]
pub fn box_contains(center: Vec3, half_extents: Vec3, point: Vec3) -> bool {
    let local = (point - center).abs();
    local.x <= half_extents.x && local.y <= half_extents.y && local.z <= half_extents.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_speed_leaves_in_band_velocity_untouched() {
        let v = Vec3::new(300.0, 0.0, 0.0);
        assert_eq!(clamp_speed(v, 300.0, 700.0, Vec3::X), v);
    }

    #[test]
    fn test_clamp_speed_raises_slow_and_caps_fast() {
        let slow = clamp_speed(Vec3::new(0.0, 10.0, 0.0), 300.0, 700.0, Vec3::X);
        assert!((slow.length() - 300.0).abs() < 1e-3);
        assert!(slow.y > 0.0);

        let fast = clamp_speed(Vec3::new(0.0, 0.0, -5000.0), 300.0, 700.0, Vec3::X);
        assert!((fast.length() - 700.0).abs() < 1e-3);
        assert!(fast.z < 0.0);
    }

    #[test]
    fn test_clamp_speed_band_is_exact() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..100_000 {
            let v = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5) * rng.f32() * 4000.0;
            let speed = clamp_speed(v, 300.0, 700.0, Vec3::X).length();
            assert!((300.0..=700.0).contains(&speed), "speed {speed} from {v:?}");
        }
    }

    #[test]
    fn test_clamp_speed_restores_zero_velocity_along_fallback() {
        let v = clamp_speed(Vec3::ZERO, 300.0, 700.0, Vec3::Y);
        assert!((v - Vec3::new(0.0, 300.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_heading_rotation_points_forward_axis_at_heading() {
        let heading = Vec3::new(1.0, 1.0, 0.0).normalize();
        let rotated = heading_rotation(heading) * DEFAULT_FORWARD;
        assert!((rotated - heading).length() < 1e-4);

        // Anti-parallel must not produce NaN.
        let back = heading_rotation(Vec3::Z) * DEFAULT_FORWARD;
        assert!((back - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_smoothing_factor_is_frame_rate_independent() {
        let one_step = smoothing_factor(7.0, 0.1);
        let half = smoothing_factor(7.0, 0.05);
        // Two half steps cover the same remaining distance as one full step.
        let two_steps = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((one_step - two_steps).abs() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_hits_and_misses() {
        let hit = ray_sphere(Vec3::ZERO, Vec3::X, 100.0, Vec3::new(50.0, 0.0, 0.0), 10.0);
        assert!((hit.unwrap() - 40.0).abs() < 1e-4);

        assert!(ray_sphere(Vec3::ZERO, Vec3::X, 30.0, Vec3::new(50.0, 0.0, 0.0), 10.0).is_none());
        assert!(ray_sphere(Vec3::ZERO, Vec3::NEG_X, 100.0, Vec3::new(50.0, 0.0, 0.0), 10.0).is_none());
        assert!(ray_sphere(Vec3::ZERO, Vec3::Y, 100.0, Vec3::new(50.0, 0.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn test_ray_aabb_hits_face() {
        let t = ray_aabb(
            Vec3::ZERO,
            Vec3::X,
            100.0,
            Vec3::new(20.0, -5.0, -5.0),
            Vec3::new(30.0, 5.0, 5.0),
        );
        assert!((t.unwrap() - 20.0).abs() < 1e-4);

        let parallel_miss = ray_aabb(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::X,
            100.0,
            Vec3::new(20.0, -5.0, -5.0),
            Vec3::new(30.0, 5.0, 5.0),
        );
        assert!(parallel_miss.is_none());
    }

    #[test]
    fn test_box_contains_rejects_nan() {
        assert!(box_contains(Vec3::ZERO, Vec3::splat(1.0), Vec3::splat(0.5)));
        assert!(!box_contains(Vec3::ZERO, Vec3::splat(1.0), Vec3::new(f32::NAN, 0.0, 0.0)));
    }
}
