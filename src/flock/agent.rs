//! Per-boid state and the per-tick flocking update.
//!
//! A boid has a single behavior state, flocking. Each tick it:
//! 1. asks its flock for neighbors within the perception radius,
//! 2. computes separation, alignment and cohesion,
//! 3. probes for an obstacle ahead; if one is there the avoidance force
//!    replaces the flocking forces outright,
//! 4. drains its target-force queue and adds the sum,
//! 5. integrates velocity and clamps speed into the flock's band,
//! 6. integrates position,
//! 7. eases its cosmetic orientation toward the new heading.

use bevy::log::warn;
use bevy::math::{Quat, Vec3};

use super::avoidance::{self, ObstacleProbe};
use super::controller::{warn_missing_flock, FlockView};
use super::math::{clamp_speed, heading_or, heading_rotation, smoothing_factor, DEFAULT_FORWARD};
use super::registry::BoidId;
use super::steering::{self, Kinematics, SteeringForces};
use super::targets::TargetForceAccumulator;

/// Inverse time constant of the orientation easing.
pub const ORIENTATION_SHARPNESS: f32 = 7.0;

#[derive(Debug, Clone)]
pub struct BoidAgent {
    id: BoidId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Smoothed visual heading. Never read by steering.
    pub orientation: Quat,
    pending_target_forces: TargetForceAccumulator,
}

/// What one update did, for callers that care (and for tests).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringReport {
    pub flocking: SteeringForces,
    /// Present when an obstacle was ahead; flocking forces were dropped.
    pub avoidance: Option<Vec3>,
    pub target: Vec3,
    pub combined: Vec3,
    /// True when the flock was missing and only target forces applied.
    pub degraded: bool,
}

impl BoidAgent {
    pub fn new(id: BoidId, position: Vec3, velocity: Vec3) -> Self {
        Self {
            id,
            position,
            velocity,
            orientation: heading_rotation(heading_or(velocity, DEFAULT_FORWARD)),
            pending_target_forces: TargetForceAccumulator::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> BoidId {
        self.id
    }

    /// Unit direction of travel; falls back to the unrotated forward axis.
    #[inline]
    pub fn heading(&self) -> Vec3 {
        heading_or(self.velocity, DEFAULT_FORWARD)
    }

    /// Queue an external force for this tick's update.
    pub fn submit_force(&mut self, force: Vec3) {
        if !force.is_finite() {
            warn!("Ignoring non-finite target force {:?} for boid {:?}", force, self.id);
            return;
        }
        self.pending_target_forces.push(force);
    }

    #[inline]
    pub fn pending_target_forces(&self) -> &TargetForceAccumulator {
        &self.pending_target_forces
    }

    /// Advance this boid by `delta` seconds.
    pub fn update<P>(&mut self, flock: Option<FlockView<'_>>, world: &P, delta: f32) -> SteeringReport
    where
        P: ObstacleProbe + ?Sized,
    {
        if !delta.is_finite() || delta < 0.0 {
            warn!("Boid {:?} skipped update with invalid delta time {}", self.id, delta);
            return SteeringReport::default();
        }

        let heading = self.heading();
        let mut report = SteeringReport::default();

        match flock {
            Some(flock) => {
                let params = flock.params;
                let neighbors = flock
                    .neighbors
                    .neighbors(self.id, self.position, params.perception_radius());
                let me = Kinematics {
                    position: self.position,
                    velocity: self.velocity,
                    forward: heading,
                };
                report.flocking = steering::steer(&me, params, &neighbors);

                if avoidance::is_obstacle_ahead(world, self.position, self.velocity, params.sensor_radius()) {
                    let force = avoidance::avoid_obstacle(world, flock.sensors, params, self.position, heading);
                    report.avoidance = Some(force);
                    report.combined = force;
                } else {
                    report.combined = report.flocking.total();
                }
            }
            None => {
                warn_missing_flock(self.id, "no flock view supplied");
                report.degraded = true;
            }
        }

        report.target = self.pending_target_forces.drain_sum();
        report.combined += report.target;

        self.velocity += report.combined * delta;
        if let Some(flock) = flock {
            self.velocity = clamp_speed(
                self.velocity,
                flock.params.min_speed(),
                flock.params.max_speed(),
                heading,
            );
        }
        self.position += self.velocity * delta;

        let target_rotation = heading_rotation(self.heading());
        self.orientation = self
            .orientation
            .slerp(target_rotation, smoothing_factor(ORIENTATION_SHARPNESS, delta));

        report
    }
}
