use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Per-boid queue of target forces for the current tick.
///
/// Any number of producers append during a tick; the owning boid drains it
/// once in its own update, so a force is never applied twice.
#[derive(Debug, Clone, Default)]
pub struct TargetForceAccumulator {
    pending: SmallVec<[Vec3; 4]>,
}

impl TargetForceAccumulator {
    pub fn push(&mut self, force: Vec3) {
        self.pending.push(force);
    }

    /// Sum of every pending force; the queue is empty afterwards.
    pub fn drain_sum(&mut self) -> Vec3 {
        self.pending.drain(..).fold(Vec3::ZERO, |sum, force| sum + force)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// How a target's strength varies with the boid's distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProximityScaling {
    /// Full strength everywhere.
    #[default]
    None,
    /// Stronger the closer the boid is, fading linearly to zero at the falloff radius.
    Proximity,
    /// Stronger the further the boid is, reaching full strength at the falloff radius.
    InverseProximity,
}

impl ProximityScaling {
    /// Strength multiplier in `[0, 1]` for a boid `distance` away.
    pub fn factor(self, distance: f32, falloff_radius: f32) -> f32 {
        let t = if falloff_radius > 0.0 {
            (distance / falloff_radius).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self {
            ProximityScaling::None => 1.0,
            ProximityScaling::Proximity => 1.0 - t,
            ProximityScaling::InverseProximity => t,
        }
    }
}

/// Force law of an attractor (positive strength) or repeller (negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetForce {
    pub strength: f32,
    #[serde(default)]
    pub scaling: ProximityScaling,
    /// Distance over which proximity scaling runs from one end to the other.
    #[serde(default)]
    pub falloff_radius: f32,
}

impl TargetForce {
    pub fn constant(strength: f32) -> Self {
        Self {
            strength,
            scaling: ProximityScaling::None,
            falloff_radius: 0.0,
        }
    }

    /// Pull toward (or push from) `target` while damping the boid's own velocity.
    pub fn compute(&self, target: Vec3, boid_position: Vec3, boid_velocity: Vec3) -> Vec3 {
        let offset = target - boid_position;
        let strength = self.strength * self.scaling.factor(offset.length(), self.falloff_radius);
        offset.normalize_or_zero() * strength - boid_velocity
    }
}
