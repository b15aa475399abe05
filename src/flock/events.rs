use bevy::prelude::*;

use super::controller::ParameterChange;

/// Change one parameter of a flock. Applied before any boid steers that tick.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct FlockCommand {
    pub flock: Entity,
    pub change: ParameterChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DespawnReason {
    /// Flew into a `VolumeDespawner`.
    Outlet,
    /// Left its cage in a way no face could wrap (e.g. a non-finite position).
    EscapedCage,
}

/// A boid was unregistered and despawned by the world layer.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoidDespawned {
    pub boid: Entity,
    pub flock: Option<Entity>,
    pub reason: DespawnReason,
}
