use bevy::log::{debug, warn};
use bevy::prelude::Component;

use super::parameters::{FlockParameters, FlockTuning};
use super::registry::{BoidId, FlockRegistry, NeighborQuery};
use super::sensors::AvoidanceSensorSet;

/// One parameter change, applied between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterChange {
    MaxSpeed(f32),
    MinSpeed(f32),
    AlignmentStrength(f32),
    SeparationStrength(f32),
    CohesionStrength(f32),
    AvoidanceStrength(f32),
    SeparationFov(f32),
    AlignmentFov(f32),
    CohesionFov(f32),
    NumSensors(usize),
    SensorRadius(f32),
    PerceptionRadius(f32),
}

/// Owner of everything a flock's members share.
///
/// Lives on its own entity. Boids point at that entity; during the steering
/// pass the controller is only ever borrowed immutably, so every boid in a
/// tick sees the same parameters.
#[derive(Component, Debug, Clone)]
pub struct FlockController {
    params: FlockParameters,
    sensors: AvoidanceSensorSet,
    registry: FlockRegistry,
}

impl Default for FlockController {
    fn default() -> Self {
        Self::new(FlockParameters::default())
    }
}

impl FlockController {
    pub fn new(params: FlockParameters) -> Self {
        let sensors = AvoidanceSensorSet::new(params.num_sensors());
        Self {
            params,
            sensors,
            registry: FlockRegistry::default(),
        }
    }

    pub fn from_tuning(tuning: &FlockTuning) -> Self {
        Self::new(FlockParameters::from_tuning(tuning))
    }

    #[inline]
    pub fn params(&self) -> &FlockParameters {
        &self.params
    }

    #[inline]
    pub fn sensors(&self) -> &AvoidanceSensorSet {
        &self.sensors
    }

    #[inline]
    pub fn registry(&self) -> &FlockRegistry {
        &self.registry
    }

    pub fn register(&mut self, id: BoidId) -> bool {
        self.registry.register(id)
    }

    pub fn unregister(&mut self, id: BoidId) -> bool {
        self.registry.unregister(id)
    }

    pub fn apply(&mut self, change: ParameterChange) {
        let params = &mut self.params;
        match change {
            ParameterChange::MaxSpeed(v) => params.set_max_speed(v),
            ParameterChange::MinSpeed(v) => params.set_min_speed(v),
            ParameterChange::AlignmentStrength(v) => params.set_alignment_strength(v),
            ParameterChange::SeparationStrength(v) => params.set_separation_strength(v),
            ParameterChange::CohesionStrength(v) => params.set_cohesion_strength(v),
            ParameterChange::AvoidanceStrength(v) => params.set_avoidance_strength(v),
            ParameterChange::SeparationFov(v) => params.set_separation_fov(v),
            ParameterChange::AlignmentFov(v) => params.set_alignment_fov(v),
            ParameterChange::CohesionFov(v) => params.set_cohesion_fov(v),
            ParameterChange::NumSensors(n) => params.set_num_sensors(n),
            ParameterChange::SensorRadius(v) => params.set_sensor_radius(v),
            ParameterChange::PerceptionRadius(v) => params.set_perception_radius(v),
        }
        self.sync_sensors();
    }

    pub fn apply_tuning(&mut self, tuning: &FlockTuning) {
        self.params.apply_tuning(tuning);
        self.sync_sensors();
    }

    /// Borrow the pieces a boid needs for one update.
    pub fn view<'a>(&'a self, neighbors: &'a dyn NeighborQuery) -> FlockView<'a> {
        FlockView {
            params: &self.params,
            sensors: &self.sensors,
            neighbors,
        }
    }

    fn sync_sensors(&mut self) {
        let wanted = self.params.num_sensors();
        if self.sensors.len() != wanted {
            debug!("Rebuilding avoidance sensors: {} -> {}", self.sensors.len(), wanted);
            self.sensors.rebuild(wanted);
        }
    }
}

/// Read-only slice of a flock handed to [`BoidAgent::update`](super::agent::BoidAgent::update).
#[derive(Clone, Copy)]
pub struct FlockView<'a> {
    pub params: &'a FlockParameters,
    pub sensors: &'a AvoidanceSensorSet,
    pub neighbors: &'a dyn NeighborQuery,
}

/// Warn about a boid whose flock could not be resolved this tick.
pub(crate) fn warn_missing_flock(id: BoidId, reason: &str) {
    warn!("Boid {:?} has no usable flock ({}); steering skipped this tick", id, reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_count_change_rebuilds_set() {
        let mut flock = FlockController::default();
        assert_eq!(flock.sensors().len(), 100);

        flock.apply(ParameterChange::NumSensors(30));
        assert_eq!(flock.sensors().len(), 30);
        assert_eq!(flock.sensors(), &AvoidanceSensorSet::new(30));
    }

    #[test]
    fn test_unrelated_change_keeps_sensor_set() {
        let mut flock = FlockController::default();
        let before = flock.sensors().clone();
        flock.apply(ParameterChange::SensorRadius(800.0));
        assert_eq!(flock.sensors(), &before);
        assert_eq!(flock.params().sensor_radius(), 800.0);
    }

    #[test]
    fn test_rejected_change_keeps_prior_value() {
        let mut flock = FlockController::default();
        flock.apply(ParameterChange::MinSpeed(-3.0));
        assert_eq!(flock.params().min_speed(), 300.0);
    }

    #[test]
    fn test_tuning_rebuilds_sensors_when_count_differs() {
        let mut flock = FlockController::default();
        let tuning = FlockTuning {
            num_sensors: 8,
            ..FlockTuning::default()
        };
        flock.apply_tuning(&tuning);
        assert_eq!(flock.sensors().len(), 8);
    }
}
