use bevy::asset::Asset;
use bevy::log::warn;
use bevy::reflect::TypePath;
use serde::{Deserialize, Serialize};

/// Upper bound on avoidance sensors per flock.
pub const MAX_SENSORS: usize = 1000;

/// Shared tuning for one flock.
///
/// Fields are private so every mutation goes through a setter that upholds
/// `min_speed <= max_speed`, non-negative speeds and radii, and FOV thresholds
/// within `[-1, 1]`. Rejected input is logged and the previous value kept.
#[derive(Debug, Clone, PartialEq)]
pub struct FlockParameters {
    max_speed: f32,
    min_speed: f32,

    alignment_strength: f32,
    separation_strength: f32,
    cohesion_strength: f32,
    avoidance_strength: f32,

    // Cosine of the half-angle of each perception cone.
    // 1.0 senses only straight ahead, -1.0 senses in every direction.
    separation_fov: f32,
    alignment_fov: f32,
    cohesion_fov: f32,

    num_sensors: usize,
    sensor_radius: f32,
    perception_radius: f32,
}

impl Default for FlockParameters {
    fn default() -> Self {
        Self {
            max_speed: 700.0,
            min_speed: 300.0,
            alignment_strength: 200.0,
            separation_strength: 30.0,
            cohesion_strength: 5.0,
            avoidance_strength: 10_000.0,
            separation_fov: -1.0,
            alignment_fov: 0.5,
            cohesion_fov: -0.5,
            num_sensors: 100,
            sensor_radius: 300.0,
            perception_radius: 500.0,
        }
    }
}

impl FlockParameters {
    pub fn from_tuning(tuning: &FlockTuning) -> Self {
        let mut params = Self::default();
        params.apply_tuning(tuning);
        params
    }

    /// Apply every value in `tuning` through the validating setters.
    ///
    /// Max is applied before min so a valid `(min, max)` pair always lands
    /// intact regardless of the previous band.
    pub fn apply_tuning(&mut self, tuning: &FlockTuning) {
        if tuning.min_speed > tuning.max_speed {
            warn!(
                "Flock tuning has min_speed {} above max_speed {}; max will be raised to match",
                tuning.min_speed, tuning.max_speed
            );
        }
        self.set_max_speed(tuning.max_speed);
        self.set_min_speed(tuning.min_speed);
        self.set_alignment_strength(tuning.alignment_strength);
        self.set_separation_strength(tuning.separation_strength);
        self.set_cohesion_strength(tuning.cohesion_strength);
        self.set_avoidance_strength(tuning.avoidance_strength);
        self.set_separation_fov(tuning.separation_fov);
        self.set_alignment_fov(tuning.alignment_fov);
        self.set_cohesion_fov(tuning.cohesion_fov);
        self.set_num_sensors(tuning.num_sensors);
        self.set_sensor_radius(tuning.sensor_radius);
        self.set_perception_radius(tuning.perception_radius);
    }

    pub fn to_tuning(&self) -> FlockTuning {
        FlockTuning {
            max_speed: self.max_speed,
            min_speed: self.min_speed,
            alignment_strength: self.alignment_strength,
            separation_strength: self.separation_strength,
            cohesion_strength: self.cohesion_strength,
            avoidance_strength: self.avoidance_strength,
            separation_fov: self.separation_fov,
            alignment_fov: self.alignment_fov,
            cohesion_fov: self.cohesion_fov,
            num_sensors: self.num_sensors,
            sensor_radius: self.sensor_radius,
            perception_radius: self.perception_radius,
        }
    }

    // ------------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------------

    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    #[inline]
    pub fn min_speed(&self) -> f32 {
        self.min_speed
    }

    /// Lowering max below the current min pulls min down with it.
    pub fn set_max_speed(&mut self, max_speed: f32) {
        if !valid_non_negative("max_speed", max_speed) {
            return;
        }
        self.max_speed = max_speed;
        if self.max_speed < self.min_speed {
            self.min_speed = self.max_speed;
        }
    }

    /// Raising min above the current max pushes max up with it.
    pub fn set_min_speed(&mut self, min_speed: f32) {
        if !valid_non_negative("min_speed", min_speed) {
            return;
        }
        self.min_speed = min_speed;
        if self.min_speed > self.max_speed {
            self.max_speed = self.min_speed;
        }
    }

    // ------------------------------------------------------------------------
    // Steering strengths
    // ------------------------------------------------------------------------

    #[inline]
    pub fn alignment_strength(&self) -> f32 {
        self.alignment_strength
    }

    #[inline]
    pub fn separation_strength(&self) -> f32 {
        self.separation_strength
    }

    #[inline]
    pub fn cohesion_strength(&self) -> f32 {
        self.cohesion_strength
    }

    #[inline]
    pub fn avoidance_strength(&self) -> f32 {
        self.avoidance_strength
    }

    pub fn set_alignment_strength(&mut self, strength: f32) {
        if valid_finite("alignment_strength", strength) {
            self.alignment_strength = strength;
        }
    }

    pub fn set_separation_strength(&mut self, strength: f32) {
        if valid_finite("separation_strength", strength) {
            self.separation_strength = strength;
        }
    }

    pub fn set_cohesion_strength(&mut self, strength: f32) {
        if valid_finite("cohesion_strength", strength) {
            self.cohesion_strength = strength;
        }
    }

    pub fn set_avoidance_strength(&mut self, strength: f32) {
        if valid_finite("avoidance_strength", strength) {
            self.avoidance_strength = strength;
        }
    }

    // ------------------------------------------------------------------------
    // Perception
    // ------------------------------------------------------------------------

    #[inline]
    pub fn separation_fov(&self) -> f32 {
        self.separation_fov
    }

    #[inline]
    pub fn alignment_fov(&self) -> f32 {
        self.alignment_fov
    }

    #[inline]
    pub fn cohesion_fov(&self) -> f32 {
        self.cohesion_fov
    }

    pub fn set_separation_fov(&mut self, fov: f32) {
        if let Some(fov) = clamp_fov("separation_fov", fov) {
            self.separation_fov = fov;
        }
    }

    pub fn set_alignment_fov(&mut self, fov: f32) {
        if let Some(fov) = clamp_fov("alignment_fov", fov) {
            self.alignment_fov = fov;
        }
    }

    pub fn set_cohesion_fov(&mut self, fov: f32) {
        if let Some(fov) = clamp_fov("cohesion_fov", fov) {
            self.cohesion_fov = fov;
        }
    }

    #[inline]
    pub fn perception_radius(&self) -> f32 {
        self.perception_radius
    }

    pub fn set_perception_radius(&mut self, radius: f32) {
        if valid_non_negative("perception_radius", radius) {
            self.perception_radius = radius;
        }
    }

    // ------------------------------------------------------------------------
    // Avoidance
    // ------------------------------------------------------------------------

    #[inline]
    pub fn num_sensors(&self) -> usize {
        self.num_sensors
    }

    #[inline]
    pub fn sensor_radius(&self) -> f32 {
        self.sensor_radius
    }

    /// Counts above [`MAX_SENSORS`] are clamped.
    ///
    /// Changing the count here does not rebuild any sensor set; go through
    /// `FlockController` for that.
    pub fn set_num_sensors(&mut self, num_sensors: usize) {
        if num_sensors > MAX_SENSORS {
            warn!(
                "Requested {} avoidance sensors, clamping to {}",
                num_sensors, MAX_SENSORS
            );
        }
        self.num_sensors = num_sensors.min(MAX_SENSORS);
    }

    pub fn set_sensor_radius(&mut self, radius: f32) {
        if valid_non_negative("sensor_radius", radius) {
            self.sensor_radius = radius;
        }
    }
}

fn valid_finite(name: &str, value: f32) -> bool {
    if !value.is_finite() {
        warn!("Request to change flock {} to non-finite value {} ignored", name, value);
        return false;
    }
    true
}

fn valid_non_negative(name: &str, value: f32) -> bool {
    if !valid_finite(name, value) {
        return false;
    }
    if value < 0.0 {
        warn!("Request to change flock {} to negative value {} ignored", name, value);
        return false;
    }
    true
}

fn clamp_fov(name: &str, value: f32) -> Option<f32> {
    if !valid_finite(name, value) {
        return None;
    }
    if !(-1.0..=1.0).contains(&value) {
        warn!("Flock {} {} outside [-1, 1], clamping", name, value);
    }
    Some(value.clamp(-1.0, 1.0))
}

/// Plain, serializable form of [`FlockParameters`] used by config files.
///
/// Nothing here is validated; it only becomes live through
/// [`FlockParameters::apply_tuning`]. Also loadable as a hot-reloadable
/// `*.tuning.ron` asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Asset, TypePath)]
#[serde(default)]
pub struct FlockTuning {
    pub max_speed: f32,
    pub min_speed: f32,
    pub alignment_strength: f32,
    pub separation_strength: f32,
    pub cohesion_strength: f32,
    pub avoidance_strength: f32,
    pub separation_fov: f32,
    pub alignment_fov: f32,
    pub cohesion_fov: f32,
    pub num_sensors: usize,
    pub sensor_radius: f32,
    pub perception_radius: f32,
}

impl Default for FlockTuning {
    fn default() -> Self {
        FlockParameters::default().to_tuning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowering_max_below_min_pulls_min_down() {
        let mut params = FlockParameters::default();
        params.set_max_speed(200.0);
        assert_eq!(params.max_speed(), 200.0);
        assert_eq!(params.min_speed(), 200.0);
    }

    #[test]
    fn test_raising_min_above_max_pushes_max_up() {
        let mut params = FlockParameters::default();
        params.set_min_speed(900.0);
        assert_eq!(params.min_speed(), 900.0);
        assert_eq!(params.max_speed(), 900.0);
    }

    #[test]
    fn test_negative_speeds_are_rejected() {
        let mut params = FlockParameters::default();
        params.set_max_speed(-1.0);
        params.set_min_speed(-50.0);
        assert_eq!(params.max_speed(), 700.0);
        assert_eq!(params.min_speed(), 300.0);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut params = FlockParameters::default();
        params.set_max_speed(f32::INFINITY);
        params.set_cohesion_strength(f32::NAN);
        params.set_alignment_fov(f32::NAN);
        assert_eq!(params.max_speed(), 700.0);
        assert_eq!(params.cohesion_strength(), 5.0);
        assert_eq!(params.alignment_fov(), 0.5);
    }

    #[test]
    fn test_strengths_accept_negative_values() {
        let mut params = FlockParameters::default();
        params.set_separation_strength(-30.0);
        params.set_cohesion_strength(-5.0);
        assert_eq!(params.separation_strength(), -30.0);
        assert_eq!(params.cohesion_strength(), -5.0);
    }

    #[test]
    fn test_fov_is_clamped_into_range() {
        let mut params = FlockParameters::default();
        params.set_cohesion_fov(3.0);
        params.set_separation_fov(-2.0);
        assert_eq!(params.cohesion_fov(), 1.0);
        assert_eq!(params.separation_fov(), -1.0);
    }

    #[test]
    fn test_sensor_count_is_capped() {
        let mut params = FlockParameters::default();
        params.set_num_sensors(5000);
        assert_eq!(params.num_sensors(), MAX_SENSORS);
    }

    #[test]
    fn test_tuning_lands_intact_when_band_moves_down() {
        let tuning = FlockTuning {
            min_speed: 50.0,
            max_speed: 120.0,
            ..FlockTuning::default()
        };
        let params = FlockParameters::from_tuning(&tuning);
        assert_eq!(params.min_speed(), 50.0);
        assert_eq!(params.max_speed(), 120.0);
    }

    #[test]
    fn test_randomized_speed_mutations_keep_band_ordered() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut params = FlockParameters::default();
        for _ in 0..500 {
            let value = rng.f32() * 2000.0 - 500.0;
            if rng.bool() {
                params.set_max_speed(value);
            } else {
                params.set_min_speed(value);
            }
            assert!(params.min_speed() >= 0.0);
            assert!(params.min_speed() <= params.max_speed());
        }
    }
}
