use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Tick Counter
// ============================================================================

/// Number of flock ticks run so far. Drives periodic profiling output.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlockTick(pub u64);

impl FlockTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

// ============================================================================
// Randomness
// ============================================================================

/// Seed used when no scene config provides one.
pub const DEFAULT_SEED: u64 = 0x5EED_B01D;

/// Single source of randomness for spawning, so a seed reproduces a scene.
#[derive(Resource, Debug)]
pub struct FlockRng(pub StdRng);

impl Default for FlockRng {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}

impl FlockRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}
