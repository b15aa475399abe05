pub mod flock;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a message every 100 flock ticks when the `perf_stats` feature is enabled.
///
/// When the feature is disabled this expands to nothing and the arguments are
/// never evaluated.
///
/// # Example
/// ```ignore
/// profile_log!(tick, "Steered {} boids", boids.iter().len());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
