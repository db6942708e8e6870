//! Construction-time and storage errors
//!
//! The simulation itself never fails: missing bodies, stale timers, and
//! out-of-range positions degrade to no-ops or clamps. Only session setup and
//! LocalStorage round-trips report errors.

use thiserror::Error;

/// Rejected session or level configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Spawn interval of zero ticks
    #[error("level {level}: obstacle frequency must be at least 1 tick")]
    ZeroObstacleFrequency { level: u32 },

    /// Obstacles would not move down the lane
    #[error("level {level}: obstacle speed must be positive, got {speed}")]
    NonPositiveSpeed { level: u32, speed: f32 },

    /// Star cutoffs out of order
    #[error("level {level}: star thresholds must be ascending, got {thresholds:?}")]
    UnorderedStarThresholds { level: u32, thresholds: [u64; 3] },

    /// Play area with no extent
    #[error("play area must be non-empty, got {width}x{height}")]
    EmptyPlayArea { width: f32, height: f32 },
}

/// LocalStorage round-trip failure
#[derive(Debug, Error)]
pub enum StorageError {
    /// Stored JSON did not parse or could not be produced
    #[error("storage payload error: {0}")]
    Json(#[from] serde_json::Error),

    /// LocalStorage is not reachable (no window, disabled storage, quota)
    #[error("storage unavailable")]
    Unavailable,
}
