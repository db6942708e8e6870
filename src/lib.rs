//! Zip Dash - a lane-dodging arcade game
//!
//! Core modules:
//! - `sim`: Tick-driven simulation (physics world, obstacles, dash, pause, resize)
//! - `input`: Held movement keys for the host
//! - `levels`: Level table and star rating
//! - `progress`: Level progress and endless high score bookkeeping
//! - `settings`: Player preferences injected at session start

pub mod error;
pub mod input;
pub mod levels;
pub mod progress;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, StorageError};
pub use levels::LevelConfig;
pub use progress::Progress;
pub use settings::{Difficulty, Settings};

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Tick interval of the game loop (~60 Hz)
    pub const TICK_MS: f64 = 16.0;
    /// Physics timestep taken once per tick
    pub const PHYSICS_STEP_MS: f32 = 1000.0 / 60.0;
    /// Maximum ticks run per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Distance from the bottom edge the player spawns at and is clamped above
    pub const PLAYER_SAFE_MARGIN: f32 = 100.0;
    /// Minimum distance between the player centre and either side edge
    pub const LANE_MARGIN: f32 = 30.0;
    /// Boundary wall width (centred on each side edge)
    pub const WALL_WIDTH: f32 = 60.0;

    /// Base movement speed (pixels per physics step)
    pub const PLAYER_BASE_SPEED: f32 = 3.0;
    /// Player air friction
    pub const PLAYER_AIR_FRICTION: f32 = 0.1;
    /// Per-tick multiplicative velocity decay
    pub const PLAYER_DRAG: f32 = 0.98;

    /// Base dash velocity magnitude
    pub const DASH_BASE_FORCE: f32 = 15.0;
    /// Extra invulnerability after the dash window closes
    pub const DASH_SAFETY_BUFFER_MS: f64 = 50.0;
    /// Particles emitted in a ring around a composite player when dashing
    pub const DASH_BURST_COUNT: u32 = 8;
    /// Radius of the dash burst ring
    pub const DASH_BURST_RADIUS: f32 = 30.0;

    /// Obstacles spawn this far above the visible area
    pub const OBSTACLE_SPAWN_Y: f32 = -50.0;
    /// Obstacles are retired once this far below the bottom edge
    pub const OBSTACLE_RETIRE_MARGIN: f32 = 100.0;
    /// Obstacle size range [min, max)
    pub const OBSTACLE_MIN_SIZE: f32 = 20.0;
    pub const OBSTACLE_MAX_SIZE: f32 = 50.0;
    /// Obstacle spin range [-max, max)
    pub const OBSTACLE_MAX_SPIN: f32 = 0.05;
    pub const OBSTACLE_AIR_FRICTION: f32 = 0.001;

    /// A trail particle is emitted every this many ticks
    pub const TRAIL_INTERVAL: u64 = 2;
    /// Particle lifetime before it is removed
    pub const PARTICLE_FADE_MS: f64 = 500.0;

    /// Hit feedback: flash (composite bodies only) then screen shake
    pub const HIT_FLASH_MS: f64 = 400.0;
    pub const HIT_SHAKE_MS: f64 = 400.0;
}

/// Normalize a directional input in {-1,0,1}² so diagonals have unit length
#[inline]
pub fn normalize_direction(dir: IVec2) -> Vec2 {
    let dir = dir.clamp(IVec2::splat(-1), IVec2::splat(1)).as_vec2();
    if dir.x != 0.0 && dir.y != 0.0 {
        dir / std::f32::consts::SQRT_2
    } else {
        dir
    }
}

/// Rotate a vector by an angle in radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    if angle == 0.0 {
        return v;
    }
    Vec2::from_angle(angle).rotate(v)
}
