//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed tick interval, wall-clock time passed in by the caller
//! - Seeded RNG only
//! - Physics behind the `PhysicsWorld` trait
//! - No rendering or platform dependencies

pub mod collision;
pub mod dash;
pub mod pause;
pub mod physics;
pub mod resize;
pub mod runner;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod timers;

pub use physics::{
    ArcadeWorld, Body, BodyDesc, BodyHandle, BodyLabel, CATEGORY_DEFAULT, CATEGORY_GHOST,
    CollisionFilter, ContactPair, PhysicsWorld,
};
pub use runner::Runner;
pub use state::{
    DashState, EndReason, GameEvent, GameMode, GamePhase, Obstacle, ObstacleShape, PlayerVariant,
    Session, SessionConfig, VariantKind,
};
pub use tick::{TickInput, move_player, tick};
pub use timers::{TimerAction, TimerQueue};
