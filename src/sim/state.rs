//! Session state and core simulation types
//!
//! A [`Session`] owns everything a running game needs: the physics world,
//! the player body, the active obstacle set, particles, timers, and the
//! dash/pause bookkeeping. Subsystems receive it by `&mut`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{rect_vertices, regular_polygon_vertices};
use super::physics::{
    ArcadeWorld, BodyDesc, BodyHandle, BodyLabel, CATEGORY_DEFAULT, CATEGORY_GHOST,
    CollisionFilter, MASK_NONE, Part, PhysicsWorld, Shape,
};
use super::timers::{TimerAction, TimerQueue};
use crate::consts::*;
use crate::error::ConfigError;
use crate::levels::LevelConfig;
use crate::progress::Progress;
use crate::settings::{Difficulty, Settings};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Frozen; player kinematics held in a snapshot
    Paused,
    /// Run ended (terminal until reset)
    GameOver,
}

/// Endless high-score chasing or a fixed-target level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Endless,
    Challenge,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Collision,
    Completion,
}

/// Selectable player character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Single circle, baseline stats
    #[default]
    Ball,
    /// Composite body, faster with a stronger, shorter-cooldown dash
    Cat,
}

impl VariantKind {
    pub const ALL: [VariantKind; 2] = [VariantKind::Ball, VariantKind::Cat];

    pub fn variant(self) -> PlayerVariant {
        match self {
            VariantKind::Ball => PlayerVariant {
                kind: self,
                size_factor: 0.03,
                speed_multiplier: 1.0,
                dash_force_multiplier: 1.0,
                dash_cooldown_ms: 1500.0,
                dash_window_ms: 150.0,
                composite: false,
            },
            VariantKind::Cat => PlayerVariant {
                kind: self,
                size_factor: 0.04,
                speed_multiplier: 1.2,
                dash_force_multiplier: 1.5,
                dash_cooldown_ms: 1000.0,
                dash_window_ms: 200.0,
                composite: true,
            },
        }
    }
}

/// Capabilities of a player character, fixed for the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerVariant {
    pub kind: VariantKind,
    /// Body size as a fraction of the shorter play-area side
    pub size_factor: f32,
    pub speed_multiplier: f32,
    pub dash_force_multiplier: f32,
    pub dash_cooldown_ms: f64,
    pub dash_window_ms: f64,
    /// Built from several parts that count as one player
    pub composite: bool,
}

impl PlayerVariant {
    pub fn move_speed(&self) -> f32 {
        PLAYER_BASE_SPEED * self.speed_multiplier
    }

    pub fn dash_force(&self) -> f32 {
        DASH_BASE_FORCE * self.dash_force_multiplier
    }

    /// Collision immunity after a dash, including the safety buffer
    pub fn dash_immunity_ms(&self) -> f64 {
        self.dash_window_ms + DASH_SAFETY_BUFFER_MS
    }

    /// Time between the hit and the game-over report
    pub fn hit_feedback_ms(&self) -> f64 {
        if self.composite {
            HIT_FLASH_MS + HIT_SHAKE_MS
        } else {
            HIT_SHAKE_MS
        }
    }

    pub fn particle_radius(&self, width: f32, height: f32) -> f32 {
        if self.composite {
            width.min(height) * 0.01
        } else {
            2.0
        }
    }

    /// Collision parts for a play area of the given size
    pub fn parts(&self, width: f32, height: f32) -> Vec<Part> {
        let size = width.min(height) * self.size_factor;
        if !self.composite {
            return vec![Part::new(Shape::Circle { radius: size })];
        }

        use std::f32::consts::FRAC_PI_4;
        let ear = size * 0.4;
        let eye = size * 0.1;
        vec![
            Part::new(Shape::Circle { radius: size * 0.6 }),
            Part::new(Shape::Polygon {
                vertices: regular_polygon_vertices(3, ear),
            })
            .at(Vec2::new(-size * 0.4, -size * 0.6))
            .rotated(FRAC_PI_4),
            Part::new(Shape::Polygon {
                vertices: regular_polygon_vertices(3, ear),
            })
            .at(Vec2::new(size * 0.4, -size * 0.6))
            .rotated(-FRAC_PI_4),
            Part::new(Shape::Circle { radius: eye }).at(Vec2::new(-size * 0.25, -size * 0.1)),
            Part::new(Shape::Circle { radius: eye }).at(Vec2::new(size * 0.25, -size * 0.1)),
        ]
    }
}

/// Obstacle footprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Square,
    Circle,
    Rectangle,
}

impl ObstacleShape {
    pub const ALL: [ObstacleShape; 3] = [
        ObstacleShape::Square,
        ObstacleShape::Circle,
        ObstacleShape::Rectangle,
    ];

    pub fn shape(&self, size: f32) -> Shape {
        match self {
            ObstacleShape::Square => Shape::Polygon {
                vertices: rect_vertices(size, size),
            },
            ObstacleShape::Circle => Shape::Circle { radius: size / 2.0 },
            ObstacleShape::Rectangle => Shape::Polygon {
                vertices: rect_vertices(size * 1.5, size / 2.0),
            },
        }
    }
}

/// A falling obstacle in the active set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub body: BodyHandle,
    pub shape: ObstacleShape,
    pub size: f32,
    /// Running tick it was spawned on (not advanced until the next tick)
    pub spawned_tick: u64,
}

/// Dash cooldown bookkeeping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashState {
    pub last_activation_ms: Option<f64>,
    pub cooldown_ms: f64,
    /// Last reported remaining cooldown in [0, 1]
    pub cooldown_fraction: f32,
}

impl DashState {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            last_activation_ms: None,
            cooldown_ms,
            cooldown_fraction: 0.0,
        }
    }

    /// Remaining cooldown at `now_ms`: 1 right after a dash, 0 once the
    /// cooldown has fully elapsed
    pub fn remaining_fraction(&self, now_ms: f64) -> f32 {
        match self.last_activation_ms {
            Some(last) => {
                let elapsed = (now_ms - last).max(0.0);
                if elapsed < self.cooldown_ms {
                    (1.0 - elapsed / self.cooldown_ms) as f32
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    pub fn is_ready(&self, now_ms: f64) -> bool {
        self.last_activation_ms
            .is_none_or(|last| now_ms - last >= self.cooldown_ms)
    }

    pub fn reset(&mut self) {
        self.last_activation_ms = None;
        self.cooldown_fraction = 0.0;
    }
}

/// Player kinematics saved while paused
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Outward notifications, drained by the host once per tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreUpdated { score: u64 },
    DashCooldown { fraction: f32 },
    DashActivated { direction: Vec2 },
    /// Player touched an obstacle; game over follows after the feedback
    PlayerHit { score: u64, flash: bool, feedback_ms: f64 },
    LevelComplete { score: u64, stars: u8 },
    GameOver { score: u64, reason: EndReason },
    Paused,
    Resumed,
    Resized { width: f32, height: f32 },
}

/// Everything injected at session start
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub level: LevelConfig,
    pub mode: GameMode,
    pub variant: VariantKind,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub width: f32,
    pub height: f32,
}

impl SessionConfig {
    pub fn new(level: LevelConfig, width: f32, height: f32) -> Self {
        Self {
            level,
            mode: GameMode::Endless,
            variant: VariantKind::Ball,
            difficulty: Difficulty::Medium,
            seed: 0,
            width,
            height,
        }
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_variant(mut self, variant: VariantKind) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Apply stored preferences
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_variant(settings.variant)
            .with_difficulty(settings.difficulty)
    }

    /// Fall back to the ball when the chosen character is still locked
    pub fn with_unlocks(self, progress: &Progress) -> Self {
        let variant = progress.playable_variant(self.variant);
        if variant != self.variant {
            log::warn!("{:?} is locked, playing {:?}", self.variant, variant);
        }
        self.with_variant(variant)
    }
}

/// A running game
#[derive(Debug)]
pub struct Session<W: PhysicsWorld = ArcadeWorld> {
    pub config: SessionConfig,
    pub variant: PlayerVariant,
    /// Obstacle translation per tick after difficulty scaling
    pub obstacle_speed: f32,
    /// Ticks between spawns after difficulty scaling
    pub spawn_interval: u32,
    pub world: W,
    pub phase: GamePhase,
    pub score: u64,
    /// Running ticks processed (drives spawn timing)
    pub tick_count: u64,
    pub width: f32,
    pub height: f32,
    pub player: Option<BodyHandle>,
    pub walls: Vec<BodyHandle>,
    pub obstacles: Vec<Obstacle>,
    pub particles: Vec<BodyHandle>,
    pub dash: DashState,
    pub snapshot: Option<PauseSnapshot>,
    pub timers: TimerQueue,
    /// Score captured when the run ended
    pub final_score: Option<u64>,
    pub torn_down: bool,
    pub(crate) rng: Pcg32,
    events: Vec<GameEvent>,
}

impl Session<ArcadeWorld> {
    /// Start a session on the built-in physics world
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        Self::with_world(config, ArcadeWorld::new())
    }
}

impl<W: PhysicsWorld> Session<W> {
    /// Start a session on the given (empty) physics world
    pub fn with_world(config: SessionConfig, world: W) -> Result<Self, ConfigError> {
        config.level.validate()?;
        if !(config.width > 0.0 && config.height > 0.0) {
            return Err(ConfigError::EmptyPlayArea {
                width: config.width,
                height: config.height,
            });
        }

        let variant = config.variant.variant();
        let obstacle_speed = config.level.obstacle_speed * config.difficulty.speed_factor();
        let spawn_interval = config
            .difficulty
            .scale_interval(config.level.obstacle_frequency);

        let mut session = Self {
            variant,
            obstacle_speed,
            spawn_interval,
            world,
            phase: GamePhase::Running,
            score: 0,
            tick_count: 0,
            width: config.width,
            height: config.height,
            player: None,
            walls: Vec::new(),
            obstacles: Vec::new(),
            particles: Vec::new(),
            dash: DashState::new(variant.dash_cooldown_ms),
            snapshot: None,
            timers: TimerQueue::new(),
            final_score: None,
            torn_down: false,
            rng: Pcg32::seed_from_u64(config.seed),
            events: Vec::new(),
            config,
        };

        session.build_walls();
        session.spawn_player();
        session.world.set_running(true);

        log::info!(
            "Session started: level {} ({:?}, {:?}, {:?}) {}x{} speed={} interval={}",
            session.config.level.id,
            session.config.mode,
            session.variant.kind,
            session.config.difficulty,
            session.width,
            session.height,
            session.obstacle_speed,
            session.spawn_interval
        );

        Ok(session)
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player.and_then(|p| self.world.position(p))
    }

    pub fn player_velocity(&self) -> Option<Vec2> {
        self.player.and_then(|p| self.world.velocity(p))
    }

    /// Spawn point of the player for the current play area
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height - PLAYER_SAFE_MARGIN)
    }

    /// Queue an event for the host
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Restart the run in place: score and cooldown back to zero, player at
    /// the spawn point, obstacles and particles cleared
    pub fn reset(&mut self) {
        let Some(player) = self.player else {
            return;
        };

        self.score = 0;
        self.tick_count = 0;
        self.final_score = None;
        self.snapshot = None;
        self.dash.reset();
        self.timers.clear();
        self.push_event(GameEvent::ScoreUpdated { score: 0 });
        self.push_event(GameEvent::DashCooldown { fraction: 0.0 });

        let spawn = self.spawn_point();
        self.world.set_position(player, spawn);
        self.world.set_velocity(player, Vec2::ZERO);
        self.world.set_category(player, CATEGORY_DEFAULT);

        for obstacle in self.obstacles.drain(..) {
            self.world.remove_body(obstacle.body);
        }
        for particle in self.particles.drain(..) {
            self.world.remove_body(particle);
        }

        self.phase = GamePhase::Running;
        self.world.set_running(true);
        log::info!("Session reset");
    }

    /// End the session: stop stepping and clear every body and timer.
    /// Ticks and dash requests afterwards are no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.world.set_running(false);
        self.world.clear();
        self.timers.clear();
        self.player = None;
        self.walls.clear();
        self.obstacles.clear();
        self.particles.clear();
        self.snapshot = None;
        self.torn_down = true;
        log::info!("Session torn down at score {}", self.score);
    }

    /// Add a cosmetic particle that fades after a fixed time
    pub fn emit_particle(&mut self, position: Vec2, now_ms: f64) {
        let radius = self.variant.particle_radius(self.width, self.height);
        let particle = self.world.add_body(
            BodyDesc::new(
                BodyLabel::Particle,
                position,
                vec![Part::new(Shape::Circle { radius })],
            )
            .fixed()
            .with_filter(CollisionFilter::new(CATEGORY_GHOST, MASK_NONE)),
        );
        self.particles.push(particle);
        self.timers.schedule(
            now_ms + PARTICLE_FADE_MS,
            TimerAction::FadeParticle { particle },
        );
    }

    /// Remove a particle if it is still alive
    pub fn remove_particle(&mut self, particle: BodyHandle) {
        if let Some(i) = self.particles.iter().position(|p| *p == particle) {
            self.particles.swap_remove(i);
            self.world.remove_body(particle);
        }
    }

    /// Two static walls centred on the side edges, full height
    pub(crate) fn build_walls(&mut self) {
        for wall in self.walls.drain(..) {
            self.world.remove_body(wall);
        }
        for x in [0.0, self.width] {
            let wall = self.world.add_body(
                BodyDesc::new(
                    BodyLabel::Wall,
                    Vec2::new(x, self.height / 2.0),
                    vec![Part::new(Shape::Polygon {
                        vertices: rect_vertices(WALL_WIDTH, self.height),
                    })],
                )
                .fixed(),
            );
            self.walls.push(wall);
        }
    }

    fn spawn_player(&mut self) {
        let parts = self.variant.parts(self.width, self.height);
        let player = self.world.add_body(
            BodyDesc::new(BodyLabel::Player, self.spawn_point(), parts)
                .with_air_friction(PLAYER_AIR_FRICTION),
        );
        self.player = Some(player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::level;

    fn config() -> SessionConfig {
        SessionConfig::new(level(1).unwrap(), 800.0, 600.0)
    }

    #[test]
    fn test_new_session_layout() {
        let session = Session::new(config()).unwrap();
        assert_eq!(session.phase, GamePhase::Running);
        assert_eq!(session.score, 0);
        assert_eq!(session.walls.len(), 2);
        assert_eq!(session.player_position(), Some(Vec2::new(400.0, 500.0)));
        assert_eq!(session.player_velocity(), Some(Vec2::ZERO));
        assert!(session.world.is_running());
        assert!(session.obstacles.is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut bad = config();
        bad.level.obstacle_frequency = 0;
        assert!(Session::new(bad).is_err());

        let mut bad = config();
        bad.width = 0.0;
        assert!(matches!(
            Session::new(bad),
            Err(ConfigError::EmptyPlayArea { .. })
        ));
    }

    #[test]
    fn test_variant_records() {
        let ball = VariantKind::Ball.variant();
        let cat = VariantKind::Cat.variant();
        assert_eq!(ball.dash_force(), 15.0);
        assert_eq!(cat.dash_force(), 22.5);
        assert!((cat.move_speed() - 3.6).abs() < 1e-5);
        assert_eq!(ball.dash_cooldown_ms, 1500.0);
        assert_eq!(cat.dash_cooldown_ms, 1000.0);
        assert_eq!(ball.dash_immunity_ms(), 200.0);
        assert_eq!(cat.dash_immunity_ms(), 250.0);
        assert_eq!(ball.parts(800.0, 600.0).len(), 1);
        assert_eq!(cat.parts(800.0, 600.0).len(), 5);
    }

    #[test]
    fn test_locked_variant_falls_back_to_ball() {
        let settings = Settings {
            variant: VariantKind::Cat,
            ..Default::default()
        };
        let mut progress = Progress::new();
        let config = config().with_settings(&settings).with_unlocks(&progress);
        assert_eq!(config.variant, VariantKind::Ball);
        let session = Session::new(config).unwrap();
        assert!(!session.variant.composite);

        progress.record_endless(10_000);
        let config = self::config().with_settings(&settings).with_unlocks(&progress);
        assert_eq!(config.variant, VariantKind::Cat);
    }

    #[test]
    fn test_difficulty_scales_level() {
        let session = Session::new(config().with_difficulty(Difficulty::Hard)).unwrap();
        assert_eq!(session.spawn_interval, 48);
        assert!((session.obstacle_speed - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_dash_state_fraction() {
        let mut dash = DashState::new(1000.0);
        assert_eq!(dash.remaining_fraction(5.0), 0.0);
        assert!(dash.is_ready(0.0));

        dash.last_activation_ms = Some(1000.0);
        assert_eq!(dash.remaining_fraction(1000.0), 1.0);
        assert!((dash.remaining_fraction(1250.0) - 0.75).abs() < 1e-6);
        assert_eq!(dash.remaining_fraction(2000.0), 0.0);
        assert!(!dash.is_ready(1999.0));
        assert!(dash.is_ready(2000.0));
    }

    #[test]
    fn test_particles_are_ghosts() {
        let mut session = Session::new(config()).unwrap();
        session.emit_particle(Vec2::new(10.0, 10.0), 0.0);
        let particle = session.particles[0];
        let body = session.world.body(particle).unwrap();
        assert!(body.is_static);
        assert_eq!(body.parts[0].filter.mask, MASK_NONE);
        assert_eq!(session.timers.len(), 1);

        session.remove_particle(particle);
        assert!(session.particles.is_empty());
        assert!(!session.world.contains(particle));
        // Second removal is harmless
        session.remove_particle(particle);
    }

    #[test]
    fn test_teardown_clears_world() {
        let mut session = Session::new(config()).unwrap();
        session.emit_particle(Vec2::ZERO, 0.0);
        session.teardown();
        assert!(session.torn_down);
        assert_eq!(session.world.body_count(), 0);
        assert!(session.player.is_none());
        assert!(session.timers.is_empty());
        assert!(!session.world.is_running());
    }
}
