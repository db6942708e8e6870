//! Fixed-interval game loop
//!
//! One call to [`tick`] is one step of the game. Order within a running
//! tick is fixed: score, trail particle, dash cooldown, spawn check,
//! obstacle advance/retire, lane clamp, drag, physics step, collision check.

use glam::{IVec2, Vec2};

use super::dash;
use super::pause;
use super::physics::{BodyHandle, BodyLabel, CATEGORY_DEFAULT, ContactPair, PhysicsWorld};
use super::spawner;
use super::state::{EndReason, GameEvent, GameMode, GamePhase, Session};
use super::timers::TimerAction;
use crate::consts::*;
use crate::normalize_direction;

/// Input for a single tick; `dash`, `toggle_pause` and `movement` are
/// one-shot and cleared by the driver once consumed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// New movement direction in {-1,0,1}² (key pressed or released)
    pub movement: Option<IVec2>,
    /// Activate the dash
    pub dash: bool,
    /// Pause toggle
    pub toggle_pause: bool,
}

/// Advance the session by one tick at wall-clock time `now_ms` and return
/// the events produced since the previous call
pub fn tick<W: PhysicsWorld>(
    session: &mut Session<W>,
    input: &TickInput,
    now_ms: f64,
) -> Vec<GameEvent> {
    if session.torn_down || session.player.is_none() {
        return session.drain_events();
    }

    run_timers(session, now_ms);

    if input.toggle_pause {
        pause::toggle(session);
    }

    match session.phase {
        GamePhase::GameOver => return session.drain_events(),
        GamePhase::Paused => {
            pause::hold(session);
            return session.drain_events();
        }
        GamePhase::Running => {}
    }

    // Coming back from a pause: put the saved kinematics back first
    pause::restore(session);

    if let Some(dir) = input.movement {
        move_player(session, dir);
    }
    if input.dash {
        dash::activate(session, now_ms);
    }

    run_frame(session, now_ms);
    session.drain_events()
}

/// Set the player's velocity from a directional input
pub fn move_player<W: PhysicsWorld>(session: &mut Session<W>, dir: IVec2) {
    let Some(player) = session.player else {
        return;
    };
    if !session.is_running() {
        return;
    }
    let velocity = normalize_direction(dir) * session.variant.move_speed();
    session.world.set_velocity(player, velocity);
}

fn run_frame<W: PhysicsWorld>(session: &mut Session<W>, now_ms: f64) {
    let Some(player) = session.player else {
        return;
    };

    session.score += 1;
    let score = session.score;
    session.push_event(GameEvent::ScoreUpdated { score });

    if session.config.mode == GameMode::Challenge && session.config.level.is_complete(score) {
        complete_level(session);
        return;
    }

    if score % TRAIL_INTERVAL == 0 {
        if let Some(pos) = session.world.position(player) {
            session.emit_particle(pos, now_ms);
        }
    }

    dash::update_cooldown(session, now_ms);

    if session.tick_count % session.spawn_interval as u64 == 0 {
        let (width, height) = (session.width, session.height);
        spawner::spawn(session, width, height);
    }

    let speed = session.obstacle_speed;
    spawner::advance_and_retire(session, speed);

    clamp_to_lane(session, player);

    if let Some(velocity) = session.world.velocity(player) {
        session.world.set_velocity(player, velocity * PLAYER_DRAG);
    }

    session.world.step(PHYSICS_STEP_MS);
    session.tick_count += 1;

    handle_collisions(session, now_ms);
}

/// Keep the player centre at least `LANE_MARGIN` from both side edges
fn clamp_to_lane<W: PhysicsWorld>(session: &mut Session<W>, player: BodyHandle) {
    let Some(pos) = session.world.position(player) else {
        return;
    };
    let mut x = pos.x;
    if x < LANE_MARGIN {
        x = LANE_MARGIN;
    }
    if x > session.width - LANE_MARGIN {
        x = session.width - LANE_MARGIN;
    }
    if x != pos.x {
        session.world.set_position(player, Vec2::new(x, pos.y));
    }
}

/// Whether a contact is between any part of the player and an obstacle
pub fn is_player_hit<W: PhysicsWorld>(world: &W, pair: &ContactPair, player: BodyHandle) -> bool {
    pair.other(player)
        .and_then(|other| world.body(other.body))
        .is_some_and(|body| body.label == BodyLabel::Obstacle)
}

/// Consume the world's collision-begin pairs; returns true if the player
/// was hit this tick
pub fn handle_collisions<W: PhysicsWorld>(session: &mut Session<W>, now_ms: f64) -> bool {
    let pairs = session.world.drain_collision_starts();
    let Some(player) = session.player else {
        return false;
    };
    let hits = pairs
        .iter()
        .filter(|pair| is_player_hit(&session.world, pair, player))
        .count();
    if hits == 0 {
        return false;
    }
    if hits > 1 {
        log::debug!("{} obstacle contacts in one tick", hits);
    }
    end_by_collision(session, now_ms);
    true
}

/// Enter GameOver once; the game-over event follows when the hit feedback
/// timer fires
fn end_by_collision<W: PhysicsWorld>(session: &mut Session<W>, now_ms: f64) {
    if session.final_score.is_some() || session.phase == GamePhase::GameOver {
        return;
    }
    let score = session.score;
    let variant = session.variant;
    session.final_score = Some(score);
    session.phase = GamePhase::GameOver;
    session.world.set_running(false);

    let feedback_ms = variant.hit_feedback_ms();
    session.push_event(GameEvent::PlayerHit {
        score,
        flash: variant.composite,
        feedback_ms,
    });
    session
        .timers
        .schedule(now_ms + feedback_ms, TimerAction::FinishHitFeedback);
    log::info!("Player hit at score {}", score);
}

fn complete_level<W: PhysicsWorld>(session: &mut Session<W>) {
    let score = session.score;
    let stars = session.config.level.stars_for(score);
    session.final_score = Some(score);
    session.phase = GamePhase::GameOver;
    session.world.set_running(false);
    session.push_event(GameEvent::LevelComplete { score, stars });
    session.push_event(GameEvent::GameOver {
        score,
        reason: EndReason::Completion,
    });
    log::info!(
        "Level {} complete: score={} stars={}",
        session.config.level.id,
        score,
        stars
    );
}

/// Apply every timer due at `now_ms`. Actions whose body is gone are skipped.
fn run_timers<W: PhysicsWorld>(session: &mut Session<W>, now_ms: f64) {
    for action in session.timers.drain_due(now_ms) {
        match action {
            TimerAction::EndDashImmunity { player } => {
                if session.player == Some(player) && session.world.contains(player) {
                    session.world.set_category(player, CATEGORY_DEFAULT);
                } else {
                    log::debug!("Skipping stale dash reset");
                }
            }
            TimerAction::FadeParticle { particle } => session.remove_particle(particle),
            TimerAction::DashBurst { player, index } => {
                if session.player != Some(player) || session.phase == GamePhase::GameOver {
                    continue;
                }
                if let Some(pos) = session.world.position(player) {
                    let angle = index as f32 / DASH_BURST_COUNT as f32 * std::f32::consts::TAU;
                    let offset = Vec2::from_angle(angle) * DASH_BURST_RADIUS;
                    session.emit_particle(pos + offset, now_ms);
                }
            }
            TimerAction::FinishHitFeedback => {
                if session.phase != GamePhase::GameOver {
                    continue;
                }
                if let Some(score) = session.final_score {
                    session.push_event(GameEvent::GameOver {
                        score,
                        reason: EndReason::Collision,
                    });
                    log::info!("Game over: final score {}", score);
                }
            }
        }
    }
}
