//! Play-area resize
//!
//! Walls are rebuilt at the new edges and the player is pulled back above
//! the new bottom margin. Obstacles keep their positions.

use super::physics::PhysicsWorld;
use super::state::{GameEvent, Session};
use crate::consts::PLAYER_SAFE_MARGIN;

/// Apply a new play-area size; non-positive sizes are ignored
pub fn resize<W: PhysicsWorld>(session: &mut Session<W>, width: f32, height: f32) {
    if session.torn_down || !(width > 0.0 && height > 0.0) {
        return;
    }
    session.width = width;
    session.height = height;
    session.build_walls();

    let safe_y = height - PLAYER_SAFE_MARGIN;
    if let (Some(player), Some(pos)) = (session.player, session.player_position()) {
        session.world.set_position(player, pos.with_y(pos.y.min(safe_y)));
    }
    // A paused player resumes inside the new bounds too
    if let Some(snapshot) = session.snapshot.as_mut() {
        snapshot.position.y = snapshot.position.y.min(safe_y);
    }

    session.push_event(GameEvent::Resized { width, height });
    log::info!("Resized play area to {}x{}", width, height);
}
