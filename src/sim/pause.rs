//! Pause/resume
//!
//! Pausing must be loss-less: the player's position and velocity are saved
//! once on entry and written back unchanged on resume. World stepping is
//! stopped for the whole pause.

use glam::Vec2;

use super::physics::PhysicsWorld;
use super::state::{GameEvent, GamePhase, PauseSnapshot, Session};

/// Enter the paused phase (no-op unless running)
pub fn pause<W: PhysicsWorld>(session: &mut Session<W>) {
    if session.phase != GamePhase::Running {
        return;
    }
    session.phase = GamePhase::Paused;
    hold(session);
    session.world.set_running(false);
    session.push_event(GameEvent::Paused);
    log::info!("Paused at score {}", session.score);
}

/// Leave the paused phase (no-op unless paused)
pub fn resume<W: PhysicsWorld>(session: &mut Session<W>) {
    if session.phase != GamePhase::Paused {
        return;
    }
    session.phase = GamePhase::Running;
    restore(session);
    session.world.set_running(true);
    session.push_event(GameEvent::Resumed);
    log::info!("Resumed at score {}", session.score);
}

pub fn toggle<W: PhysicsWorld>(session: &mut Session<W>) {
    match session.phase {
        GamePhase::Running => pause(session),
        GamePhase::Paused => resume(session),
        GamePhase::GameOver => {}
    }
}

/// Keep the player frozen while paused. The snapshot is only taken if none
/// exists, so a zeroed mid-pause velocity never overwrites the real one.
pub fn hold<W: PhysicsWorld>(session: &mut Session<W>) {
    let Some(player) = session.player else {
        return;
    };
    let Some(body) = session.world.body(player) else {
        return;
    };
    if session.snapshot.is_none() {
        session.snapshot = Some(PauseSnapshot {
            position: body.position,
            velocity: body.velocity,
        });
    }
    session.world.set_velocity(player, Vec2::ZERO);
}

/// Write the snapshot back and clear it
pub fn restore<W: PhysicsWorld>(session: &mut Session<W>) {
    let Some(snapshot) = session.snapshot.take() else {
        return;
    };
    if let Some(player) = session.player {
        session.world.set_position(player, snapshot.position);
        session.world.set_velocity(player, snapshot.velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::level;
    use crate::sim::ArcadeWorld;
    use crate::sim::state::SessionConfig;

    fn session() -> Session<ArcadeWorld> {
        Session::new(SessionConfig::new(level(1).unwrap(), 800.0, 600.0)).unwrap()
    }

    #[test]
    fn test_pause_snapshots_and_freezes() {
        let mut s = session();
        let player = s.player.unwrap();
        s.world.set_velocity(player, Vec2::new(1.5, -2.25));
        let pos = s.player_position().unwrap();

        pause(&mut s);
        assert!(s.is_paused());
        assert!(!s.world.is_running());
        assert_eq!(s.player_velocity(), Some(Vec2::ZERO));
        assert_eq!(
            s.snapshot,
            Some(PauseSnapshot {
                position: pos,
                velocity: Vec2::new(1.5, -2.25)
            })
        );

        // Holding again keeps the first snapshot
        hold(&mut s);
        assert_eq!(s.snapshot.unwrap().velocity, Vec2::new(1.5, -2.25));

        resume(&mut s);
        assert!(s.is_running());
        assert!(s.world.is_running());
        assert!(s.snapshot.is_none());
        assert_eq!(s.player_velocity(), Some(Vec2::new(1.5, -2.25)));
        assert_eq!(s.player_position(), Some(pos));
    }

    #[test]
    fn test_toggle_and_events() {
        let mut s = session();
        toggle(&mut s);
        toggle(&mut s);
        assert_eq!(s.drain_events(), vec![GameEvent::Paused, GameEvent::Resumed]);
    }

    #[test]
    fn test_pause_ignored_after_game_over() {
        let mut s = session();
        s.phase = GamePhase::GameOver;
        toggle(&mut s);
        assert_eq!(s.phase, GamePhase::GameOver);
        assert!(s.snapshot.is_none());
    }

    #[test]
    fn test_pause_without_player_keeps_no_snapshot() {
        let mut s = session();
        s.teardown();
        s.phase = GamePhase::Running;
        pause(&mut s);
        assert!(s.snapshot.is_none());
    }
}
