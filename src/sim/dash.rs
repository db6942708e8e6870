//! Dash ability
//!
//! Ready → Active → Cooling → Ready. Activation launches the player along
//! its current direction of travel and makes it immune to obstacles for the
//! variant's dash window plus a short buffer. The cooldown gate alone keeps
//! a second dash from starting while one is in effect.

use glam::Vec2;

use super::physics::{CATEGORY_GHOST, PhysicsWorld};
use super::state::{GameEvent, Session};
use super::timers::TimerAction;
use crate::consts::DASH_BURST_COUNT;

/// Dash direction from the current velocity: the sign of each axis,
/// upward when there is no vertical motion, diagonals scaled to unit length
pub fn dash_direction(velocity: Vec2) -> Vec2 {
    let dir = Vec2::new(
        if velocity.x == 0.0 { 0.0 } else { velocity.x.signum() },
        if velocity.y == 0.0 { -1.0 } else { velocity.y.signum() },
    );
    if dir.x != 0.0 && dir.y != 0.0 {
        dir / std::f32::consts::SQRT_2
    } else {
        dir
    }
}

/// Try to dash at `now_ms`; returns true if the dash happened
pub fn activate<W: PhysicsWorld>(session: &mut Session<W>, now_ms: f64) -> bool {
    let Some(player) = session.player else {
        return false;
    };
    if !session.is_running() || !session.dash.is_ready(now_ms) {
        return false;
    }
    let Some(velocity) = session.world.velocity(player) else {
        return false;
    };

    let variant = session.variant;
    let direction = dash_direction(velocity);
    session
        .world
        .set_velocity(player, direction * variant.dash_force());

    // Immune to obstacles until the window (plus buffer) closes
    session.world.set_category(player, CATEGORY_GHOST);
    session.timers.schedule(
        now_ms + variant.dash_immunity_ms(),
        TimerAction::EndDashImmunity { player },
    );

    if variant.composite {
        let spacing = variant.dash_window_ms / DASH_BURST_COUNT as f64;
        for index in 0..DASH_BURST_COUNT {
            session.timers.schedule(
                now_ms + spacing * index as f64,
                TimerAction::DashBurst { player, index },
            );
        }
    }

    session.dash.last_activation_ms = Some(now_ms);
    session.dash.cooldown_fraction = 1.0;
    session.push_event(GameEvent::DashActivated { direction });
    session.push_event(GameEvent::DashCooldown { fraction: 1.0 });

    log::debug!(
        "Dash at {:.0}ms: direction=({:.2}, {:.2})",
        now_ms,
        direction.x,
        direction.y
    );
    true
}

/// Recompute the remaining cooldown for a running tick and report it
pub fn update_cooldown<W: PhysicsWorld>(session: &mut Session<W>, now_ms: f64) -> f32 {
    let fraction = session.dash.remaining_fraction(now_ms);
    session.dash.cooldown_fraction = fraction;
    session.push_event(GameEvent::DashCooldown { fraction });
    fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DASH_BASE_FORCE;
    use crate::levels::level;
    use crate::sim::physics::CATEGORY_DEFAULT;
    use crate::sim::state::{SessionConfig, VariantKind};
    use crate::sim::{ArcadeWorld, pause};

    fn session(variant: VariantKind) -> Session<ArcadeWorld> {
        Session::new(SessionConfig::new(level(1).unwrap(), 800.0, 600.0).with_variant(variant))
            .unwrap()
    }

    #[test]
    fn test_direction_rules() {
        assert_eq!(dash_direction(Vec2::ZERO), Vec2::new(0.0, -1.0));
        assert_eq!(
            dash_direction(Vec2::new(2.5, 0.0)),
            Vec2::new(1.0, -1.0) / std::f32::consts::SQRT_2
        );
        assert_eq!(dash_direction(Vec2::new(0.0, 4.0)), Vec2::new(0.0, 1.0));
        let d = dash_direction(Vec2::new(-3.0, 0.5));
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!(d.x < 0.0 && d.y > 0.0);
    }

    #[test]
    fn test_stationary_dash_goes_up() {
        let mut s = session(VariantKind::Ball);
        assert!(activate(&mut s, 10_000.0));
        assert_eq!(s.player_velocity(), Some(Vec2::new(0.0, -DASH_BASE_FORCE)));
        let player = s.player.unwrap();
        assert_eq!(s.world.body(player).unwrap().category(), CATEGORY_GHOST);
        assert_eq!(s.dash.cooldown_fraction, 1.0);
    }

    #[test]
    fn test_second_dash_inside_cooldown_is_noop() {
        let mut s = session(VariantKind::Ball);
        let player = s.player.unwrap();
        s.world.set_velocity(player, Vec2::new(3.0, 0.0));

        assert!(activate(&mut s, 10_000.0));
        let after_first = s.player_velocity().unwrap();

        // Change motion, then try again inside the 1.5 s window
        s.world.set_velocity(player, Vec2::new(0.0, 3.0));
        let before_second = s.player_velocity().unwrap();
        assert!(!activate(&mut s, 11_000.0));
        assert_eq!(s.player_velocity().unwrap(), before_second);
        assert_ne!(after_first, before_second);
        // Timer not reset
        assert_eq!(s.dash.last_activation_ms, Some(10_000.0));

        assert!(activate(&mut s, 11_500.0));
    }

    #[test]
    fn test_cat_dash_is_stronger_and_bursts() {
        let mut s = session(VariantKind::Cat);
        assert!(activate(&mut s, 0.0));
        let v = s.player_velocity().unwrap();
        assert!((v.length() - 22.5).abs() < 1e-4);
        // One immunity reset plus the burst ring
        assert_eq!(s.timers.len(), 1 + DASH_BURST_COUNT as usize);
        // Faster cooldown
        assert!(!activate(&mut s, 999.0));
        assert!(activate(&mut s, 1000.0));
    }

    #[test]
    fn test_no_dash_while_paused_or_torn_down() {
        let mut s = session(VariantKind::Ball);
        pause::pause(&mut s);
        assert!(!activate(&mut s, 0.0));
        pause::resume(&mut s);
        s.teardown();
        assert!(!activate(&mut s, 0.0));
    }

    #[test]
    fn test_update_cooldown_reports_fraction() {
        let mut s = session(VariantKind::Ball);
        assert!(activate(&mut s, 0.0));
        s.drain_events();
        assert!((update_cooldown(&mut s, 750.0) - 0.5).abs() < 1e-6);
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::DashCooldown { fraction: 0.5 }]
        );
        assert_eq!(update_cooldown(&mut s, 1500.0), 0.0);
        let player = s.player.unwrap();
        // Immunity ends via timer, not cooldown
        assert_ne!(s.world.body(player).unwrap().category(), CATEGORY_DEFAULT);
    }
}
