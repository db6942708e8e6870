//! Obstacle spawning and retirement
//!
//! Obstacles appear just above the visible area with a random shape, size,
//! lane position and spin, then slide down by a fixed amount every tick.
//! There is no cap on how many are alive; retirement below the bottom edge
//! keeps the set small in practice.

use glam::Vec2;
use rand::Rng;

use super::physics::{
    BodyDesc, BodyLabel, CATEGORY_DEFAULT, CATEGORY_GHOST, CollisionFilter, Part, PhysicsWorld,
};
use super::state::{Obstacle, ObstacleShape, Session};
use crate::consts::*;

/// Obstacles collide with everything except a dashing player and particles
pub const OBSTACLE_FILTER: CollisionFilter =
    CollisionFilter::new(CATEGORY_DEFAULT, !CATEGORY_GHOST);

/// Spawn one obstacle for a play area of `width` x `height`
pub fn spawn<W: PhysicsWorld>(session: &mut Session<W>, width: f32, _height: f32) -> Obstacle {
    let shape = ObstacleShape::ALL[session.rng.random_range(0..ObstacleShape::ALL.len())];
    let size = session
        .rng
        .random_range(OBSTACLE_MIN_SIZE..OBSTACLE_MAX_SIZE);
    // Fully on-screen horizontally; degenerate lanes pin to the middle
    let x = if width > size * 2.0 {
        session.rng.random_range(size..width - size)
    } else {
        width / 2.0
    };
    let spin = session
        .rng
        .random_range(-OBSTACLE_MAX_SPIN..OBSTACLE_MAX_SPIN);

    let body = session.world.add_body(
        BodyDesc::new(
            BodyLabel::Obstacle,
            Vec2::new(x, OBSTACLE_SPAWN_Y),
            vec![Part::new(shape.shape(size))],
        )
        .with_filter(OBSTACLE_FILTER)
        .with_air_friction(OBSTACLE_AIR_FRICTION)
        .with_angular_velocity(spin),
    );

    let obstacle = Obstacle {
        body,
        shape,
        size,
        spawned_tick: session.tick_count,
    };
    session.obstacles.push(obstacle);
    log::debug!(
        "Spawned {:?} obstacle size={:.1} x={:.1} ({} active)",
        shape,
        size,
        x,
        session.obstacles.len()
    );
    obstacle
}

/// Move every obstacle spawned before this tick down by `speed`, then
/// retire those past the bottom margin. Returns the number retired.
pub fn advance_and_retire<W: PhysicsWorld>(session: &mut Session<W>, speed: f32) -> usize {
    let current_tick = session.tick_count;
    let limit = session.height + OBSTACLE_RETIRE_MARGIN;
    let world = &mut session.world;
    let before = session.obstacles.len();

    session.obstacles.retain(|obstacle| {
        if !world.contains(obstacle.body) {
            return false;
        }
        if obstacle.spawned_tick == current_tick {
            return true;
        }
        world.translate(obstacle.body, Vec2::new(0.0, speed));
        let below = world
            .position(obstacle.body)
            .is_some_and(|pos| pos.y > limit);
        if below {
            world.remove_body(obstacle.body);
        }
        !below
    });

    let retired = before - session.obstacles.len();
    if retired > 0 {
        log::debug!("Retired {} obstacles ({} active)", retired, session.obstacles.len());
    }
    retired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::level;
    use crate::sim::ArcadeWorld;
    use crate::sim::physics::Shape;
    use crate::sim::state::SessionConfig;

    fn session(seed: u64) -> Session<ArcadeWorld> {
        Session::new(SessionConfig::new(level(1).unwrap(), 800.0, 600.0).with_seed(seed)).unwrap()
    }

    #[test]
    fn test_spawn_ranges() {
        let mut s = session(7);
        for _ in 0..200 {
            let o = spawn(&mut s, 800.0, 600.0);
            assert!((OBSTACLE_MIN_SIZE..=OBSTACLE_MAX_SIZE).contains(&o.size));
            let body = s.world.body(o.body).unwrap();
            assert!(body.position.x >= o.size && body.position.x <= 800.0 - o.size);
            assert_eq!(body.position.y, OBSTACLE_SPAWN_Y);
            assert!(body.angular_velocity >= -OBSTACLE_MAX_SPIN);
            assert!(body.angular_velocity <= OBSTACLE_MAX_SPIN);
            assert_eq!(body.label, BodyLabel::Obstacle);
            assert_eq!(body.parts[0].filter, OBSTACLE_FILTER);
        }
        assert_eq!(s.obstacles.len(), 200);
        // All three shapes show up
        for shape in ObstacleShape::ALL {
            assert!(s.obstacles.iter().any(|o| o.shape == shape));
        }
    }

    #[test]
    fn test_shape_footprints() {
        assert_eq!(ObstacleShape::Circle.shape(30.0), Shape::Circle { radius: 15.0 });
        let Shape::Polygon { vertices } = ObstacleShape::Rectangle.shape(20.0) else {
            panic!("rectangle should be a polygon");
        };
        assert_eq!(vertices[2], Vec2::new(15.0, 5.0));
    }

    #[test]
    fn test_same_seed_same_obstacles() {
        let mut a = session(42);
        let mut b = session(42);
        for _ in 0..10 {
            let oa = spawn(&mut a, 800.0, 600.0);
            let ob = spawn(&mut b, 800.0, 600.0);
            assert_eq!(oa.shape, ob.shape);
            assert_eq!(oa.size, ob.size);
            assert_eq!(a.world.position(oa.body), b.world.position(ob.body));
        }
    }

    #[test]
    fn test_fresh_obstacle_not_advanced_same_tick() {
        let mut s = session(1);
        let o = spawn(&mut s, 800.0, 600.0);
        advance_and_retire(&mut s, 10.0);
        assert_eq!(s.world.position(o.body).unwrap().y, OBSTACLE_SPAWN_Y);

        s.tick_count += 1;
        advance_and_retire(&mut s, 10.0);
        assert_eq!(s.world.position(o.body).unwrap().y, OBSTACLE_SPAWN_Y + 10.0);
    }

    #[test]
    fn test_retire_past_bottom_margin() {
        let mut s = session(1);
        let o = spawn(&mut s, 800.0, 600.0);
        s.tick_count += 1;
        // Right at the limit stays, one step further goes
        s.world.set_position(o.body, Vec2::new(100.0, 690.0));
        assert_eq!(advance_and_retire(&mut s, 10.0), 0);
        assert_eq!(advance_and_retire(&mut s, 10.0), 1);
        assert!(s.obstacles.is_empty());
        assert!(!s.world.contains(o.body));
    }

    #[test]
    fn test_narrow_lane_spawns_centered() {
        let mut s = session(3);
        let o = spawn(&mut s, 30.0, 600.0);
        assert_eq!(s.world.position(o.body).unwrap().x, 15.0);
    }
}
