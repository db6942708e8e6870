//! Physics world
//!
//! The simulation talks to its rigid-body world through [`PhysicsWorld`].
//! [`ArcadeWorld`] is the built-in implementation: kinematic integration with
//! air friction, collision filtering by category/mask, and collision-begin
//! reporting. It deliberately resolves no contact impulses; the lane walls
//! are enforced by the game loop's clamp and any player/obstacle touch ends
//! the run.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{WorldShape, shapes_overlap};
use crate::rotate;

/// Collision category for ordinary bodies
pub const CATEGORY_DEFAULT: u32 = 0x0001;
/// Collision category for a dashing player and for particles
pub const CATEGORY_GHOST: u32 = 0x0002;
/// Collide with everything
pub const MASK_ALL: u32 = u32::MAX;
/// Collide with nothing
pub const MASK_NONE: u32 = 0;

/// Baseline step length the velocity units are expressed in (60 Hz)
const BASE_STEP_MS: f32 = 1000.0 / 60.0;

/// Stable identifier of a body in a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u32);

/// What a body represents in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyLabel {
    Player,
    Obstacle,
    Wall,
    Particle,
}

/// Category/mask pair; two parts can touch only if each one's mask
/// includes the other's category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const fn new(category: u32, mask: u32) -> Self {
        Self { category, mask }
    }

    #[inline]
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(CATEGORY_DEFAULT, MASK_ALL)
    }
}

/// Local-space geometry of a part
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Convex polygon around the part origin
    Polygon { vertices: Vec<Vec2> },
}

/// One rigid piece of a body
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub shape: Shape,
    /// Offset from the body position (rotates with the body)
    pub offset: Vec2,
    /// Rotation of the part relative to the body
    pub angle: f32,
    pub filter: CollisionFilter,
}

impl Part {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            offset: Vec2::ZERO,
            angle: 0.0,
            filter: CollisionFilter::default(),
        }
    }

    pub fn at(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Place this part in world space for a body at `position`/`angle`
    pub fn world_shape(&self, position: Vec2, angle: f32) -> WorldShape {
        let origin = position + rotate(self.offset, angle);
        match &self.shape {
            Shape::Circle { radius } => WorldShape::Circle {
                center: origin,
                radius: *radius,
            },
            Shape::Polygon { vertices } => {
                let total = angle + self.angle;
                WorldShape::Polygon {
                    vertices: vertices.iter().map(|v| origin + rotate(*v, total)).collect(),
                }
            }
        }
    }
}

/// Everything needed to add a body to a world
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub label: BodyLabel,
    pub parts: Vec<Part>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    /// Static bodies never move and never collide with other static bodies
    pub is_static: bool,
    pub air_friction: f32,
}

impl BodyDesc {
    pub fn new(label: BodyLabel, position: Vec2, parts: Vec<Part>) -> Self {
        Self {
            label,
            parts,
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            is_static: false,
            air_friction: 0.01,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_air_friction(mut self, air_friction: f32) -> Self {
        self.air_friction = air_friction;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Apply one filter to every part
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        for part in &mut self.parts {
            part.filter = filter;
        }
        self
    }
}

/// A body living in a world
#[derive(Debug, Clone)]
pub struct Body {
    pub handle: BodyHandle,
    pub label: BodyLabel,
    pub parts: Vec<Part>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub is_static: bool,
    pub air_friction: f32,
}

impl Body {
    /// Category of the body (taken from its first part)
    pub fn category(&self) -> u32 {
        self.parts.first().map(|p| p.filter.category).unwrap_or(CATEGORY_DEFAULT)
    }

    pub fn world_shapes(&self) -> impl Iterator<Item = WorldShape> + '_ {
        self.parts
            .iter()
            .map(|p| p.world_shape(self.position, self.angle))
    }
}

/// One side of a contact: a specific part of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartRef {
    pub body: BodyHandle,
    pub part: usize,
}

/// A pair of parts that started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactPair {
    pub a: PartRef,
    pub b: PartRef,
}

impl ContactPair {
    fn new(a: PartRef, b: PartRef) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }

    /// Whether either side belongs to `body`
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.a.body == body || self.b.body == body
    }

    /// The side that is not `body`, if the pair involves it
    pub fn other(&self, body: BodyHandle) -> Option<PartRef> {
        if self.a.body == body {
            Some(self.b)
        } else if self.b.body == body {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Capability the simulation needs from a rigid-body world
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Returns false if the body was already gone
    fn remove_body(&mut self, handle: BodyHandle) -> bool;
    fn body(&self, handle: BodyHandle) -> Option<&Body>;
    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body>;
    fn body_count(&self) -> usize;

    /// Advance by `dt_ms`; no-op while stepping is stopped
    fn step(&mut self, dt_ms: f32);
    /// Start/stop stepping
    fn set_running(&mut self, running: bool);
    fn is_running(&self) -> bool;

    /// Collision-begin pairs reported since the last drain
    fn drain_collision_starts(&mut self) -> Vec<ContactPair>;
    /// Remove every body and forget contact state
    fn clear(&mut self);

    fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| b.velocity)
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.position = position;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.velocity = velocity;
        }
    }

    fn translate(&mut self, handle: BodyHandle, delta: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.position += delta;
        }
    }

    /// Set the category of a body and all of its parts
    fn set_category(&mut self, handle: BodyHandle, category: u32) {
        if let Some(body) = self.body_mut(handle) {
            for part in &mut body.parts {
                part.filter.category = category;
            }
        }
    }
}

/// Built-in world: bodies stored by handle, O(n²) broadphase over part AABBs
#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    bodies: BTreeMap<BodyHandle, Body>,
    next_id: u32,
    running: bool,
    /// Pairs touching at the end of the previous step
    touching: HashSet<ContactPair>,
    started: Vec<ContactPair>,
}

impl Default for ArcadeWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeWorld {
    pub fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 1,
            running: true,
            touching: HashSet::new(),
            started: Vec::new(),
        }
    }

    fn integrate(&mut self, dt_ms: f32) {
        let scale = dt_ms / BASE_STEP_MS;
        for body in self.bodies.values_mut().filter(|b| !b.is_static) {
            let damping = (1.0 - body.air_friction * scale).max(0.0);
            body.velocity *= damping;
            body.angular_velocity *= damping;
            body.position += body.velocity * scale;
            body.angle += body.angular_velocity * scale;
        }
    }

    fn find_contacts(&self) -> HashSet<ContactPair> {
        let placed: Vec<(PartRef, bool, CollisionFilter, WorldShape)> = self
            .bodies
            .values()
            .flat_map(|body| {
                body.parts.iter().enumerate().map(move |(i, part)| {
                    (
                        PartRef {
                            body: body.handle,
                            part: i,
                        },
                        body.is_static,
                        part.filter,
                        part.world_shape(body.position, body.angle),
                    )
                })
            })
            .collect();

        let mut contacts = HashSet::new();
        for (i, (ra, static_a, fa, sa)) in placed.iter().enumerate() {
            for (rb, static_b, fb, sb) in &placed[i + 1..] {
                if ra.body == rb.body || (*static_a && *static_b) || !fa.can_collide(fb) {
                    continue;
                }
                if shapes_overlap(sa, sb) {
                    contacts.insert(ContactPair::new(*ra, *rb));
                }
            }
        }
        contacts
    }
}

impl PhysicsWorld for ArcadeWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            handle,
            Body {
                handle,
                label: desc.label,
                parts: desc.parts,
                position: desc.position,
                velocity: desc.velocity,
                angle: desc.angle,
                angular_velocity: desc.angular_velocity,
                is_static: desc.is_static,
                air_friction: desc.air_friction,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let removed = self.bodies.remove(&handle).is_some();
        if removed {
            self.touching.retain(|pair| !pair.involves(handle));
        }
        removed
    }

    fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(&handle)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn step(&mut self, dt_ms: f32) {
        if !self.running {
            return;
        }
        self.integrate(dt_ms);

        let contacts = self.find_contacts();
        let mut fresh: Vec<ContactPair> = contacts
            .iter()
            .filter(|pair| !self.touching.contains(*pair))
            .copied()
            .collect();
        // Deterministic report order
        fresh.sort_by_key(|pair| (pair.a, pair.b));
        self.started.extend(fresh);
        self.touching = contacts;
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn drain_collision_starts(&mut self) -> Vec<ContactPair> {
        std::mem::take(&mut self.started)
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.touching.clear();
        self.started.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(world: &mut ArcadeWorld, pos: Vec2, radius: f32) -> BodyHandle {
        world.add_body(
            BodyDesc::new(BodyLabel::Player, pos, vec![Part::new(Shape::Circle { radius })])
                .with_air_friction(0.0),
        )
    }

    #[test]
    fn test_filter_rules() {
        let normal = CollisionFilter::default();
        let ghost = CollisionFilter::new(CATEGORY_GHOST, MASK_ALL);
        let obstacle = CollisionFilter::new(CATEGORY_DEFAULT, !CATEGORY_GHOST);
        let particle = CollisionFilter::new(CATEGORY_GHOST, MASK_NONE);

        assert!(normal.can_collide(&obstacle));
        assert!(!ghost.can_collide(&obstacle));
        assert!(!particle.can_collide(&normal));
    }

    #[test]
    fn test_step_integrates_velocity_with_air_friction() {
        let mut world = ArcadeWorld::new();
        let h = world.add_body(
            BodyDesc::new(
                BodyLabel::Player,
                Vec2::ZERO,
                vec![Part::new(Shape::Circle { radius: 1.0 })],
            )
            .with_air_friction(0.1),
        );
        world.set_velocity(h, Vec2::new(10.0, 0.0));
        world.step(BASE_STEP_MS);
        let body = world.body(h).unwrap();
        assert!((body.velocity.x - 9.0).abs() < 1e-4);
        assert!((body.position.x - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_stopped_world_does_not_move() {
        let mut world = ArcadeWorld::new();
        let h = ball(&mut world, Vec2::ZERO, 1.0);
        world.set_velocity(h, Vec2::new(5.0, 5.0));
        world.set_running(false);
        world.step(BASE_STEP_MS);
        assert_eq!(world.position(h), Some(Vec2::ZERO));
        world.set_running(true);
        world.step(BASE_STEP_MS);
        assert_ne!(world.position(h), Some(Vec2::ZERO));
    }

    #[test]
    fn test_collision_start_reported_once() {
        let mut world = ArcadeWorld::new();
        let a = ball(&mut world, Vec2::ZERO, 5.0);
        let b = ball(&mut world, Vec2::new(8.0, 0.0), 5.0);

        world.step(BASE_STEP_MS);
        let starts = world.drain_collision_starts();
        assert_eq!(starts.len(), 1);
        assert!(starts[0].involves(a) && starts[0].involves(b));

        // Still touching: no new start
        world.step(BASE_STEP_MS);
        assert!(world.drain_collision_starts().is_empty());

        // Separate, then touch again
        world.set_position(b, Vec2::new(50.0, 0.0));
        world.step(BASE_STEP_MS);
        assert!(world.drain_collision_starts().is_empty());
        world.set_position(b, Vec2::new(8.0, 0.0));
        world.step(BASE_STEP_MS);
        assert_eq!(world.drain_collision_starts().len(), 1);
    }

    #[test]
    fn test_category_change_suppresses_contacts() {
        let mut world = ArcadeWorld::new();
        let player = ball(&mut world, Vec2::ZERO, 5.0);
        world.add_body(
            BodyDesc::new(
                BodyLabel::Obstacle,
                Vec2::new(6.0, 0.0),
                vec![Part::new(Shape::Circle { radius: 5.0 })],
            )
            .with_filter(CollisionFilter::new(CATEGORY_DEFAULT, !CATEGORY_GHOST)),
        );

        world.set_category(player, CATEGORY_GHOST);
        world.step(BASE_STEP_MS);
        assert!(world.drain_collision_starts().is_empty());

        world.set_category(player, CATEGORY_DEFAULT);
        world.step(BASE_STEP_MS);
        assert_eq!(world.drain_collision_starts().len(), 1);
    }

    #[test]
    fn test_composite_parts_reported_separately() {
        let mut world = ArcadeWorld::new();
        let player = world.add_body(BodyDesc::new(
            BodyLabel::Player,
            Vec2::ZERO,
            vec![
                Part::new(Shape::Circle { radius: 5.0 }),
                Part::new(Shape::Circle { radius: 2.0 }).at(Vec2::new(0.0, -8.0)),
            ],
        ));
        let obstacle = ball(&mut world, Vec2::new(0.0, -11.0), 2.0);

        world.step(BASE_STEP_MS);
        let starts = world.drain_collision_starts();
        assert_eq!(starts.len(), 1);
        let hit = starts[0].other(obstacle).unwrap();
        assert_eq!(hit.body, player);
        assert_eq!(hit.part, 1);
    }

    #[test]
    fn test_static_bodies_ignore_each_other() {
        let mut world = ArcadeWorld::new();
        let wall = |x| {
            BodyDesc::new(
                BodyLabel::Wall,
                Vec2::new(x, 0.0),
                vec![Part::new(Shape::Circle { radius: 10.0 })],
            )
            .fixed()
        };
        world.add_body(wall(0.0));
        world.add_body(wall(5.0));
        world.step(BASE_STEP_MS);
        assert!(world.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut world = ArcadeWorld::new();
        let a = ball(&mut world, Vec2::ZERO, 1.0);
        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert!(!world.contains(a));
        ball(&mut world, Vec2::ZERO, 1.0);
        world.clear();
        assert_eq!(world.body_count(), 0);
    }
}
