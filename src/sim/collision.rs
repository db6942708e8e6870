//! Overlap tests for convex shapes
//!
//! Bodies are built from circles and convex polygons. Contacts only need a
//! yes/no answer (the game ends on touch), so there is no manifold or
//! penetration resolution here.

use glam::Vec2;

/// A shape placed in world space
#[derive(Debug, Clone, PartialEq)]
pub enum WorldShape {
    Circle { center: Vec2, radius: f32 },
    /// Convex polygon, vertices in winding order
    Polygon { vertices: Vec<Vec2> },
}

impl WorldShape {
    fn aabb(&self) -> Aabb {
        match self {
            WorldShape::Circle { center, radius } => Aabb {
                min: *center - Vec2::splat(*radius),
                max: *center + Vec2::splat(*radius),
            },
            WorldShape::Polygon { vertices } => Aabb::from_points(vertices),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    #[inline]
    fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Test whether two world-space shapes overlap
pub fn shapes_overlap(a: &WorldShape, b: &WorldShape) -> bool {
    if !a.aabb().overlaps(&b.aabb()) {
        return false;
    }
    match (a, b) {
        (
            WorldShape::Circle { center: ca, radius: ra },
            WorldShape::Circle { center: cb, radius: rb },
        ) => circle_circle(*ca, *ra, *cb, *rb),
        (WorldShape::Circle { center, radius }, WorldShape::Polygon { vertices })
        | (WorldShape::Polygon { vertices }, WorldShape::Circle { center, radius }) => {
            circle_polygon(*center, *radius, vertices)
        }
        (WorldShape::Polygon { vertices: va }, WorldShape::Polygon { vertices: vb }) => {
            polygon_polygon(va, vb)
        }
    }
}

#[inline]
fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> bool {
    ca.distance_squared(cb) < (ra + rb) * (ra + rb)
}

/// Circle against convex polygon: centre inside, or closest edge within radius
fn circle_polygon(center: Vec2, radius: f32, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    if point_in_convex(center, vertices) {
        return true;
    }
    let r2 = radius * radius;
    edges(vertices).any(|(a, b)| closest_on_segment(center, a, b).distance_squared(center) < r2)
}

/// Separating axis test for two convex polygons
fn polygon_polygon(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    for (p, q) in edges(a).chain(edges(b)) {
        let axis = (q - p).perp();
        if axis.length_squared() < 1e-12 {
            continue;
        }
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        if max_a <= min_b || max_b <= min_a {
            return false;
        }
    }
    true
}

/// Point inside a convex polygon of either winding
fn point_in_convex(point: Vec2, vertices: &[Vec2]) -> bool {
    let mut sign = 0.0f32;
    for (a, b) in edges(vertices) {
        let cross = (b - a).perp_dot(point - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Closest point to `p` on segment `a`-`b`
fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Vertices of an axis-aligned rectangle centred on the origin
pub fn rect_vertices(width: f32, height: f32) -> Vec<Vec2> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    vec![
        Vec2::new(-hw, -hh),
        Vec2::new(hw, -hh),
        Vec2::new(hw, hh),
        Vec2::new(-hw, hh),
    ]
}

/// Vertices of a regular polygon with the given circumradius, centred on the origin
pub fn regular_polygon_vertices(sides: u32, radius: f32) -> Vec<Vec2> {
    let sides = sides.max(3);
    let step = std::f32::consts::TAU / sides as f32;
    // First vertex offset by half a step (matches how the triangle ears sit)
    (0..sides)
        .map(|i| Vec2::from_angle(step * 0.5 + step * i as f32) * radius)
        .collect()
}

fn edges(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)))
}
