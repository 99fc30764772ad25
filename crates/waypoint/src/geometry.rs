//! Plane geometry for boundary correlation.
//!
//! Points carry no frame tag. Callers keep canvas-local, page and abstract
//! coordinates apart; geographic input uses [`crate::map::LngLat`] instead.

use crate::result::{WaypointError, WaypointResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Points closer than this are considered coincident
pub const COINCIDENT_EPSILON: f64 = 1e-9;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to `other`
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Angle of this point around `centre`, in `(-π, π]`
    #[must_use]
    pub fn angle_from(self, centre: Self) -> f64 {
        (self.y - centre.y).atan2(self.x - centre.x)
    }
}

/// A pairing of a rendered vertex with the position it should be dragged to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexPair {
    /// Where the vertex is now
    pub actual: Point,
    /// Where the vertex should end up
    pub desired: Point,
}

/// Arithmetic mean of `points`, `None` when empty
#[must_use]
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Sort `points` by angle around `centre`, or around their own centroid
#[must_use]
pub fn sort_by_angle(points: &[Point], centre: Option<Point>) -> Vec<Point> {
    let Some(centre) = centre.or_else(|| centroid(points)) else {
        return Vec::new();
    };
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.angle_from(centre).total_cmp(&b.angle_from(centre)));
    sorted
}

/// Midpoint of the segment `a`–`b`
#[must_use]
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Point at half the segment length from its midpoint, perpendicular to `a`–`b`
///
/// Rotating the direction `(dx, dy)` to `(dy, -dx)` places the result on the
/// clockwise side in screen coordinates. `None` when `a` and `b` coincide.
#[must_use]
pub fn perpendicular_point(a: Point, b: Point) -> Option<Point> {
    let length = a.distance(b);
    if length < COINCIDENT_EPSILON {
        return None;
    }
    let mid = midpoint(a, b);
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let scale = (length / 2.0) / dy.hypot(-dx);
    Some(Point::new(mid.x + dy * scale, mid.y - dx * scale))
}

/// Signed difference `b - a` wrapped into `[-π, π]`
fn angular_difference(a: f64, b: f64) -> f64 {
    let mut d = (b - a) % (2.0 * PI);
    if d > PI {
        d -= 2.0 * PI;
    } else if d < -PI {
        d += 2.0 * PI;
    }
    d
}

/// Pair `actual` vertices with `desired` positions by angle around their shared centroid
///
/// Both sets are sorted by angle around the centroid of their union. With equal
/// counts the actual ring is rotated to the cyclic alignment with the least total
/// squared angular difference, so vertices straddling the ±π seam still pair with
/// their neighbours. Otherwise pairs are positional and truncated to the shorter set.
#[must_use]
pub fn pair_by_angle(desired: &[Point], actual: &[Point]) -> Vec<VertexPair> {
    let union: Vec<Point> = desired.iter().chain(actual).copied().collect();
    let Some(centre) = centroid(&union) else {
        return Vec::new();
    };

    let desired = sort_by_angle(desired, Some(centre));
    let actual = sort_by_angle(actual, Some(centre));

    let shift = if desired.len() == actual.len() && !actual.is_empty() {
        best_rotation(&desired, &actual, centre)
    } else {
        0
    };

    let n = actual.len();
    desired
        .iter()
        .enumerate()
        .take(n)
        .map(|(i, &goal)| VertexPair {
            actual: actual[(i + shift) % n],
            desired: goal,
        })
        .collect()
}

fn best_rotation(desired: &[Point], actual: &[Point], centre: Point) -> usize {
    let n = actual.len();
    let desired_angles: Vec<f64> = desired.iter().map(|p| p.angle_from(centre)).collect();
    let actual_angles: Vec<f64> = actual.iter().map(|p| p.angle_from(centre)).collect();

    (0..n)
        .map(|shift| {
            let cost: f64 = (0..n)
                .map(|i| angular_difference(desired_angles[i], actual_angles[(i + shift) % n]).powi(2))
                .sum();
            (shift, cost)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(shift, _)| shift)
}

/// A boundary polygon whose identity is its set of vertex positions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from vertices in any order
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Vertices as given
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no vertices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertex centroid
    #[must_use]
    pub fn centroid(&self) -> Option<Point> {
        centroid(&self.points)
    }

    /// Vertices sorted by angle around the centroid
    #[must_use]
    pub fn angular_order(&self) -> Vec<Point> {
        sort_by_angle(&self.points, None)
    }

    /// Same set of positions, ignoring order
    #[must_use]
    pub fn same_positions(&self, other: &Self) -> bool {
        self.len() == other.len() && self.angular_order() == other.angular_order()
    }

    /// Whether the angularly ordered ring turns the same way at every vertex
    #[must_use]
    pub fn is_convex(&self) -> bool {
        let ring = self.angular_order();
        let n = ring.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0.0_f64;
        for i in 0..n {
            let (a, b, c) = (ring[i], ring[(i + 1) % n], ring[(i + 2) % n]);
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross.abs() < COINCIDENT_EPSILON {
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

    /// Check the preconditions for angular correlation
    ///
    /// # Errors
    ///
    /// Fails with fewer than three vertices or when every vertex coincides
    pub fn ensure_correlatable(&self, role: &str) -> WaypointResult<()> {
        if self.points.len() < 3 {
            return Err(WaypointError::geometry(format!(
                "{role} polygon needs at least 3 vertices, got {}",
                self.points.len()
            )));
        }
        let first = self.points[0];
        if self
            .points
            .iter()
            .all(|p| p.distance(first) < COINCIDENT_EPSILON)
        {
            return Err(WaypointError::geometry(format!(
                "{role} polygon is degenerate: all vertices coincide"
            )));
        }
        Ok(())
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}
