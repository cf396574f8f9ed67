//! Polygons in the horizontal (XY) plane.

use crate::Point;
use serde::{Deserialize, Serialize};

/// A point in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Projects a 3D point onto the horizontal plane (drops Z).
    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

/// Crossing-number point-in-polygon test.
///
/// A horizontal ray is shot from `pt` towards +x; the point is inside iff it
/// crosses an odd number of edges. An edge `(i, j)` is crossed when
/// `(yi > py) != (yj > py)` and `px` lies left of the edge at height `py`.
///
/// The test is half-open: points on left or bottom edges count as inside,
/// points on right or top edges count as outside. Polygons with fewer than
/// 3 points contain nothing.
pub fn is_point_in_polygon(pt: Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > pt.y) != (pj.y > pt.y) {
            let x_cross = (pj.x - pi.x) * (pt.y - pi.y) / (pj.y - pi.y) + pi.x;
            if pt.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Centroid of the polygon vertices (vertex mean, not the area centroid).
pub fn vertex_centroid(pts: &[Point2]) -> Option<Point2> {
    if pts.is_empty() {
        return None;
    }
    let n = pts.len() as f64;
    let (sx, sy) = pts.iter().fold((0., 0.), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// Reorders points by their angle around the vertex centroid.
///
/// Mesh vertex order does not trace the outline, so this recovers a boundary
/// order. Only correct for polygons that are star-shaped with respect to
/// their vertex centroid; concave outlines may come out self-intersecting.
pub fn sort_by_angle(mut pts: Vec<Point2>) -> Vec<Point2> {
    if let Some(c) = vertex_centroid(&pts) {
        pts.sort_by(|a, b| {
            let aa = (a.y - c.y).atan2(a.x - c.x);
            let ab = (b.y - c.y).atan2(b.x - c.x);
            aa.total_cmp(&ab)
        });
    }
    pts
}

/// 2D bounding rectangle `(min, max)`.
pub fn bounding_rect(pts: &[Point2]) -> Option<(Point2, Point2)> {
    let first = pts.first()?;
    Some(pts.iter().skip(1).fold((*first, *first), |(lo, hi), p| {
        (
            Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
            Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    }))
}
