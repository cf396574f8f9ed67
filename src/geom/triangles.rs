use crate::geom::mesh::Mesh;
use crate::geom::transform::Transform;
use crate::{Point, Vector};
use serde::{Deserialize, Serialize};

/// Type for holding vertex indices for a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleIndex(pub usize, pub usize, pub usize);

/// A triangle with vertices in world space.
///
/// Area, normal and centroid are derived on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTriangle {
    pub v0: Point,
    pub v1: Point,
    pub v2: Point,
}

impl WorldTriangle {
    pub fn new(v0: Point, v1: Point, v2: Point) -> Self {
        Self { v0, v1, v2 }
    }

    fn edge_cross(&self) -> Vector {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Triangle area, `0.5 * |(v1 - v0) x (v2 - v0)|`.
    pub fn area(&self) -> f64 {
        0.5 * self.edge_cross().length()
    }

    /// Unit normal following the winding `v0 -> v1 -> v2`.
    ///
    /// Degenerate (zero-area) triangles have no normal.
    pub fn normal(&self) -> Option<Vector> {
        self.edge_cross().normalize()
    }

    pub fn centroid(&self) -> Point {
        Point::new(
            (self.v0.x + self.v1.x + self.v2.x) / 3.,
            (self.v0.y + self.v1.y + self.v2.y) / 3.,
            (self.v0.z + self.v1.z + self.v2.z) / 3.,
        )
    }

    /// Maps two uniform random numbers in `[0, 1)` to a point uniformly
    /// distributed over the triangle.
    ///
    /// Pairs falling outside the triangle (`r1 + r2 > 1`) are reflected back.
    pub fn barycentric_point(&self, mut r1: f64, mut r2: f64) -> Point {
        if r1 + r2 > 1. {
            r1 = 1. - r1;
            r2 = 1. - r2;
        }
        self.v0 + (self.v1 - self.v0) * r1 + (self.v2 - self.v0) * r2
    }
}

/// Lazy iterator over the world-space triangles of a mesh.
///
/// Created with [`Mesh::world_triangles`]. The iterator borrows the mesh and
/// the transform, so a new pass can always be started from scratch.
#[derive(Debug, Clone)]
pub struct Triangles<'a> {
    mesh: &'a Mesh,
    transform: &'a Transform,
    pos: usize,
}

impl<'a> Triangles<'a> {
    pub fn new(mesh: &'a Mesh, transform: &'a Transform) -> Self {
        Self {
            mesh,
            transform,
            pos: 0,
        }
    }

    /// Number of triangles already yielded.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for Triangles<'_> {
    type Item = WorldTriangle;

    fn next(&mut self) -> Option<WorldTriangle> {
        let ix = self.mesh.triangles().get(self.pos)?;
        self.pos += 1;
        let pts = self.mesh.vertices();
        Some(WorldTriangle::new(
            self.transform.transform_point(pts[ix.0]),
            self.transform.transform_point(pts[ix.1]),
            self.transform.transform_point(pts[ix.2]),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.mesh.triangle_count().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Triangles<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> WorldTriangle {
        WorldTriangle::new(
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(0., 1., 0.),
        )
    }

    #[test]
    fn test_area_normal_centroid() {
        let tri = unit_triangle();
        assert!((tri.area() - 0.5).abs() < 1e-12);
        assert!(tri.normal().unwrap().is_close(&Vector::new(0., 0., 1.)));
        assert!(tri
            .centroid()
            .is_close(&Point::new(1. / 3., 1. / 3., 0.)));
    }

    #[test]
    fn test_degenerate_triangle() {
        let p = Point::new(1., 1., 1.);
        let tri = WorldTriangle::new(p, p, Point::new(2., 2., 2.));
        assert_eq!(tri.area(), 0.);
        assert!(tri.normal().is_none());
    }

    #[test]
    fn test_barycentric_point_stays_inside() {
        let tri = unit_triangle();
        for (r1, r2) in [(0.0, 0.0), (0.9, 0.9), (0.2, 0.7), (0.99, 0.01)] {
            let p = tri.barycentric_point(r1, r2);
            assert!(p.x >= -1e-12 && p.y >= -1e-12);
            assert!(p.x + p.y <= 1. + 1e-12);
        }
    }

    #[test]
    fn test_iterator_is_restartable() {
        let mesh = Mesh::from_box(1., 1., 1.);
        let tr = Transform::identity();
        let first: Vec<WorldTriangle> = mesh.world_triangles(&tr).collect();
        let second: Vec<WorldTriangle> = mesh.world_triangles(&tr).collect();
        assert_eq!(first.len(), 12);
        assert_eq!(first, second);

        let mut it = mesh.world_triangles(&tr);
        assert_eq!(it.len(), 12);
        it.next();
        assert_eq!(it.position(), 1);
        assert_eq!(it.len(), 11);
    }
}
