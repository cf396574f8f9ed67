//! Ray casting primitives.
//!
//! Ray/triangle and ray/box intersection used by the scene ray caster.

use crate::geom::bboxes::BBox;
use crate::geom::triangles::WorldTriangle;
use crate::{Point, Vector};

/// Minimum ray parameter accepted as a hit (avoids hitting the origin surface).
const T_MIN: f64 = 1e-9;

/// A ray defined by an origin point and a direction vector.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: Point,
    /// Unit direction vector
    pub direction: Vector,
}

impl Ray {
    /// Creates a new ray from origin point and direction vector.
    ///
    /// The direction vector is automatically normalized.
    pub fn new(origin: Point, direction: Vector) -> Option<Self> {
        let normalized = direction.normalize()?;
        Some(Self {
            origin,
            direction: normalized,
        })
    }

    /// Intersects the ray with a triangle (Moller-Trumbore).
    ///
    /// Returns the distance `t` to the hit point if the ray crosses the
    /// triangle in front of its origin. Both triangle sides are hit.
    pub fn intersect_triangle(&self, tri: &WorldTriangle) -> Option<f64> {
        let e1 = tri.v1 - tri.v0;
        let e2 = tri.v2 - tri.v0;
        let pvec = self.direction.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < 1e-12 {
            return None; // Ray parallel to triangle plane
        }
        let inv_det = 1. / det;

        let tvec = self.origin - tri.v0;
        let u = tvec.dot(&pvec) * inv_det;
        if !(0. ..=1.).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(&e1);
        let v = self.direction.dot(&qvec) * inv_det;
        if v < 0. || u + v > 1. {
            return None;
        }

        let t = e2.dot(&qvec) * inv_det;
        if t > T_MIN {
            Some(t)
        } else {
            None
        }
    }

    /// Closest intersection with a list of triangles: `(t, index)`.
    pub fn intersect_triangles(&self, triangles: &[WorldTriangle]) -> Option<(f64, usize)> {
        let mut closest: Option<(f64, usize)> = None;
        for (idx, tri) in triangles.iter().enumerate() {
            if let Some(t) = self.intersect_triangle(tri) {
                match closest {
                    None => closest = Some((t, idx)),
                    Some((best_t, _)) if t < best_t => closest = Some((t, idx)),
                    _ => {}
                }
            }
        }
        closest
    }

    /// Slab test against an axis-aligned box.
    ///
    /// Returns the entry distance (0 when the origin is inside the box), or
    /// `None` when the box is missed or lies behind the ray.
    pub fn intersect_bbox(&self, bbox: &BBox) -> Option<f64> {
        let o = [self.origin.x, self.origin.y, self.origin.z];
        let d = [self.direction.dx, self.direction.dy, self.direction.dz];
        let lo = [bbox.min.x, bbox.min.y, bbox.min.z];
        let hi = [bbox.max.x, bbox.max.y, bbox.max.z];

        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            if d[axis].abs() < 1e-15 {
                if o[axis] < lo[axis] || o[axis] > hi[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (lo[axis] - o[axis]) / d[axis];
            let t2 = (hi[axis] - o[axis]) / d[axis];
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }
        if t_near > t_far || t_far < 0. {
            None
        } else {
            Some(t_near.max(0.))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle(z: f64) -> WorldTriangle {
        WorldTriangle::new(
            Point::new(0., 0., z),
            Point::new(2., 0., z),
            Point::new(0., 2., z),
        )
    }

    #[test]
    fn test_ray_creation() {
        assert!(Ray::new(Point::new(0., 0., 0.), Vector::new(1., 0., 0.)).is_some());
        // Zero direction should fail
        assert!(Ray::new(Point::new(0., 0., 0.), Vector::new(0., 0., 0.)).is_none());
        let ray = Ray::new(Point::new(0., 0., 0.), Vector::new(0., 0., 4.)).unwrap();
        assert_eq!(ray.direction, Vector::new(0., 0., 1.));
    }

    #[test]
    fn test_ray_triangle_hit() {
        let ray = Ray::new(Point::new(0.5, 0.5, -5.), Vector::new(0., 0., 1.)).unwrap();
        let t = ray.intersect_triangle(&xy_triangle(0.)).unwrap();
        assert!((t - 5.).abs() < 1e-9);
    }

    #[test]
    fn test_ray_triangle_miss() {
        // Pointing away
        let ray = Ray::new(Point::new(0.5, 0.5, -5.), Vector::new(0., 0., -1.)).unwrap();
        assert!(ray.intersect_triangle(&xy_triangle(0.)).is_none());
        // Outside triangle bounds
        let ray = Ray::new(Point::new(1.5, 1.5, -5.), Vector::new(0., 0., 1.)).unwrap();
        assert!(ray.intersect_triangle(&xy_triangle(0.)).is_none());
        // Parallel
        let ray = Ray::new(Point::new(0.5, 0.5, 1.), Vector::new(1., 0., 0.)).unwrap();
        assert!(ray.intersect_triangle(&xy_triangle(0.)).is_none());
    }

    #[test]
    fn test_ray_origin_on_triangle_is_not_a_hit() {
        let ray = Ray::new(Point::new(0.5, 0.5, 0.), Vector::new(0., 0., 1.)).unwrap();
        assert!(ray.intersect_triangle(&xy_triangle(0.)).is_none());
    }

    #[test]
    fn test_ray_closest_triangle() {
        let tris = vec![xy_triangle(5.), xy_triangle(1.)];
        let ray = Ray::new(Point::new(0.5, 0.5, -2.), Vector::new(0., 0., 1.)).unwrap();
        let (t, idx) = ray.intersect_triangles(&tris).unwrap();
        assert_eq!(idx, 1);
        assert!((t - 3.).abs() < 1e-9);
    }

    #[test]
    fn test_ray_bbox() {
        let bbox = BBox {
            min: Point::new(0., 0., 0.),
            max: Point::new(1., 1., 1.),
        };
        let ray = Ray::new(Point::new(0.5, 0.5, -2.), Vector::new(0., 0., 1.)).unwrap();
        assert!((ray.intersect_bbox(&bbox).unwrap() - 2.).abs() < 1e-12);

        let inside = Ray::new(Point::new(0.5, 0.5, 0.5), Vector::new(1., 0., 0.)).unwrap();
        assert_eq!(inside.intersect_bbox(&bbox), Some(0.));

        let behind = Ray::new(Point::new(0.5, 0.5, 2.), Vector::new(0., 0., 1.)).unwrap();
        assert!(behind.intersect_bbox(&bbox).is_none());

        let beside = Ray::new(Point::new(3., 0.5, -2.), Vector::new(0., 0., 1.)).unwrap();
        assert!(beside.intersect_bbox(&bbox).is_none());
    }
}
