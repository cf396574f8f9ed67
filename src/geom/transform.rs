//! Affine local-to-world transforms.
//!
//! A [`Transform`] is a 4x4 homogeneous matrix composed as `T * R * S`
//! (scale first, then rotation, then translation).

use crate::{Point, Vector};
use ndarray as nd;

/// Calculate rotation matrix for a unit vector `u` and angle `phi` (radians).
///
/// Uses Rodrigues' rotation formula, which is numerically more stable
/// than the explicit matrix expansion:
/// https://en.wikipedia.org/wiki/Rodrigues%27_rotation_formula
///
/// `u` must be a unit vector.
pub fn rotation_matrix(u: &Vector, phi: f64) -> nd::Array2<f64> {
    let w: nd::Array2<f64> = nd::arr2(&[[0., -u.dz, u.dy], [u.dz, 0., -u.dx], [-u.dy, u.dx, 0.]]);

    nd::Array2::<f64>::eye(3) + phi.sin() * &w + (2. * (phi / 2.).sin().powi(2)) * w.dot(&w)
}

/// Local-to-world affine transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    matrix: nd::Array2<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: nd::Array2::eye(4),
        }
    }

    /// Builds a transform from a row-major 4x4 matrix.
    pub fn from_matrix(m: [[f64; 4]; 4]) -> Self {
        Self {
            matrix: nd::arr2(&m),
        }
    }

    pub fn from_translation(t: Vector) -> Self {
        Self::from_trs(t, None, Vector::new(1., 1., 1.))
    }

    /// Composes translation, rotation and scale.
    ///
    /// `rotation` is an `(axis, angle_radians)` pair. The axis does not need
    /// to be normalized; a zero-length axis means no rotation.
    pub fn from_trs(translation: Vector, rotation: Option<(Vector, f64)>, scale: Vector) -> Self {
        let rot = match rotation.and_then(|(axis, phi)| axis.normalize().map(|u| (u, phi))) {
            Some((u, phi)) => rotation_matrix(&u, phi),
            None => nd::Array2::eye(3),
        };
        let s = [scale.dx, scale.dy, scale.dz];
        let t = [translation.dx, translation.dy, translation.dz];

        let mut matrix = nd::Array2::<f64>::eye(4);
        for i in 0..3 {
            for j in 0..3 {
                matrix[[i, j]] = rot[[i, j]] * s[j];
            }
            matrix[[i, 3]] = t[i];
        }
        Self { matrix }
    }

    /// Maps a point from the local frame to world space.
    pub fn transform_point(&self, p: Point) -> Point {
        let v = nd::arr1(&[p.x, p.y, p.z, 1.]);
        let w = self.matrix.dot(&v);
        Point::new(w[0], w[1], w[2])
    }

    /// Maps every point of `pts` to world space.
    pub fn transform_points(&self, pts: &[Point]) -> Vec<Point> {
        pts.iter().map(|p| self.transform_point(*p)).collect()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
