use crate::geom::EPS;
use crate::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Direction or displacement in world space (Z up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    /// Vector from `beg` to `end`.
    pub fn from_points(beg: Point, end: Point) -> Self {
        Self::new(end.x - beg.x, end.y - beg.y, end.z - beg.z)
    }

    /// Unit vector for an altitude above the horizon and an azimuth measured
    /// clockwise from north, both in degrees. North is +Y and east is +X.
    pub fn from_altitude_azimuth(altitude_deg: f64, azimuth_deg: f64) -> Self {
        let (alt, azi) = (altitude_deg.to_radians(), azimuth_deg.to_radians());
        Self::new(alt.cos() * azi.sin(), alt.cos() * azi.cos(), alt.sin())
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.dy * other.dz - self.dz * other.dy,
            self.dz * other.dx - self.dx * other.dz,
            self.dx * other.dy - self.dy * other.dx,
        )
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy + self.dz * other.dz
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_close(&self, other: &Self) -> bool {
        (*self - *other).length() < EPS
    }

    /// Unit vector with the same direction, `None` for a zero vector.
    pub fn normalize(&self) -> Option<Self> {
        let len = self.length();
        (len >= EPS).then(|| Self::new(self.dx / len, self.dy / len, self.dz / len))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        write!(
            f,
            "[{:.prec$}, {:.prec$}, {:.prec$}]",
            self.dx,
            self.dy,
            self.dz,
            prec = prec
        )
    }
}

impl From<[f64; 3]> for Vector {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vector> for [f64; 3] {
    fn from(v: Vector) -> Self {
        [v.dx, v.dy, v.dz]
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.dx + other.dx, self.dy + other.dy, self.dz + other.dz)
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.dx - other.dx, self.dy - other.dy, self.dz - other.dz)
    }
}

impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        Self::new(self.dx * k, self.dy * k, self.dz * k)
    }
}
