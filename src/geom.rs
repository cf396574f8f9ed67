pub mod bboxes;
pub mod mesh;
pub mod point;
pub mod polygon2d;
pub mod ray;
pub mod transform;
pub mod triangles;
pub mod vector;

/// Geometric precision
pub const EPS: f64 = 1e-10;

