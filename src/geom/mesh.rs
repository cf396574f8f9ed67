use crate::error::{Error, Result};
use crate::geom::bboxes::BBox;
use crate::geom::transform::Transform;
use crate::geom::triangles::{TriangleIndex, Triangles};
use crate::Point;
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh in its local coordinate frame.
///
/// Every index stored in `triangles` is guaranteed to be smaller than the
/// number of vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMesh")]
pub struct Mesh {
    vertices: Vec<Point>,
    triangles: Vec<TriangleIndex>,
}

#[derive(Deserialize)]
struct RawMesh {
    vertices: Vec<Point>,
    triangles: Vec<TriangleIndex>,
}

impl TryFrom<RawMesh> for Mesh {
    type Error = Error;

    fn try_from(raw: RawMesh) -> Result<Self> {
        Mesh::new(raw.vertices, raw.triangles)
    }
}

impl Mesh {
    /// Creates a mesh and validates its triangle indices.
    pub fn new(vertices: Vec<Point>, triangles: Vec<TriangleIndex>) -> Result<Self> {
        let n = vertices.len();
        if let Some((i, tri)) = triangles
            .iter()
            .enumerate()
            .find(|(_, t)| t.0 >= n || t.1 >= n || t.2 >= n)
        {
            return Err(Error::InputParse(format!(
                "triangle {i} references vertex {:?} but the mesh has {n} vertices",
                tri
            )));
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[TriangleIndex] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Lazily yields the mesh triangles in world space.
    ///
    /// Each call starts a fresh pass over the index buffer.
    pub fn world_triangles<'a>(&'a self, transform: &'a Transform) -> Triangles<'a> {
        Triangles::new(self, transform)
    }

    /// World-space vertex positions.
    pub fn world_vertices(&self, transform: &Transform) -> Vec<Point> {
        transform.transform_points(&self.vertices)
    }

    /// World-space axis-aligned bounding box. `None` for a mesh without vertices.
    pub fn world_bbox(&self, transform: &Transform) -> Option<BBox> {
        BBox::from_points(&self.world_vertices(transform))
    }

    /// Axis-aligned box with two triangles per face, outward normals.
    ///
    /// The box spans `[0, dx] x [0, dy] x [0, dz]` in the local frame.
    pub fn from_box(dx: f64, dy: f64, dz: f64) -> Self {
        let vertices = vec![
            Point::new(0., 0., 0.),
            Point::new(dx, 0., 0.),
            Point::new(dx, dy, 0.),
            Point::new(0., dy, 0.),
            Point::new(0., 0., dz),
            Point::new(dx, 0., dz),
            Point::new(dx, dy, dz),
            Point::new(0., dy, dz),
        ];
        let triangles = vec![
            // floor (facing -z)
            TriangleIndex(0, 2, 1),
            TriangleIndex(0, 3, 2),
            // roof (facing +z)
            TriangleIndex(4, 5, 6),
            TriangleIndex(4, 6, 7),
            // wall y=0 (facing -y)
            TriangleIndex(0, 1, 5),
            TriangleIndex(0, 5, 4),
            // wall x=dx (facing +x)
            TriangleIndex(1, 2, 6),
            TriangleIndex(1, 6, 5),
            // wall y=dy (facing +y)
            TriangleIndex(2, 3, 7),
            TriangleIndex(2, 7, 6),
            // wall x=0 (facing -x)
            TriangleIndex(3, 0, 4),
            TriangleIndex(3, 4, 7),
        ];
        Self {
            vertices,
            triangles,
        }
    }

    /// Flat rectangle in the XY plane spanning `[0, dx] x [0, dy]`, facing +z.
    pub fn from_rectangle(dx: f64, dy: f64) -> Self {
        let vertices = vec![
            Point::new(0., 0., 0.),
            Point::new(dx, 0., 0.),
            Point::new(dx, dy, 0.),
            Point::new(0., dy, 0.),
        ];
        let triangles = vec![TriangleIndex(0, 1, 2), TriangleIndex(0, 2, 3)];
        Self {
            vertices,
            triangles,
        }
    }
}
