//! Scene objects and the ray intersection service.
//!
//! [`RayCaster`] is the only way the exposure code queries occluders.
//! [`Scene`] is a flat, brute-force implementation: every object keeps its
//! world-space triangles and bounding box, and a ray is tested against the
//! triangles of each object whose box it enters.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geom::polygon2d::Point2;
use crate::geom::ray::Ray;
use crate::{BBox, Mesh, Point, Transform, UID, Vector, WorldTriangle};

/// First intersection along a ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    /// Object that was hit.
    pub object: UID,
    /// Distance from the ray origin to the hit point.
    pub distance: f64,
}

/// Ray intersection service.
///
/// A miss is a normal outcome and means "unoccluded".
pub trait RayCaster {
    fn cast(&self, origin: Point, direction: Vector) -> Option<RayHit>;
}

/// A building entity: identity, optional mesh and world transform.
///
/// A building without a mesh is the missing-geometry case. It still has a
/// position (the transform origin) so it can be assigned to a planning area.
#[derive(Debug, Clone)]
pub struct Building {
    pub uid: UID,
    pub name: String,
    pub mesh: Option<Mesh>,
    pub transform: Transform,
}

impl Building {
    pub fn new(name: &str, mesh: Mesh, transform: Transform) -> Self {
        Self {
            uid: UID::new(),
            name: name.to_string(),
            mesh: Some(mesh),
            transform,
        }
    }

    /// Building with no geometry attached.
    pub fn without_mesh(name: &str, transform: Transform) -> Self {
        Self {
            uid: UID::new(),
            name: name.to_string(),
            mesh: None,
            transform,
        }
    }

    /// Returns the mesh or a missing-geometry error.
    pub fn mesh(&self) -> Result<&Mesh> {
        self.mesh
            .as_ref()
            .filter(|m| m.triangle_count() > 0)
            .ok_or_else(|| Error::MissingGeometry {
                entity: self.name.clone(),
            })
    }

    /// World-space bounding box of the mesh.
    pub fn world_bbox(&self) -> Option<BBox> {
        self.mesh.as_ref()?.world_bbox(&self.transform)
    }

    /// Representative point of the building in the horizontal plane.
    ///
    /// Bounding box centre when a mesh is present, the transform origin
    /// otherwise.
    pub fn center(&self) -> Point2 {
        let c = match self.world_bbox() {
            Some(bbox) => bbox.center(),
            None => self.transform.transform_point(Point::new(0., 0., 0.)),
        };
        Point2::from_point(c)
    }
}

/// Geometry of one object as seen by the ray caster.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub uid: UID,
    pub name: String,
    pub triangles: Vec<WorldTriangle>,
    pub bbox: BBox,
}

/// Flat collection of occluders.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a scene from buildings. Buildings without geometry are skipped.
    pub fn from_buildings(buildings: &[Building]) -> Self {
        let mut scene = Self::new();
        for b in buildings {
            if let Err(e) = scene.add_building(b) {
                warn!("Skipping '{}' in scene: {}", b.name, e);
            }
        }
        scene
    }

    pub fn add_building(&mut self, building: &Building) -> Result<()> {
        let mesh = building.mesh()?;
        self.add_mesh(building.uid.clone(), &building.name, mesh, &building.transform)
    }

    /// Adds an object given by a mesh in its local frame.
    pub fn add_mesh(
        &mut self,
        uid: UID,
        name: &str,
        mesh: &Mesh,
        transform: &Transform,
    ) -> Result<()> {
        let bbox = mesh
            .world_bbox(transform)
            .ok_or_else(|| Error::MissingGeometry {
                entity: name.to_string(),
            })?;
        let triangles: Vec<WorldTriangle> = mesh.world_triangles(transform).collect();
        debug!("Scene object '{}': {} triangles", name, triangles.len());
        self.objects.push(SceneObject {
            uid,
            name: name.to_string(),
            triangles,
            bbox,
        });
        Ok(())
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.triangles.len()).sum()
    }
}

impl RayCaster for Scene {
    fn cast(&self, origin: Point, direction: Vector) -> Option<RayHit> {
        let ray = Ray::new(origin, direction)?;

        let mut closest: Option<(usize, f64)> = None;
        for (idx, obj) in self.objects.iter().enumerate() {
            let Some(t_box) = ray.intersect_bbox(&obj.bbox) else {
                continue;
            };
            if let Some((_, best_t)) = closest {
                if t_box > best_t {
                    continue;
                }
            }
            if let Some((t, _)) = ray.intersect_triangles(&obj.triangles) {
                match closest {
                    None => closest = Some((idx, t)),
                    Some((_, best_t)) if t < best_t => closest = Some((idx, t)),
                    _ => {}
                }
            }
        }

        closest.map(|(idx, distance)| RayHit {
            object: self.objects[idx].uid.clone(),
            distance,
        })
    }
}
