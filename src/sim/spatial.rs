//! Planning areas and the filters that select buildings and triangles.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geom::polygon2d::{bounding_rect, is_point_in_polygon, sort_by_angle};
use crate::sim::scene::Building;
use crate::{Mesh, Point2, Transform, WorldTriangle};

/// A named polygon in the horizontal plane with a height threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningArea {
    pub name: String,
    /// Boundary in traversal order.
    pub polygon: Vec<Point2>,
    /// Highest world Z of the area geometry.
    pub max_height: f64,
}

impl PlanningArea {
    pub fn new(name: &str, polygon: Vec<Point2>, max_height: f64) -> Self {
        Self {
            name: name.to_string(),
            polygon,
            max_height,
        }
    }

    /// Derives the area from a mesh placed in the world.
    ///
    /// World vertices are projected to the horizontal plane and sorted by
    /// angle around their centroid, since mesh vertex order does not trace
    /// the outline.
    pub fn from_mesh(name: &str, mesh: &Mesh, transform: &Transform) -> Result<Self> {
        let world = mesh.world_vertices(transform);
        if world.len() < 3 {
            return Err(Error::MissingGeometry {
                entity: name.to_string(),
            });
        }
        let max_height = world
            .iter()
            .map(|p| p.z)
            .fold(f64::NEG_INFINITY, f64::max);
        let polygon = sort_by_angle(world.into_iter().map(Point2::from_point).collect());
        debug!("{} polygon has {} points", name, polygon.len());
        Ok(Self::new(name, polygon, max_height))
    }

    pub fn contains(&self, p: Point2) -> bool {
        is_point_in_polygon(p, &self.polygon)
    }

    /// `(min, max)` corners of the polygon.
    pub fn bounding_rect(&self) -> Option<(Point2, Point2)> {
        bounding_rect(&self.polygon)
    }

    pub fn triangle_filter(&self) -> TriangleFilter<'_> {
        TriangleFilter { area: self }
    }
}

/// Buildings whose representative point lies inside `area`.
pub fn filter_buildings_in_area<'a>(
    buildings: &'a [Building],
    area: &PlanningArea,
) -> Vec<&'a Building> {
    buildings
        .iter()
        .filter(|b| area.contains(b.center()))
        .collect()
}

/// Assigns every building to the first area containing its representative
/// point. Returns building indices per area, in the order of `areas`.
///
/// A building belongs to at most one area; buildings outside all areas are
/// left out.
pub fn assign_buildings(buildings: &[Building], areas: &[PlanningArea]) -> Vec<Vec<usize>> {
    let mut assigned = vec![Vec::new(); areas.len()];
    for (bi, b) in buildings.iter().enumerate() {
        let c = b.center();
        if let Some(ai) = areas.iter().position(|a| a.contains(c)) {
            assigned[ai].push(bi);
        }
    }
    assigned
}

/// Accepts roof triangles of an area: centroid inside the polygon and
/// strictly above the area's maximum height.
#[derive(Debug, Clone, Copy)]
pub struct TriangleFilter<'a> {
    area: &'a PlanningArea,
}

impl TriangleFilter<'_> {
    pub fn accepts(&self, triangle: &WorldTriangle) -> bool {
        let c = triangle.centroid();
        c.z > self.area.max_height && self.area.contains(Point2::from_point(c))
    }
}

/// Rectangular extent of the 3D map in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub min: Point2,
    pub max: Point2,
}

impl MapBounds {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// The area's bounding rectangle touches the map.
    pub fn overlaps(&self, area: &PlanningArea) -> bool {
        match area.bounding_rect() {
            Some((lo, hi)) => {
                !(hi.x < self.min.x || lo.x > self.max.x || hi.y < self.min.y || lo.y > self.max.y)
            }
            None => false,
        }
    }

    /// Every polygon point lies on the map. An empty polygon is not on the map.
    pub fn contains_polygon(&self, area: &PlanningArea) -> bool {
        !area.polygon.is_empty()
            && area.polygon.iter().all(|p| {
                p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, Vector};

    fn square_area(name: &str, x0: f64, y0: f64, size: f64) -> PlanningArea {
        PlanningArea::new(
            name,
            vec![
                Point2::new(x0, y0),
                Point2::new(x0 + size, y0),
                Point2::new(x0 + size, y0 + size),
                Point2::new(x0, y0 + size),
            ],
            0.,
        )
    }

    fn box_at(name: &str, x: f64, y: f64) -> Building {
        Building::new(
            name,
            Mesh::from_box(2., 2., 5.),
            Transform::from_translation(Vector::new(x, y, 0.)),
        )
    }

    #[test]
    fn test_from_mesh_sorts_and_records_height() {
        // Ground plate lifted to z = 1.5
        let mesh = Mesh::from_rectangle(10., 10.);
        let tr = Transform::from_translation(Vector::new(100., 200., 1.5));
        let area = PlanningArea::from_mesh("PLR 01", &mesh, &tr).unwrap();
        assert_eq!(area.polygon.len(), 4);
        assert_eq!(area.max_height, 1.5);
        assert!(area.contains(Point2::new(105., 205.)));
        assert!(!area.contains(Point2::new(95., 205.)));
    }

    #[test]
    fn test_from_mesh_without_vertices() {
        let mesh = Mesh::new(vec![], vec![]).unwrap();
        assert!(matches!(
            PlanningArea::from_mesh("empty", &mesh, &Transform::identity()),
            Err(Error::MissingGeometry { .. })
        ));
    }

    #[test]
    fn test_filter_buildings_in_area() {
        let area = square_area("a", 0., 0., 10.);
        let buildings = vec![box_at("in", 2., 2.), box_at("out", 20., 2.)];
        let inside = filter_buildings_in_area(&buildings, &area);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].name, "in");
    }

    #[test]
    fn test_assign_buildings_at_most_once() {
        // Overlapping areas: the building centre (3, 3) is inside both
        let areas = vec![square_area("a", 0., 0., 10.), square_area("b", 0., 0., 20.)];
        let buildings = vec![box_at("shared", 2., 2.), box_at("b only", 14., 2.), box_at("none", 50., 50.)];
        let assigned = assign_buildings(&buildings, &areas);
        assert_eq!(assigned, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_triangle_filter() {
        let mut area = square_area("a", 0., 0., 10.);
        area.max_height = 2.;
        let filter = area.triangle_filter();
        let tri_at = |x: f64, y: f64, z: f64| {
            WorldTriangle::new(
                Point::new(x, y, z),
                Point::new(x + 1., y, z),
                Point::new(x, y + 1., z),
            )
        };
        assert!(filter.accepts(&tri_at(1., 1., 5.)));
        // At the threshold height is rejected
        assert!(!filter.accepts(&tri_at(1., 1., 2.)));
        assert!(!filter.accepts(&tri_at(1., 1., 0.)));
        // Outside the polygon
        assert!(!filter.accepts(&tri_at(12., 1., 5.)));
    }

    #[test]
    fn test_map_bounds() {
        let map = MapBounds::new(Point2::new(0., 0.), Point2::new(100., 100.));
        let inside = square_area("in", 10., 10., 10.);
        let partial = square_area("partial", 95., 10., 10.);
        let outside = square_area("out", 200., 10., 10.);

        assert!(map.overlaps(&inside) && map.contains_polygon(&inside));
        assert!(map.overlaps(&partial) && !map.contains_polygon(&partial));
        assert!(!map.overlaps(&outside) && !map.contains_polygon(&outside));

        let empty = PlanningArea::new("empty", vec![], 0.);
        assert!(!map.overlaps(&empty) && !map.contains_polygon(&empty));
    }
}
