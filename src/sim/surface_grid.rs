//! Shadow percentage from regular sample grids.
//!
//! A grid point is shadowed when its ray toward the sun hits an object other
//! than the one the grid lies on. Used for a single surface (e.g. a PV panel)
//! and for the tops of building bounding boxes.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::sim::occlusion::is_point_illuminated;
use crate::sim::records::ShadowDataPoint;
use crate::sim::scene::{Building, RayCaster};
use crate::sim::solar::SunState;
use crate::sim::task::Progress;
use crate::sim::timeseries::{StepEvaluator, StepOutput};
use crate::{BBox, Point, Transform, UID, Vector};

/// Parallelogram `origin + s * u + t * v` with `s, t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGrid {
    pub origin: Point,
    pub u: Vector,
    pub v: Vector,
}

impl SurfaceGrid {
    /// Rectangle `[0, width] x [0, height]` in the local XY plane, placed by
    /// `transform`. Matches `Mesh::from_rectangle(width, height)`.
    pub fn from_rectangle(width: f64, height: f64, transform: &Transform) -> Self {
        let origin = transform.transform_point(Point::new(0., 0., 0.));
        let px = transform.transform_point(Point::new(width, 0., 0.));
        let py = transform.transform_point(Point::new(0., height, 0.));
        Self {
            origin,
            u: px - origin,
            v: py - origin,
        }
    }

    /// Top face of a bounding box.
    pub fn from_bbox_top(bbox: &BBox) -> Self {
        Self {
            origin: Point::new(bbox.min.x, bbox.min.y, bbox.max.z),
            u: Vector::new(bbox.max.x - bbox.min.x, 0., 0.),
            v: Vector::new(0., bbox.max.y - bbox.min.y, 0.),
        }
    }

    /// Grid point `(i, j)` of a `resolution x resolution` grid spanning the
    /// whole parallelogram, edges included.
    pub fn point(&self, i: usize, j: usize, resolution: usize) -> Point {
        let d = resolution.saturating_sub(1).max(1) as f64;
        self.origin + self.u * (i as f64 / d) + self.v * (j as f64 / d)
    }

    /// All `resolution^2` grid points.
    pub fn points(&self, resolution: usize) -> impl Iterator<Item = Point> + '_ {
        (0..resolution).flat_map(move |i| (0..resolution).map(move |j| self.point(i, j, resolution)))
    }
}

fn check_resolution(resolution: usize) -> Result<()> {
    if resolution < 2 {
        return Err(Error::Configuration(format!(
            "grid resolution must be at least 2, got {}",
            resolution
        )));
    }
    Ok(())
}

fn is_shadowed(point: Point, owner: &UID, sun: &SunState, caster: &dyn RayCaster) -> bool {
    !sun.is_above_horizon() || !is_point_illuminated(point, sun.direction, owner, f64::INFINITY, caster)
}

/// `(shadowed, total)` grid points on the roof of `building`, or `None`
/// when the building has no geometry.
fn roof_counts(
    building: &Building,
    resolution: usize,
    sun: &SunState,
    caster: &dyn RayCaster,
) -> Option<(usize, usize)> {
    let bbox = building.world_bbox()?;
    let grid = SurfaceGrid::from_bbox_top(&bbox);
    let shadowed = grid
        .points(resolution)
        .filter(|p| is_shadowed(*p, &building.uid, sun, caster))
        .count();
    Some((shadowed, resolution * resolution))
}

/// Percentage of roof grid points that are shadowed by other buildings.
///
/// Buildings without geometry are skipped with a warning.
pub fn roof_grid_shadow_percentage(
    buildings: &[Building],
    resolution: usize,
    sun: &SunState,
    caster: &dyn RayCaster,
) -> Result<f64> {
    check_resolution(resolution)?;
    let mut shadowed = 0;
    let mut total = 0;
    for b in buildings {
        match roof_counts(b, resolution, sun, caster) {
            Some((s, t)) => {
                shadowed += s;
                total += t;
            }
            None => warn!("Building {} has no geometry, skipped", b.name),
        }
    }
    Ok(percentage(shadowed, total))
}

fn percentage(shadowed: usize, total: usize) -> f64 {
    if total > 0 {
        100. * shadowed as f64 / total as f64
    } else {
        0.
    }
}

/// Single-location mode: shadow percentage of one surface per step.
///
/// Work units are grid points.
pub struct SurfaceGridEvaluator<'a> {
    grid: SurfaceGrid,
    surface: UID,
    resolution: usize,
    caster: &'a dyn RayCaster,
    step: Option<(NaiveDateTime, SunState)>,
    next: usize,
    shadowed: usize,
}

impl<'a> SurfaceGridEvaluator<'a> {
    /// `surface` is the scene object the grid lies on; hits on it do not shadow.
    pub fn new(
        grid: SurfaceGrid,
        surface: UID,
        resolution: usize,
        caster: &'a dyn RayCaster,
    ) -> Result<Self> {
        check_resolution(resolution)?;
        Ok(Self {
            grid,
            surface,
            resolution,
            caster,
            step: None,
            next: 0,
            shadowed: 0,
        })
    }
}

impl StepEvaluator for SurfaceGridEvaluator<'_> {
    type Record = ShadowDataPoint;

    fn begin_step(&mut self, time: NaiveDateTime, sun: &SunState) {
        self.step = Some((time, *sun));
        self.next = 0;
        self.shadowed = 0;
    }

    fn resume(&mut self, budget: usize) -> Result<Progress<StepOutput<ShadowDataPoint>>> {
        let Some((time, sun)) = self.step else {
            return Err(Error::Configuration("no step started".to_string()));
        };
        let n = self.resolution;
        let total = n * n;
        let end = (self.next + budget).min(total);
        for k in self.next..end {
            let p = self.grid.point(k / n, k % n, n);
            if is_shadowed(p, &self.surface, &sun, self.caster) {
                self.shadowed += 1;
            }
        }
        self.next = end;
        if self.next < total {
            return Ok(Progress::Suspended);
        }

        let pct = percentage(self.shadowed, total);
        debug!("{}: {} of {} grid points shadowed", time, self.shadowed, total);
        self.step = None;
        Ok(Progress::Done(StepOutput {
            records: vec![ShadowDataPoint::new(time, pct)],
            percentage: pct,
        }))
    }
}

/// Roof-grid mode: shadow percentage over all building roofs per step.
///
/// Suspends after every building.
pub struct RoofGridEvaluator<'a> {
    buildings: &'a [Building],
    resolution: usize,
    caster: &'a dyn RayCaster,
    step: Option<(NaiveDateTime, SunState)>,
    next: usize,
    shadowed: usize,
    total: usize,
}

impl<'a> RoofGridEvaluator<'a> {
    pub fn new(buildings: &'a [Building], resolution: usize, caster: &'a dyn RayCaster) -> Result<Self> {
        check_resolution(resolution)?;
        Ok(Self {
            buildings,
            resolution,
            caster,
            step: None,
            next: 0,
            shadowed: 0,
            total: 0,
        })
    }
}

impl StepEvaluator for RoofGridEvaluator<'_> {
    type Record = ShadowDataPoint;

    fn begin_step(&mut self, time: NaiveDateTime, sun: &SunState) {
        self.step = Some((time, *sun));
        self.next = 0;
        self.shadowed = 0;
        self.total = 0;
    }

    fn resume(&mut self, _budget: usize) -> Result<Progress<StepOutput<ShadowDataPoint>>> {
        let Some((time, sun)) = self.step else {
            return Err(Error::Configuration("no step started".to_string()));
        };
        if let Some(b) = self.buildings.get(self.next) {
            match roof_counts(b, self.resolution, &sun, self.caster) {
                Some((s, t)) => {
                    self.shadowed += s;
                    self.total += t;
                }
                None => warn!("Building {} has no geometry, skipped", b.name),
            }
            self.next += 1;
            return Ok(Progress::Suspended);
        }

        let pct = percentage(self.shadowed, self.total);
        self.step = None;
        Ok(Progress::Done(StepOutput {
            records: vec![ShadowDataPoint::new(time, pct)],
            percentage: pct,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::Scene;
    use crate::Mesh;

    fn up() -> SunState {
        SunState::from_direction(Vector::new(0., 0., 1.)).unwrap()
    }

    fn block(name: &str, x: f64, y: f64, w: f64, h: f64) -> Building {
        Building::new(
            name,
            Mesh::from_box(w, w, h),
            Transform::from_translation(Vector::new(x, y, 0.)),
        )
    }

    fn noon() -> NaiveDateTime {
        crate::sim::timeseries::parse_timestamp("21/06/2025 12:00:00").unwrap()
    }

    #[test]
    fn test_grid_points_cover_corners() {
        let grid = SurfaceGrid::from_rectangle(
            4.,
            2.,
            &Transform::from_translation(Vector::new(1., 1., 0.)),
        );
        let pts: Vec<Point> = grid.points(3).collect();
        assert_eq!(pts.len(), 9);
        assert!(pts[0].is_close(&Point::new(1., 1., 0.)));
        assert!(pts[8].is_close(&Point::new(5., 3., 0.)));
        assert!(pts[4].is_close(&Point::new(3., 2., 0.)));
    }

    #[test]
    fn test_surface_half_shadowed() {
        // 2 x 2 panel, a canopy above covering x < 1
        let panel_tr = Transform::identity();
        let panel = Mesh::from_rectangle(2., 2.);
        let canopy = Building::new(
            "canopy",
            Mesh::from_box(1.4, 3., 0.2),
            Transform::from_translation(Vector::new(-0.5, -0.5, 3.)),
        );
        let mut scene = Scene::from_buildings(&[canopy]);
        let panel_uid = UID::new();
        scene.add_mesh(panel_uid.clone(), "panel", &panel, &panel_tr).unwrap();

        let grid = SurfaceGrid::from_rectangle(2., 2., &panel_tr);
        let mut eval = SurfaceGridEvaluator::new(grid, panel_uid, 10, &scene).unwrap();
        eval.begin_step(noon(), &up());
        let mut calls = 0;
        let out = loop {
            calls += 1;
            if let Progress::Done(out) = eval.resume(7).unwrap() {
                break out;
            }
        };
        assert_eq!(calls, 15);
        // Columns at x = 0, 2/9, 4/9, 6/9, 8/9 lie under the canopy (x < 0.9)
        assert!((out.percentage - 50.).abs() < 1e-9);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].label, "6/21 hour:12");
    }

    #[test]
    fn test_surface_at_night_is_shadowed() {
        let scene = Scene::new();
        let grid = SurfaceGrid::from_rectangle(1., 1., &Transform::identity());
        let mut eval = SurfaceGridEvaluator::new(grid, UID::new(), 2, &scene).unwrap();
        let below = SunState::from_direction(Vector::new(0., 1., -1.)).unwrap();
        eval.begin_step(noon(), &below);
        let Progress::Done(out) = eval.resume(100).unwrap() else {
            panic!("4 points fit in one slice");
        };
        assert_eq!(out.percentage, 100.);
    }

    #[test]
    fn test_resolution_must_be_at_least_two() {
        let scene = Scene::new();
        let grid = SurfaceGrid::from_rectangle(1., 1., &Transform::identity());
        assert!(matches!(
            SurfaceGridEvaluator::new(grid, UID::new(), 1, &scene),
            Err(Error::Configuration(_))
        ));
        assert!(roof_grid_shadow_percentage(&[], 0, &up(), &scene).is_err());
    }

    #[test]
    fn test_roof_grid() {
        // A slab hovering over the first roof, the second roof is free
        let low = block("low", 0., 0., 10., 5.);
        let free = block("free", 50., 0., 10., 5.);
        let slab = Building {
            transform: Transform::from_translation(Vector::new(-1., -1., 20.)),
            ..block("slab", 0., 0., 12., 1.)
        };
        let ghost = Building::without_mesh("ghost", Transform::identity());
        let buildings = vec![low.clone(), free.clone(), ghost];
        let scene = Scene::from_buildings(&[low, free, slab]);

        let pct = roof_grid_shadow_percentage(&buildings, 3, &up(), &scene).unwrap();
        assert!((pct - 50.).abs() < 1e-9);

        let mut eval = RoofGridEvaluator::new(&buildings, 3, &scene).unwrap();
        eval.begin_step(noon(), &up());
        let mut calls = 0;
        let out = loop {
            calls += 1;
            if let Progress::Done(out) = eval.resume(1).unwrap() {
                break out;
            }
        };
        assert_eq!(calls, 4);
        assert!((out.percentage - pct).abs() < 1e-12);
    }
}
