//! Exposure of building surfaces grouped by planning area.
//!
//! In planning-area mode every building is assigned to at most one area and
//! only its roof triangles (above the area height, inside the polygon) are
//! counted. In whole-scene mode all triangles of all buildings form a single
//! group.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geom::triangles::Triangles;
use crate::sim::exposure::{accumulate_chunk, AreaTally};
use crate::sim::occlusion::OcclusionPolicy;
use crate::sim::records::ExposureRecord;
use crate::sim::scene::{Building, RayCaster};
use crate::sim::solar::SunState;
use crate::sim::spatial::{assign_buildings, MapBounds, PlanningArea};
use crate::sim::task::Progress;
use crate::sim::timeseries::{StepEvaluator, StepOutput};

/// Record name used in whole-scene mode.
pub const WHOLE_SCENE: &str = "all buildings";

#[derive(Debug)]
struct AreaGroup<'a> {
    name: String,
    /// Triangle filter source. `None` counts every triangle.
    area: Option<&'a PlanningArea>,
    buildings: Vec<&'a Building>,
    on_map: bool,
}

/// Step evaluator producing one [`ExposureRecord`] per group.
///
/// The step percentage is the area-weighted exposure over all groups.
/// Suspends after every chunk of triangles, every building and every group.
/// A chunk takes at most `budget` triangles from the mesh, whether or not the
/// roof filter accepts them.
pub struct AreaExposureEvaluator<'a> {
    groups: Vec<AreaGroup<'a>>,
    caster: &'a dyn RayCaster,
    policy: Box<dyn OcclusionPolicy + 'a>,
    step: Option<(NaiveDateTime, SunState)>,
    group_idx: usize,
    building_idx: usize,
    triangles: Option<Triangles<'a>>,
    building_tally: AreaTally,
    area_tally: AreaTally,
    step_tally: AreaTally,
    records: Vec<ExposureRecord>,
}

impl<'a> AreaExposureEvaluator<'a> {
    /// Planning-area mode. Areas whose bounding rectangle misses `map` are
    /// reported as zero records without being processed.
    pub fn for_planning_areas(
        buildings: &'a [Building],
        areas: &'a [PlanningArea],
        map: Option<&MapBounds>,
        caster: &'a dyn RayCaster,
        policy: Box<dyn OcclusionPolicy + 'a>,
    ) -> Self {
        let assigned = assign_buildings(buildings, areas);
        let groups = areas
            .iter()
            .zip(assigned)
            .map(|(area, idx)| {
                let on_map = map.map_or(true, |m| m.overlaps(area));
                info!(
                    "Planning area {} contains {} buildings",
                    area.name,
                    idx.len()
                );
                AreaGroup {
                    name: area.name.clone(),
                    area: Some(area),
                    buildings: idx.into_iter().map(|i| &buildings[i]).collect(),
                    on_map,
                }
            })
            .collect();
        Self::with_groups(groups, caster, policy)
    }

    /// Whole-scene mode: every triangle of every building, one record per step.
    pub fn for_whole_scene(
        buildings: &'a [Building],
        caster: &'a dyn RayCaster,
        policy: Box<dyn OcclusionPolicy + 'a>,
    ) -> Self {
        let group = AreaGroup {
            name: WHOLE_SCENE.to_string(),
            area: None,
            buildings: buildings.iter().collect(),
            on_map: true,
        };
        Self::with_groups(vec![group], caster, policy)
    }

    fn with_groups(
        groups: Vec<AreaGroup<'a>>,
        caster: &'a dyn RayCaster,
        policy: Box<dyn OcclusionPolicy + 'a>,
    ) -> Self {
        Self {
            groups,
            caster,
            policy,
            step: None,
            group_idx: 0,
            building_idx: 0,
            triangles: None,
            building_tally: AreaTally::new(),
            area_tally: AreaTally::new(),
            step_tally: AreaTally::new(),
            records: Vec::new(),
        }
    }

    fn next_group(&mut self) {
        self.group_idx += 1;
        self.building_idx = 0;
        self.area_tally = AreaTally::new();
    }
}

impl StepEvaluator for AreaExposureEvaluator<'_> {
    type Record = ExposureRecord;

    fn begin_step(&mut self, time: NaiveDateTime, sun: &SunState) {
        self.step = Some((time, *sun));
        self.group_idx = 0;
        self.building_idx = 0;
        self.triangles = None;
        self.building_tally = AreaTally::new();
        self.area_tally = AreaTally::new();
        self.step_tally = AreaTally::new();
        self.records.clear();
    }

    fn resume(&mut self, budget: usize) -> Result<Progress<StepOutput<ExposureRecord>>> {
        let Some((time, sun)) = self.step else {
            return Err(Error::Configuration("no step started".to_string()));
        };

        loop {
            let Some(group) = self.groups.get(self.group_idx) else {
                self.step = None;
                return Ok(Progress::Done(StepOutput {
                    records: std::mem::take(&mut self.records),
                    percentage: self.step_tally.percentage(),
                }));
            };

            if !group.on_map {
                info!("Planning area {} lies outside the map", group.name);
                self.records.push(ExposureRecord::empty(&group.name, time));
                self.next_group();
                return Ok(Progress::Suspended);
            }

            let Some(building) = group.buildings.get(self.building_idx).copied() else {
                let tally = self.area_tally;
                info!(
                    "{}: exposure {:.2}% over {:.2} m2",
                    group.name,
                    tally.percentage(),
                    tally.total_area
                );
                self.records.push(ExposureRecord {
                    area: group.name.clone(),
                    timestamp: time,
                    exposure_percentage: tally.percentage(),
                    building_count: group.buildings.len(),
                    total_area: tally.total_area,
                });
                self.step_tally += tally;
                self.next_group();
                return Ok(Progress::Suspended);
            };

            if self.triangles.is_none() {
                match building.mesh() {
                    Ok(mesh) => self.triangles = Some(mesh.world_triangles(&building.transform)),
                    Err(e) => {
                        warn!("Skipping building: {}", e);
                        self.building_idx += 1;
                        continue;
                    }
                }
            }
            let Some(triangles) = self.triangles.as_mut() else {
                continue;
            };

            let policy = self.policy.as_mut();
            let chunk = match group.area {
                Some(area) => {
                    // Rejected triangles are charged against the budget too.
                    let filter = area.triangle_filter();
                    let mut pulled = 0;
                    let mut roof = triangles
                        .by_ref()
                        .take(budget)
                        .inspect(|_| pulled += 1)
                        .filter(|t| filter.accepts(t));
                    let mut chunk =
                        accumulate_chunk(&mut roof, budget, policy, &building.uid, &sun, self.caster);
                    drop(roof);
                    chunk.exhausted = pulled < budget;
                    chunk
                }
                None => accumulate_chunk(triangles, budget, policy, &building.uid, &sun, self.caster),
            };
            self.building_tally += chunk.tally;

            if chunk.exhausted {
                debug!(
                    "Building {}: total {:.2}, lit {:.2}",
                    building.name, self.building_tally.total_area, self.building_tally.lit_area
                );
                self.area_tally += self.building_tally;
                self.building_tally = AreaTally::new();
                self.triangles = None;
                self.building_idx += 1;
            }
            return Ok(Progress::Suspended);
        }
    }
}
