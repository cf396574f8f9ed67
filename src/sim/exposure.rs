//! Additive lit/total area accounting.
//!
//! Tallies are plain values: they can be computed per chunk, per building or
//! per area and summed in any order.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::sim::occlusion::OcclusionPolicy;
use crate::sim::scene::RayCaster;
use crate::sim::solar::SunState;
use crate::{UID, WorldTriangle};

/// Total and lit surface area. Invariant: `0 <= lit_area <= total_area`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaTally {
    pub total_area: f64,
    pub lit_area: f64,
}

impl AreaTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface of `area` of which `lit_fraction` is lit.
    pub fn add_surface(&mut self, area: f64, lit_fraction: f64) {
        let area = area.max(0.);
        self.total_area += area;
        self.lit_area += area * lit_fraction.clamp(0., 1.);
    }

    pub fn merge(&mut self, other: &AreaTally) {
        self.total_area += other.total_area;
        self.lit_area += other.lit_area;
    }

    /// `100 * lit / total`, or 0 when nothing was counted.
    pub fn percentage(&self) -> f64 {
        if self.total_area > 0. {
            100. * self.lit_area / self.total_area
        } else {
            0.
        }
    }
}

impl Add for AreaTally {
    type Output = AreaTally;

    fn add(mut self, other: AreaTally) -> AreaTally {
        self.merge(&other);
        self
    }
}

impl AddAssign for AreaTally {
    fn add_assign(&mut self, other: AreaTally) {
        self.merge(&other);
    }
}

impl Sum for AreaTally {
    fn sum<I: Iterator<Item = AreaTally>>(iter: I) -> Self {
        iter.fold(AreaTally::new(), |acc, t| acc + t)
    }
}

/// Lit fraction of a triangle. Nothing is lit while the sun is below the horizon.
pub fn lit_fraction(
    triangle: &WorldTriangle,
    policy: &mut dyn OcclusionPolicy,
    owner: &UID,
    sun: &SunState,
    caster: &dyn RayCaster,
) -> f64 {
    if !sun.is_above_horizon() {
        return 0.;
    }
    policy.lit_fraction(triangle, owner, sun, caster)
}

/// Tallies all `triangles` of the object `owner`.
pub fn accumulate<I>(
    triangles: I,
    policy: &mut dyn OcclusionPolicy,
    owner: &UID,
    sun: &SunState,
    caster: &dyn RayCaster,
) -> AreaTally
where
    I: IntoIterator<Item = WorldTriangle>,
{
    let mut tally = AreaTally::new();
    for tri in triangles {
        let f = lit_fraction(&tri, policy, owner, sun, caster);
        tally.add_surface(tri.area(), f);
    }
    tally
}

/// Result of one bounded pass over a triangle iterator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk {
    pub tally: AreaTally,
    /// Triangles taken from the iterator.
    pub processed: usize,
    /// The iterator returned `None` during this pass.
    pub exhausted: bool,
}

/// Tallies at most `budget` triangles taken from `triangles`.
///
/// Calling this repeatedly until `exhausted` gives the same total as
/// [`accumulate`] over the whole sequence.
pub fn accumulate_chunk<I>(
    triangles: &mut I,
    budget: usize,
    policy: &mut dyn OcclusionPolicy,
    owner: &UID,
    sun: &SunState,
    caster: &dyn RayCaster,
) -> Chunk
where
    I: Iterator<Item = WorldTriangle>,
{
    let mut tally = AreaTally::new();
    let mut processed = 0;
    while processed < budget {
        let Some(tri) = triangles.next() else {
            return Chunk {
                tally,
                processed,
                exhausted: true,
            };
        };
        let f = lit_fraction(&tri, policy, owner, sun, caster);
        tally.add_surface(tri.area(), f);
        processed += 1;
    }
    Chunk {
        tally,
        processed,
        exhausted: false,
    }
}
