//! JSON scene description.
//!
//! A scene file lists buildings and planning areas as meshes with transforms,
//! the geographic site, the run request and optionally a single surface for
//! the shadow time series:
//!
//! ```json
//! {
//!   "site": { "latitude": 52.52, "longitude": 13.405, "timezone": 1.0 },
//!   "run": { "start": "21/06/2025 06:00:00", "end": "21/06/2025 20:00:00",
//!            "step": 60, "unit": "Minutes" },
//!   "buildings": [
//!     { "name": "b1",
//!       "mesh": { "vertices": [[0,0,0],[1,0,0],[1,1,0]], "triangles": [[0,1,2]] },
//!       "transform": { "translation": [10, 0, 0] } }
//!   ],
//!   "planning_areas": [],
//!   "surface": { "name": "panel", "width": 2.0, "height": 1.0 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::sim::config::ExposureConfig;
use crate::sim::scene::Building;
use crate::sim::solar::SolarSite;
use crate::sim::spatial::PlanningArea;
use crate::sim::timeseries::RunRequest;
use crate::{Mesh, Transform, Vector};

fn unit_scale() -> Vector {
    Vector::new(1., 1., 1.)
}

fn zero() -> Vector {
    Vector::new(0., 0., 0.)
}

/// Rotation about `axis` by `angle_deg` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationDesc {
    pub axis: Vector,
    pub angle_deg: f64,
}

/// Placement of an entity. `matrix` (row-major) overrides the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDesc {
    #[serde(default = "zero")]
    pub translation: Vector,
    #[serde(default)]
    pub rotation: Option<RotationDesc>,
    #[serde(default = "unit_scale")]
    pub scale: Vector,
    #[serde(default)]
    pub matrix: Option<[[f64; 4]; 4]>,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: zero(),
            rotation: None,
            scale: unit_scale(),
            matrix: None,
        }
    }
}

impl TransformDesc {
    pub fn to_transform(&self) -> Transform {
        match self.matrix {
            Some(m) => Transform::from_matrix(m),
            None => Transform::from_trs(
                self.translation,
                self.rotation.map(|r| (r.axis, r.angle_deg.to_radians())),
                self.scale,
            ),
        }
    }
}

/// Step value, given either as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepValue {
    Number(i64),
    Text(String),
}

impl StepValue {
    fn to_text(&self) -> String {
        match self {
            StepValue::Number(n) => n.to_string(),
            StepValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDesc {
    pub start: String,
    pub end: String,
    pub step: StepValue,
    pub unit: String,
}

/// A named mesh with its placement. `mesh` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDesc {
    pub name: String,
    #[serde(default)]
    pub mesh: Option<Mesh>,
    #[serde(default)]
    pub transform: TransformDesc,
}

/// Rectangle `[0, width] x [0, height]` in its local XY plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDesc {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub transform: TransformDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub site: SolarSite,
    pub run: RunDesc,
    #[serde(default)]
    pub buildings: Vec<EntityDesc>,
    #[serde(default)]
    pub planning_areas: Vec<EntityDesc>,
    #[serde(default)]
    pub surface: Option<SurfaceDesc>,
}

/// Single surface of the shadow time series.
#[derive(Debug, Clone)]
pub struct Surface {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub transform: Transform,
}

impl Surface {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Scene converted to domain types.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub site: SolarSite,
    pub request: RunRequest,
    pub buildings: Vec<Building>,
    pub areas: Vec<PlanningArea>,
    pub surface: Option<Surface>,
}

/// Parses a scene from JSON text.
///
/// Buildings without a mesh are kept (they still count toward their area).
/// Planning areas without usable geometry are skipped with a warning.
pub fn parse_scene(text: &str) -> Result<LoadedScene> {
    let file: SceneFile =
        serde_json::from_str(text).map_err(|e| Error::InputParse(e.to_string()))?;

    let request = RunRequest::parse(
        &file.run.start,
        &file.run.end,
        &file.run.step.to_text(),
        &file.run.unit,
    )?;

    let buildings: Vec<Building> = file
        .buildings
        .into_iter()
        .map(|e| {
            let transform = e.transform.to_transform();
            match e.mesh {
                Some(mesh) => Building::new(&e.name, mesh, transform),
                None => Building::without_mesh(&e.name, transform),
            }
        })
        .collect();

    let mut areas = Vec::with_capacity(file.planning_areas.len());
    for e in &file.planning_areas {
        let area = e
            .mesh
            .as_ref()
            .ok_or_else(|| Error::MissingGeometry {
                entity: e.name.clone(),
            })
            .and_then(|mesh| PlanningArea::from_mesh(&e.name, mesh, &e.transform.to_transform()));
        match area {
            Ok(a) => areas.push(a),
            Err(err) => warn!("Skipping planning area: {}", err),
        }
    }

    let surface = file.surface.map(|s| Surface {
        transform: s.transform.to_transform(),
        name: s.name,
        width: s.width,
        height: s.height,
    });

    info!(
        "Scene: {} buildings, {} planning areas",
        buildings.len(),
        areas.len()
    );
    Ok(LoadedScene {
        site: file.site,
        request,
        buildings,
        areas,
        surface,
    })
}

/// Reads a scene file.
///
/// # Example
/// ```no_run
/// use exposure3d::io::load_scene;
/// use std::path::Path;
///
/// let scene = load_scene(Path::new("scene.json")).unwrap();
/// println!("{} buildings", scene.buildings.len());
/// ```
pub fn load_scene(path: &Path) -> Result<LoadedScene> {
    let text = fs::read_to_string(path)?;
    parse_scene(&text)
}

/// Reads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<ExposureConfig> {
    let text = fs::read_to_string(path)?;
    ExposureConfig::from_json(&text)
}
