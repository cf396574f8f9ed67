pub mod error;
pub mod geom;
pub mod io;
pub mod sim;
mod uid;

// Prelude
pub use error::{Error, Result};
pub use geom::bboxes::BBox;
pub use geom::mesh::Mesh;
pub use geom::point::Point;
pub use geom::polygon2d::Point2;
pub use geom::transform::Transform;
pub use geom::triangles::{TriangleIndex, WorldTriangle};
pub use geom::vector::Vector;
pub use sim::config::ExposureConfig;
pub use sim::scene::{Building, RayCaster, RayHit, Scene};
pub use sim::solar::{FixedSun, SolarSite, SunDirectionProvider, SunState};
pub use sim::spatial::{MapBounds, PlanningArea};
pub use sim::task::{CancelToken, Progress, ResumableTask, run_to_completion};
pub use sim::timeseries::{RunRequest, RunSummary, StepUnit, TimeSeriesDriver};
pub use uid::UID;
