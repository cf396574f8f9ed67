pub mod area_exposure;
pub mod config;
pub mod exposure;
pub mod occlusion;
pub mod records;
pub mod scene;
pub mod solar;
pub mod spatial;
pub mod surface_grid;
pub mod task;
pub mod timeseries;
