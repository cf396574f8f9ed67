//! File I/O for exposure runs.
//!
//! Scenes are read from JSON; results are written as `;`-separated tables.

pub mod csv;
pub mod scene;

pub use csv::{write_coverage, ExposureCsvWriter};
pub use scene::{load_config, load_scene, parse_scene, LoadedScene};
