use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::spatial::MapBounds;

/// Occlusion policy used for building triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Single ray from the triangle centroid.
    Centroid,
    /// Area-proportional barycentric sampling.
    MonteCarlo,
}

/// Configuration for an exposure run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Occlusion policy for planning-area runs.
    pub policy: PolicyKind,
    /// Samples for a triangle of `area_reference` size.
    pub base_samples: usize,
    /// Reference area for `base_samples`.
    pub area_reference: f64,
    /// Lower bound of samples per triangle.
    pub min_samples: usize,
    /// Upper bound of samples per triangle.
    pub max_samples: usize,
    /// Distance a sample point is lifted off its triangle along the normal.
    pub normal_offset: f64,
    /// Hits on the own building closer than this do not occlude.
    pub min_self_hit_distance: f64,
    /// Triangles processed per resume call.
    pub chunk_size: usize,
    /// Grid points per side on a single surface.
    pub grid_resolution: usize,
    /// Grid points per side on each building roof.
    pub roof_grid_resolution: usize,
    /// Seed for the sampling RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Extent of the 3D map. Areas outside it get zero records.
    pub map_bounds: Option<MapBounds>,
}

impl ExposureConfig {
    pub fn new() -> Self {
        Self {
            policy: PolicyKind::MonteCarlo,
            base_samples: 10,
            area_reference: 1.0,
            min_samples: 10,
            max_samples: 100,
            normal_offset: 0.01,
            min_self_hit_distance: 0.02,
            chunk_size: 500,
            grid_resolution: 10,
            roof_grid_resolution: 3,
            seed: None,
            map_bounds: None,
        }
    }

    /// Checks settings before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.min_samples == 0 {
            return Err(Error::Configuration(
                "min_samples must be at least 1".to_string(),
            ));
        }
        if self.max_samples < self.min_samples {
            return Err(Error::Configuration(format!(
                "max_samples ({}) is smaller than min_samples ({})",
                self.max_samples, self.min_samples
            )));
        }
        if !(self.area_reference.is_finite() && self.area_reference > 0.) {
            return Err(Error::Configuration(
                "area_reference must be positive".to_string(),
            ));
        }
        if !(self.normal_offset.is_finite() && self.normal_offset >= 0.) {
            return Err(Error::Configuration(
                "normal_offset must be non-negative".to_string(),
            ));
        }
        if self.min_self_hit_distance.is_nan() || self.min_self_hit_distance < 0. {
            return Err(Error::Configuration(
                "min_self_hit_distance must be non-negative".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::Configuration(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.grid_resolution < 2 || self.roof_grid_resolution < 2 {
            return Err(Error::Configuration(
                "grid resolutions must be at least 2".to_string(),
            ));
        }
        if let Some(map) = &self.map_bounds {
            if map.min.x > map.max.x || map.min.y > map.max.y {
                return Err(Error::Configuration(
                    "map_bounds min corner exceeds max corner".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| Error::InputParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point2;

    #[test]
    fn test_config_defaults() {
        let config = ExposureConfig::new();
        assert_eq!(config.policy, PolicyKind::MonteCarlo);
        assert_eq!(config.base_samples, 10);
        assert_eq!(config.max_samples, 100);
        assert_eq!(config.chunk_size, 500);
        assert!((config.normal_offset - 0.01).abs() < 1e-12);
        assert!((config.min_self_hit_distance - 0.02).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ExposureConfig::from_json(r#"{"policy": "centroid", "seed": 5, "chunk_size": 50}"#)
                .unwrap();
        assert_eq!(config.policy, PolicyKind::Centroid);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.min_samples, 10);
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = ExposureConfig::new();
        config.min_samples = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = ExposureConfig::new();
        config.max_samples = 5;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = ExposureConfig::new();
        config.grid_resolution = 1;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = ExposureConfig::new();
        config.map_bounds = Some(MapBounds::new(Point2::new(1., 0.), Point2::new(0., 1.)));
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ExposureConfig::from_json("{\"chunk_size\": \"many\"}"),
            Err(Error::InputParse(_))
        ));
        assert!(matches!(
            ExposureConfig::from_json("{\"chunk_size\": 0}"),
            Err(Error::Configuration(_))
        ));
    }
}
