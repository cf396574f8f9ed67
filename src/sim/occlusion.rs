//! Lit/shadowed classification of points and triangles.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::sim::config::{ExposureConfig, PolicyKind};
use crate::sim::scene::RayCaster;
use crate::sim::solar::SunState;
use crate::{Point, UID, Vector, WorldTriangle};

/// Checks whether `point` sees the sun along `direction`.
///
/// The point is illuminated when the ray hits nothing, or when it hits
/// `owner` closer than `max_self_hit`. Any other hit occludes the point.
pub fn is_point_illuminated(
    point: Point,
    direction: Vector,
    owner: &UID,
    max_self_hit: f64,
    caster: &dyn RayCaster,
) -> bool {
    match caster.cast(point, direction) {
        None => true,
        Some(hit) => hit.object == *owner && hit.distance < max_self_hit,
    }
}

/// Strategy for the lit fraction of a single triangle.
pub trait OcclusionPolicy {
    /// Fraction of the triangle that is lit, in `[0, 1]`.
    fn lit_fraction(
        &mut self,
        triangle: &WorldTriangle,
        owner: &UID,
        sun: &SunState,
        caster: &dyn RayCaster,
    ) -> f64;
}

/// Single ray from the centroid.
///
/// A triangle facing away from the sun is unlit and no ray is cast. Hits on
/// the owning object never occlude.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidPolicy;

impl OcclusionPolicy for CentroidPolicy {
    fn lit_fraction(
        &mut self,
        triangle: &WorldTriangle,
        owner: &UID,
        sun: &SunState,
        caster: &dyn RayCaster,
    ) -> f64 {
        let Some(normal) = triangle.normal() else {
            return 0.;
        };
        if normal.dot(&sun.direction) <= 0. {
            return 0.;
        }
        if is_point_illuminated(
            triangle.centroid(),
            sun.direction,
            owner,
            f64::INFINITY,
            caster,
        ) {
            1.
        } else {
            0.
        }
    }
}

/// Monte-Carlo sampling of uniformly distributed points on the triangle.
///
/// The number of samples grows with the triangle area. Every sample point is
/// lifted off the surface along the normal before casting. A hit on the owning
/// object counts as lit only below `min_self_hit_distance`.
#[derive(Debug, Clone)]
pub struct MonteCarloPolicy {
    base_samples: usize,
    area_reference: f64,
    min_samples: usize,
    max_samples: usize,
    normal_offset: f64,
    min_self_hit_distance: f64,
    rng: StdRng,
}

impl MonteCarloPolicy {
    /// Policy with sampling parameters taken from `config`.
    ///
    /// The configuration is validated first. A configured seed makes runs
    /// reproducible.
    pub fn new(config: &ExposureConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            base_samples: config.base_samples,
            area_reference: config.area_reference,
            min_samples: config.min_samples,
            max_samples: config.max_samples,
            normal_offset: config.normal_offset,
            min_self_hit_distance: config.min_self_hit_distance,
            rng,
        })
    }

    /// `clamp(round(base_samples * area / area_reference), min_samples, max_samples)`
    pub fn sample_count(&self, area: f64) -> usize {
        let n = (self.base_samples as f64 * area / self.area_reference).round();
        let n = if n.is_finite() && n > 0. { n as usize } else { 0 };
        n.clamp(self.min_samples, self.max_samples.max(self.min_samples))
    }

    /// Lit fraction estimated from exactly `samples` rays.
    pub fn sample_fraction(
        &mut self,
        triangle: &WorldTriangle,
        owner: &UID,
        sun: &SunState,
        caster: &dyn RayCaster,
        samples: usize,
    ) -> f64 {
        if samples == 0 {
            return 0.;
        }
        let offset = triangle
            .normal()
            .map(|n| n * self.normal_offset)
            .unwrap_or(Vector::new(0., 0., 0.));

        let mut lit = 0;
        for _ in 0..samples {
            let r1: f64 = self.rng.gen();
            let r2: f64 = self.rng.gen();
            let p = triangle.barycentric_point(r1, r2) + offset;
            if is_point_illuminated(p, sun.direction, owner, self.min_self_hit_distance, caster) {
                lit += 1;
            }
        }
        lit as f64 / samples as f64
    }
}

impl OcclusionPolicy for MonteCarloPolicy {
    fn lit_fraction(
        &mut self,
        triangle: &WorldTriangle,
        owner: &UID,
        sun: &SunState,
        caster: &dyn RayCaster,
    ) -> f64 {
        let samples = self.sample_count(triangle.area());
        self.sample_fraction(triangle, owner, sun, caster, samples)
    }
}

/// Policy selected by `config.policy`. Fails on an invalid configuration.
pub fn policy_from_config(config: &ExposureConfig) -> Result<Box<dyn OcclusionPolicy>> {
    config.validate()?;
    Ok(match config.policy {
        PolicyKind::Centroid => Box::new(CentroidPolicy),
        PolicyKind::MonteCarlo => Box::new(MonteCarloPolicy::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::{Building, Scene};
    use crate::{Mesh, Transform};

    fn up_triangle() -> WorldTriangle {
        WorldTriangle::new(
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(0., 1., 0.),
        )
    }

    fn sun_up() -> SunState {
        SunState::from_direction(Vector::new(0., 0., 1.)).unwrap()
    }

    fn seeded(seed: u64) -> MonteCarloPolicy {
        let mut config = ExposureConfig::new();
        config.seed = Some(seed);
        MonteCarloPolicy::new(&config).unwrap()
    }

    /// Roof slab 10 m above the origin, covering `[-5, 5] x [-4, 6]`.
    fn slab() -> Building {
        Building::new(
            "slab",
            Mesh::from_rectangle(10., 10.),
            Transform::from_translation(Vector::new(-5., -4., 10.)),
        )
    }

    #[test]
    fn test_point_illuminated() {
        let b = slab();
        let scene = Scene::from_buildings(&[b.clone()]);
        let other = UID::new();
        let up = Vector::new(0., 0., 1.);

        assert!(!is_point_illuminated(Point::new(0., 0., 0.), up, &other, f64::INFINITY, &scene));
        assert!(is_point_illuminated(Point::new(20., 0., 0.), up, &other, f64::INFINITY, &scene));
        // Self hit below the threshold is lit, above it shadowed
        assert!(is_point_illuminated(Point::new(0., 0., 0.), up, &b.uid, f64::INFINITY, &scene));
        assert!(!is_point_illuminated(Point::new(0., 0., 0.), up, &b.uid, 0.02, &scene));
        assert!(is_point_illuminated(Point::new(0., 0., 9.99), up, &b.uid, 0.02, &scene));
    }

    #[test]
    fn test_centroid_facing_away_is_unlit() {
        // Empty scene: any ray would miss, but the triangle faces down
        let scene = Scene::new();
        let down = WorldTriangle::new(
            Point::new(0., 0., 0.),
            Point::new(0., 1., 0.),
            Point::new(1., 0., 0.),
        );
        let f = CentroidPolicy.lit_fraction(&down, &UID::new(), &sun_up(), &scene);
        assert_eq!(f, 0.);
        let f = CentroidPolicy.lit_fraction(&up_triangle(), &UID::new(), &sun_up(), &scene);
        assert_eq!(f, 1.);
    }

    #[test]
    fn test_centroid_occluded_by_other_object() {
        let scene = Scene::from_buildings(&[slab()]);
        let f = CentroidPolicy.lit_fraction(&up_triangle(), &UID::new(), &sun_up(), &scene);
        assert_eq!(f, 0.);
    }

    #[test]
    fn test_centroid_degenerate_triangle() {
        let p = Point::new(0., 0., 0.);
        let tri = WorldTriangle::new(p, p, p);
        let f = CentroidPolicy.lit_fraction(&tri, &UID::new(), &sun_up(), &Scene::new());
        assert_eq!(f, 0.);
    }

    #[test]
    fn test_monte_carlo_unobstructed() {
        let mut policy = seeded(7);
        let f = policy.sample_fraction(&up_triangle(), &UID::new(), &sun_up(), &Scene::new(), 1000);
        assert!((f - 1.).abs() < 1e-12);
    }

    #[test]
    fn test_monte_carlo_half_covered() {
        // Occluder covers x < 5 of a 10 x 10 ground square
        let cover = Building::new(
            "cover",
            Mesh::from_rectangle(5., 10.),
            Transform::from_translation(Vector::new(0., 0., 5.)),
        );
        let scene = Scene::from_buildings(&[cover]);
        let ground = UID::new();
        let mut policy = seeded(42);

        // Lower-right half of the square: a quarter of it lies under the cover
        let tri = WorldTriangle::new(
            Point::new(0., 0., 0.),
            Point::new(10., 0., 0.),
            Point::new(10., 10., 0.),
        );
        let f = policy.sample_fraction(&tri, &ground, &sun_up(), &scene, 2000);
        assert!((f - 0.75).abs() < 0.05, "{f}");
    }

    #[test]
    fn test_monte_carlo_self_shadow_beyond_threshold() {
        let b = slab();
        let scene = Scene::from_buildings(&[b.clone()]);
        let mut policy = seeded(1);
        let f = policy.sample_fraction(&up_triangle(), &b.uid, &sun_up(), &scene, 100);
        assert_eq!(f, 0.);
    }

    #[test]
    fn test_sample_count_clamped() {
        let policy = seeded(0);
        // Defaults: base 10, reference 1.0, min 10, max 100
        assert_eq!(policy.sample_count(0.), 10);
        assert_eq!(policy.sample_count(0.5), 10);
        assert_eq!(policy.sample_count(3.), 30);
        assert_eq!(policy.sample_count(4.26), 43);
        assert_eq!(policy.sample_count(1e6), 100);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let cover = Building::new(
            "cover",
            Mesh::from_rectangle(5., 10.),
            Transform::from_translation(Vector::new(0., 0., 5.)),
        );
        let scene = Scene::from_buildings(&[cover]);
        let tri = WorldTriangle::new(
            Point::new(0., 0., 0.),
            Point::new(10., 0., 0.),
            Point::new(10., 10., 0.),
        );
        let owner = UID::new();
        let a = seeded(3).lit_fraction(&tri, &owner, &sun_up(), &scene);
        let b = seeded(3).lit_fraction(&tri, &owner, &sun_up(), &scene);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_samples_is_configuration_error() {
        let config = ExposureConfig {
            min_samples: 0,
            base_samples: 0,
            ..ExposureConfig::default()
        };
        assert!(matches!(
            MonteCarloPolicy::new(&config),
            Err(crate::Error::Configuration(_))
        ));
        assert!(matches!(
            policy_from_config(&config),
            Err(crate::Error::Configuration(_))
        ));

        let centroid = ExposureConfig {
            policy: PolicyKind::Centroid,
            ..config
        };
        assert!(policy_from_config(&centroid).is_err());
    }

    #[test]
    fn test_policy_from_valid_config() {
        let config = ExposureConfig {
            seed: Some(5),
            ..ExposureConfig::default()
        };
        let mut policy = policy_from_config(&config).unwrap();
        let f = policy.lit_fraction(&up_triangle(), &UID::new(), &sun_up(), &Scene::new());
        assert_eq!(f, 1.);
    }
}
