use crate::SceneError;
use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for the background starfield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarfieldConfig {
    pub num_stars: u32,
    /// Seed for deterministic placement.
    pub seed: u64,
    /// Stars are scattered inside this radial shell around the origin.
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            num_stars: 5000,
            seed: 7,
            min_radius: 40.0,
            max_radius: 60.0,
        }
    }
}

impl StarfieldConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.num_stars == 0 {
            return Err(SceneError::InvalidStarfield(
                "num_stars must be positive".into(),
            ));
        }
        if !(self.min_radius > 0.0 && self.max_radius >= self.min_radius) {
            return Err(SceneError::InvalidStarfield(format!(
                "radial shell [{}, {}] is empty",
                self.min_radius, self.max_radius
            )));
        }
        Ok(())
    }
}

/// One background star.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarPoint {
    pub position: Vec3,
    pub color: [f32; 3],
    /// Billboard edge length in world units.
    pub size: f32,
}

/// A renderable set of points, ready for direct insertion into the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<StarPoint>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Generate the starfield point cloud. Deterministic for a given seed.
///
/// Directions are uniform over the sphere; brightness follows a power law
/// (many dim stars, few bright ones) and drives both tint and size.
pub fn generate(config: &StarfieldConfig) -> Result<PointCloud, SceneError> {
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut points = Vec::with_capacity(config.num_stars as usize);

    for _ in 0..config.num_stars {
        let theta = rng.random::<f32>() * std::f32::consts::TAU;
        let phi = (1.0 - 2.0 * rng.random::<f32>()).acos();
        let direction = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());

        let radius = config.min_radius
            + rng.random::<f32>() * (config.max_radius - config.min_radius);

        let brightness: f32 = rng.random::<f32>().powf(3.0);

        // Warm dim stars, blue-white bright ones.
        let warm = Vec3::new(1.0, 0.85, 0.7);
        let cool = Vec3::new(0.85, 0.9, 1.0);
        let tint = warm.lerp(cool, brightness);
        let level = 0.4 + 0.6 * brightness;
        let color = (tint * level).to_array();

        points.push(StarPoint {
            position: direction * radius,
            color,
            size: 0.08 + brightness * 0.25,
        });
    }

    Ok(PointCloud { points })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_count_matches_configuration() {
        let cloud = generate(&StarfieldConfig {
            num_stars: 5000,
            ..StarfieldConfig::default()
        })
        .unwrap();
        assert_eq!(cloud.len(), 5000);
    }

    #[test]
    fn zero_stars_is_rejected_at_startup() {
        let err = generate(&StarfieldConfig {
            num_stars: 0,
            ..StarfieldConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidStarfield(_)));
    }

    #[test]
    fn empty_radial_shell_is_rejected() {
        let err = generate(&StarfieldConfig {
            min_radius: 10.0,
            max_radius: 5.0,
            ..StarfieldConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidStarfield(_)));
    }

    #[test]
    fn stars_lie_inside_the_shell() {
        let config = StarfieldConfig::default();
        let cloud = generate(&config).unwrap();
        for star in &cloud.points {
            let r = star.position.length();
            assert!(
                r >= config.min_radius - 1e-3 && r <= config.max_radius + 1e-3,
                "star at radius {r} outside [{}, {}]",
                config.min_radius,
                config.max_radius
            );
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let config = StarfieldConfig::default();
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(&StarfieldConfig::default()).unwrap();
        let b = generate(&StarfieldConfig {
            seed: 999,
            ..StarfieldConfig::default()
        })
        .unwrap();
        assert_ne!(a.points, b.points);
    }

    #[test]
    fn distribution_covers_all_octants() {
        let cloud = generate(&StarfieldConfig::default()).unwrap();
        let mut octants = [0u32; 8];
        for star in &cloud.points {
            let p = star.position;
            let octant = ((p.x >= 0.0) as usize)
                | (((p.y >= 0.0) as usize) << 1)
                | (((p.z >= 0.0) as usize) << 2);
            octants[octant] += 1;
        }
        for (i, &count) in octants.iter().enumerate() {
            assert!(
                (300..=900).contains(&count),
                "octant {i} has {count} stars, expected roughly 625"
            );
        }
    }
}
