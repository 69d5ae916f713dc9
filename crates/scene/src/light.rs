use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shadow map parameters for a shadow-casting directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    pub map_width: u32,
    pub map_height: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_width: 2048,
            map_height: 2048,
            near: 0.1,
            far: 50.0,
        }
    }
}

/// A light source placed in the scene graph.
///
/// Lights are created once at startup and never mutated by the render loop.
/// A directional light's direction runs from its node's world position
/// toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    Directional {
        color: Vec3,
        intensity: f32,
        shadow: Option<ShadowConfig>,
    },
}

impl Light {
    pub fn color(&self) -> Vec3 {
        match self {
            Light::Ambient { color, .. } | Light::Directional { color, .. } => *color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient { intensity, .. } | Light::Directional { intensity, .. } => *intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_config_defaults() {
        let s = ShadowConfig::default();
        assert_eq!((s.map_width, s.map_height), (2048, 2048));
        assert_eq!(s.near, 0.1);
        assert_eq!(s.far, 50.0);
    }

    #[test]
    fn light_accessors() {
        let l = Light::Directional {
            color: Vec3::ONE,
            intensity: 2.0,
            shadow: Some(ShadowConfig::default()),
        };
        assert_eq!(l.color(), Vec3::ONE);
        assert_eq!(l.intensity(), 2.0);
    }
}
