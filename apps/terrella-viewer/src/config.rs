use terrella_scene::{Camera, SceneSpec, StarfieldConfig};

/// Startup configuration: static asset location plus the numeric constants
/// of the scene. Defaults reproduce the standard view.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Initial window size in logical pixels.
    pub window_width: u32,
    pub window_height: u32,
    pub texture_dir: String,
    pub scene: SceneSpec,
    pub camera: Camera,
    pub damping_enabled: bool,
    pub damping_factor: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            texture_dir: "./textures".into(),
            scene: SceneSpec::default(),
            camera: Camera::default(),
            damping_enabled: true,
            damping_factor: 0.25,
        }
    }
}

impl ViewerConfig {
    pub fn with_stars(mut self, num_stars: u32) -> Self {
        self.scene.starfield = StarfieldConfig {
            num_stars,
            ..self.scene.starfield
        };
        self
    }

    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_view() {
        let config = ViewerConfig::default();
        assert_eq!(config.scene.starfield.num_stars, 5000);
        assert_eq!(config.damping_factor, 0.25);
        assert_eq!(config.camera.fov_y, 80.0_f32.to_radians());
    }

    #[test]
    fn overrides_apply() {
        let config = ViewerConfig::default().with_stars(100).with_window(800, 600);
        assert_eq!(config.scene.starfield.num_stars, 100);
        assert_eq!((config.window_width, config.window_height), (800, 600));
    }
}
