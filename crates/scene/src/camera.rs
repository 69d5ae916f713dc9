use crate::SceneError;
use glam::{Mat4, Vec3};

/// Perspective camera: projection parameters plus a world placement that the
/// orbit controller rewrites once per frame.
///
/// The aspect ratio must equal viewport width / height at all times; it is
/// updated by the resize handler, which is the only other writer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 1.5, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 80.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Resize-handler entry point: aspect becomes exactly width / height.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }
}

/// Logical output-surface geometry plus pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Result<Self, SceneError> {
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidViewport { width, height });
        }
        Ok(Self {
            width,
            height,
            scale_factor,
        })
    }

    /// Drawing-surface size in physical pixels: logical size times density.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.scale_factor).round() as u32,
            (self.height as f64 * self.scale_factor).round() as u32,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_matches_startup_configuration() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(2.0, 1.5, 3.0));
        assert_eq!(cam.fov_y, 80.0_f32.to_radians());
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 1000.0);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn set_viewport_updates_aspect_exactly() {
        let mut cam = Camera::default();
        cam.set_viewport(1920, 1080);
        assert_eq!(cam.aspect, 1920.0 / 1080.0);
        cam.set_viewport(800, 600);
        assert_eq!(cam.aspect, 800.0 / 600.0);
    }

    #[test]
    fn resize_recomputes_projection() {
        let mut cam = Camera::default();
        cam.set_viewport(1920, 1080);
        let before = cam.projection_matrix();
        cam.set_viewport(800, 600);
        let after = cam.projection_matrix();
        assert_ne!(before, after);
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let mut a = Camera::default();
        let mut b = Camera::default();
        a.set_viewport(800, 600);
        b.set_viewport(800, 600);
        b.set_viewport(800, 600);
        assert_eq!(a, b);
    }

    #[test]
    fn viewport_physical_size_scales_by_density() {
        let vp = Viewport::new(1920, 1080, 2.0).unwrap();
        assert_eq!(vp.physical_size(), (3840, 2160));
        let vp = Viewport::new(800, 600, 1.0).unwrap();
        assert_eq!(vp.physical_size(), (800, 600));
    }

    #[test]
    fn zero_viewport_is_rejected() {
        assert!(Viewport::new(0, 600, 1.0).is_err());
        assert!(Viewport::new(800, 0, 1.0).is_err());
    }
}
