use glam::{Vec2, Vec3};
use terrella_scene::Camera;

/// A buffered orbit gesture, produced by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitEvent {
    /// Pointer drag delta in pixels.
    Rotate(f32, f32),
    /// Wheel delta; positive moves the camera closer.
    Zoom(f32),
}

/// Maps buffered pointer/wheel input to a camera orbit around a target,
/// optionally smoothed with inertial damping.
///
/// `update` runs once per frame tick: it consumes everything buffered since
/// the previous tick and rewrites the camera's position and look target in
/// place. With damping enabled, residual motion carries across frames and
/// decays geometrically by the damping factor.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub damping_enabled: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    pending_rotate: Vec2,
    pending_zoom: f32,
    residual_rotate: Vec2,
    residual_zoom: f32,
}

/// Keep the orbit off the poles so the view vector never degenerates.
const PITCH_LIMIT: f32 = 1.553; // ~89 degrees

impl OrbitController {
    /// Create a controller orbiting `camera.target`, starting from the
    /// camera's current placement.
    pub fn new(camera: &Camera) -> Self {
        let offset = camera.position - camera.target;
        let distance = offset.length().max(1e-4);
        tracing::debug!("orbit controller starts at distance {distance:.3}");
        Self {
            target: camera.target,
            damping_enabled: true,
            damping_factor: 0.25,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 1.2,
            max_distance: 100.0,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin(),
            distance,
            pending_rotate: Vec2::ZERO,
            pending_zoom: 0.0,
            residual_rotate: Vec2::ZERO,
            residual_zoom: 0.0,
        }
    }

    /// Buffer a gesture until the next `update`.
    pub fn push(&mut self, event: OrbitEvent) {
        match event {
            OrbitEvent::Rotate(dx, dy) => {
                self.pending_rotate += Vec2::new(dx, dy);
            }
            OrbitEvent::Zoom(delta) => {
                self.pending_zoom += delta;
            }
        }
    }

    /// Current orbit distance from the target.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Per-frame advance: consume buffered input, apply damping, and write
    /// the resulting placement into the camera.
    pub fn update(&mut self, camera: &mut Camera) {
        self.residual_rotate += self.pending_rotate * self.rotate_speed;
        self.residual_zoom += self.pending_zoom * self.zoom_speed;
        self.pending_rotate = Vec2::ZERO;
        self.pending_zoom = 0.0;

        self.yaw -= self.residual_rotate.x;
        self.pitch = (self.pitch + self.residual_rotate.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.distance =
            (self.distance * (1.0 - self.residual_zoom)).clamp(self.min_distance, self.max_distance);

        if self.damping_enabled {
            let retain = 1.0 - self.damping_factor;
            self.residual_rotate *= retain;
            self.residual_zoom *= retain;
        } else {
            self.residual_rotate = Vec2::ZERO;
            self.residual_zoom = 0.0;
        }

        let dir = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        camera.position = self.target + dir * self.distance;
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (OrbitController, Camera) {
        let camera = Camera::default();
        (OrbitController::new(&camera), camera)
    }

    #[test]
    fn construction_preserves_camera_placement() {
        let (mut ctl, mut camera) = controller();
        let before = camera.position;
        ctl.update(&mut camera);
        assert!(
            (camera.position - before).length() < 1e-4,
            "update with no input moved the camera: {before} -> {}",
            camera.position
        );
    }

    #[test]
    fn rotation_orbits_at_constant_distance() {
        let (mut ctl, mut camera) = controller();
        let distance = (camera.position - camera.target).length();
        ctl.push(OrbitEvent::Rotate(120.0, -40.0));
        for _ in 0..20 {
            ctl.update(&mut camera);
        }
        assert!(((camera.position - camera.target).length() - distance).abs() < 1e-3);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn buffered_input_is_consumed_by_one_update() {
        let (mut ctl, mut camera) = controller();
        ctl.damping_enabled = false;
        ctl.push(OrbitEvent::Rotate(50.0, 0.0));
        ctl.update(&mut camera);
        let after_first = camera.position;
        ctl.update(&mut camera);
        assert_eq!(camera.position, after_first);
    }

    #[test]
    fn damping_carries_and_decays_residual_motion() {
        let (mut ctl, mut camera) = controller();
        ctl.push(OrbitEvent::Rotate(100.0, 0.0));
        ctl.update(&mut camera);
        let p1 = camera.position;
        ctl.update(&mut camera);
        let p2 = camera.position;
        ctl.update(&mut camera);
        let p3 = camera.position;

        let step1 = (p2 - p1).length();
        let step2 = (p3 - p2).length();
        assert!(step1 > 0.0, "damped motion should continue after input stops");
        assert!(step2 < step1, "residual motion should decay");
        let observed = step2 / step1;
        assert!(
            (observed - 0.75).abs() < 0.05,
            "decay ratio {observed} should track 1 - damping_factor"
        );
    }

    #[test]
    fn zoom_respects_distance_clamp() {
        let (mut ctl, mut camera) = controller();
        ctl.damping_enabled = false;
        for _ in 0..100 {
            ctl.push(OrbitEvent::Zoom(5.0));
            ctl.update(&mut camera);
        }
        assert!(ctl.distance() >= ctl.min_distance);
        for _ in 0..100 {
            ctl.push(OrbitEvent::Zoom(-5.0));
            ctl.update(&mut camera);
        }
        assert!(ctl.distance() <= ctl.max_distance);
    }

    #[test]
    fn pitch_never_reaches_the_poles() {
        let (mut ctl, mut camera) = controller();
        ctl.damping_enabled = false;
        for _ in 0..200 {
            ctl.push(OrbitEvent::Rotate(0.0, 100.0));
            ctl.update(&mut camera);
        }
        let up_dot = (camera.position - camera.target).normalize().dot(Vec3::Y);
        assert!(up_dot < 0.9999, "camera collapsed onto the pole");
    }
}
