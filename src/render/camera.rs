use crate::scene::{Aabb, Ray};
use glam::{Vec2, Vec3};

/// Fly camera used to turn pointer samples into pick rays.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_deg: f32,
    pub aspect: f32,
}

impl CameraController {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            fov_y_deg: 60.0,
            aspect: 16.0 / 9.0,
        }
    }

    /// Looking at `bounds` from a diagonal at three times its radius.
    pub fn from_bounds(bounds: &Aabb) -> Self {
        let center = bounds.center();
        let extent = (bounds.max - bounds.min) * 0.5;
        let radius = extent.max_element();
        let distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        let position = center + Vec3::new(distance, distance * 0.4, distance);
        let (yaw, pitch) = forward_to_yaw_pitch(center - position);
        Self::new(position, yaw, pitch)
    }

    pub fn with_lens(mut self, fov_y_deg: f32, aspect: f32) -> Self {
        self.fov_y_deg = fov_y_deg;
        self.aspect = aspect;
        self
    }

    /// Keeps orientation and lens, moves back until `bounds` fits.
    pub fn frame_bounds(&mut self, bounds: &Aabb) {
        let framed = Self::from_bounds(bounds);
        let (forward, _, _) = self.basis();
        let distance = (framed.position - bounds.center()).length();
        self.position = bounds.center() - forward * distance;
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        camera_basis(self.yaw, self.pitch)
    }

    /// World-space ray through a point in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    pub fn viewport_ray(&self, ndc: Vec2) -> Ray {
        let (forward, right, up) = self.basis();
        let half_height = (self.fov_y_deg.to_radians() * 0.5).tan();
        let half_width = half_height * self.aspect;
        let direction = forward + right * (ndc.x * half_width) + up * (ndc.y * half_height);
        Ray {
            origin: self.position,
            direction: direction.normalize_or_zero(),
        }
    }
}

fn forward_to_yaw_pitch(forward: Vec3) -> (f32, f32) {
    let n = forward / forward.length().max(1e-6);
    (n.z.atan2(n.x), n.y.clamp(-1.0, 1.0).asin())
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}
