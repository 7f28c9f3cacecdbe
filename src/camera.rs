//! Orbit camera around the tree.
//!
//! The camera sits on a sphere around a fixed target. While the tree is
//! formed it auto-rotates in azimuth; user drags change azimuth and polar
//! angle, with the polar angle clamped so the view never goes under the
//! floor or straight overhead. Panning is not supported.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Static camera setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Orbit speed multiplier; 1.0 is one revolution per minute.
    pub auto_rotate_speed: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 8.0),
            target: Vec3::ZERO,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            auto_rotate_speed: 0.5,
            min_polar_angle: PI / 4.0,
            max_polar_angle: PI / 1.8,
        }
    }
}

/// Camera orbiting `target` in spherical coordinates.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    config: CameraConfig,
    radius: f32,
    /// Angle from +Y, radians.
    polar: f32,
    /// Angle about +Y measured from +Z toward +X, radians.
    azimuth: f32,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let offset = config.position - config.target;
        let radius = offset.length().max(f32::EPSILON);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        let mut camera = Self {
            config,
            radius,
            polar,
            azimuth,
        };
        camera.clamp_polar();
        camera
    }

    /// Auto-rotation rate in radians per second.
    pub fn auto_rotate_rate(&self) -> f32 {
        2.0 * PI / 60.0 * self.config.auto_rotate_speed
    }

    /// Advance auto-rotation. Only turns while the tree is formed.
    pub fn update(&mut self, dt: f32, formed: bool) {
        if formed && dt > 0.0 {
            self.azimuth -= self.auto_rotate_rate() * dt;
        }
    }

    /// Apply a user drag in radians.
    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) {
        self.azimuth += d_azimuth;
        self.polar += d_polar;
        self.clamp_polar();
    }

    fn clamp_polar(&mut self) {
        self.polar = self
            .polar
            .clamp(self.config.min_polar_angle, self.config.max_polar_angle);
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.config.target + Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.radius
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.config.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov.to_radians(),
            aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Uniforms for a viewport of `width` x `height` pixels, with `model`
    /// as the world matrix of whatever the pipeline draws.
    pub fn to_uniforms(&self, width: f32, height: f32, model: Mat4) -> CameraUniforms {
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        CameraUniforms {
            view: self.view_matrix().to_cols_array_2d(),
            proj: self.projection_matrix(aspect).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            viewport: [width, height, 0.0, 0.0],
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

/// Camera block bound at group 0 by every pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Width and height in pixels.
    pub viewport: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_configured_position() {
        let camera = OrbitCamera::default();
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 1.0, 8.0), 1e-4));
    }

    #[test]
    fn test_auto_rotate_only_when_formed() {
        let mut camera = OrbitCamera::default();
        let start = camera.azimuth();
        camera.update(1.0, false);
        assert_eq!(camera.azimuth(), start);

        camera.update(60.0, true);
        // Speed 0.5 is half a revolution per minute.
        assert!(((start - camera.azimuth()) - PI).abs() < 1e-3);
        // Orbit keeps distance and height.
        assert!((camera.position().length() - 65f32.sqrt()).abs() < 1e-3);
        assert!((camera.position().y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_polar_angle_clamped() {
        let mut camera = OrbitCamera::default();
        camera.orbit(0.0, -10.0);
        assert!((camera.polar() - PI / 4.0).abs() < 1e-6);
        camera.orbit(0.0, 10.0);
        assert!((camera.polar() - PI / 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix_looks_at_target() {
        let camera = OrbitCamera::default();
        let view = camera.view_matrix();
        // Target lands on the view axis in front of the camera.
        let t = view.transform_point3(Vec3::ZERO);
        assert!(t.x.abs() < 1e-4 && t.y.abs() < 1e-4);
        assert!(t.z < 0.0);
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 208);
        let u = OrbitCamera::default().to_uniforms(1280.0, 720.0, Mat4::IDENTITY);
        assert_eq!(u.viewport[0], 1280.0);
    }
}
