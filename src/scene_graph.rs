//! Explicit transform composition for the tree.
//!
//! There is no retained node hierarchy: each element's world matrix is the
//! product of its layer group's matrix and its own local matrix.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component with Euler rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local matrix: translate * rotate * scale.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// World matrix of a child under `parent`.
pub fn compose(parent: &Mat4, local: &Mat4) -> Mat4 {
    *parent * *local
}

/// Gentle bob-and-sway applied to the whole tree while it is formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatMotion {
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
}

impl Default for FloatMotion {
    fn default() -> Self {
        Self {
            speed: 1.0,
            rotation_intensity: 0.1,
            float_intensity: 0.2,
        }
    }
}

impl FloatMotion {
    /// Float offset at elapsed time `t`.
    pub fn transform_at(&self, t: f32) -> Transform {
        let phase = t / 4.0 * self.speed;
        Transform {
            position: Vec3::new(0.0, phase.sin() / 10.0 * self.float_intensity, 0.0),
            rotation: Vec3::new(
                phase.cos() / 8.0 * self.rotation_intensity,
                phase.sin() / 8.0 * self.rotation_intensity,
                phase.sin() / 20.0 * self.rotation_intensity,
            ),
            scale: Vec3::ONE,
        }
    }
}

/// The group every tree layer hangs from.
#[derive(Debug, Clone)]
pub struct TreeGroup {
    pub transform: Transform,
    /// Radians per second of idle Y rotation while formed.
    pub idle_rotation_speed: f32,
    pub float_motion: FloatMotion,
    float_enabled: bool,
    float_offset: Transform,
}

impl TreeGroup {
    pub fn new(position: Vec3, idle_rotation_speed: f32, float_motion: FloatMotion) -> Self {
        Self {
            transform: Transform::from_position(position),
            idle_rotation_speed,
            float_motion,
            float_enabled: false,
            float_offset: Transform::default(),
        }
    }

    /// Track elapsed time while formed; hold the last pose while scattered.
    pub fn update(&mut self, elapsed: f32, formed: bool) {
        self.float_enabled = formed;
        if formed {
            self.transform.rotation.y = elapsed * self.idle_rotation_speed;
            self.float_offset = self.float_motion.transform_at(elapsed);
        }
    }

    /// Group matrix including float motion.
    pub fn matrix(&self) -> Mat4 {
        let base = self.transform.to_matrix();
        if self.float_enabled {
            compose(&base, &self.float_offset.to_matrix())
        } else {
            base
        }
    }
}
