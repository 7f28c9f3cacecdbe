//! Scene lighting and atmosphere.
//!
//! A fixed cinematic rig (ambient, warm key spot, green fill point) plus a
//! warm point light at the heart of the tree whose intensity follows the
//! central-light layer's progress.
//!
//! Everything is resolved into a single [`LightingUniforms`] block per frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::material::Color;

/// Maximum number of punctual lights in the uniform block.
pub const MAX_LIGHTS: usize = 3;

const KIND_POINT: f32 = 0.0;
const KIND_SPOT: f32 = 1.0;

// ============================================================================
// Lighting Configuration
// ============================================================================

/// Point light. `distance == 0` means unbounded range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: f32,
    pub color: u32,
    pub distance: f32,
    pub decay: f32,
}

/// Spot light aimed at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub intensity: f32,
    pub color: u32,
    /// Cone half-angle in radians.
    pub angle: f32,
    /// Fraction of the cone that is soft, 0..1.
    pub penumbra: f32,
}

/// The warm light inside the tree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralLightConfig {
    /// Intensity when fully formed.
    pub intensity: f32,
    pub color: u32,
    pub distance: f32,
    pub decay: f32,
}

impl Default for CentralLightConfig {
    fn default() -> Self {
        Self {
            intensity: 3.0,
            color: 0xffaa00,
            distance: 6.0,
            decay: 2.0,
        }
    }
}

/// Static light rig plus background and fog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLighting {
    pub ambient_intensity: f32,
    pub ambient_color: u32,
    pub key: SpotLight,
    pub fill: PointLight,
    pub central: CentralLightConfig,
    pub background: u32,
    /// Linear fog start and end distances.
    pub fog_range: [f32; 2],
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.5,
            ambient_color: 0x004433,
            key: SpotLight {
                position: Vec3::new(5.0, 10.0, 5.0),
                intensity: 200.0,
                color: 0xfff5cc,
                angle: 0.5,
                penumbra: 1.0,
            },
            fill: PointLight {
                position: Vec3::new(-5.0, 2.0, -5.0),
                intensity: 20.0,
                color: 0x00ff88,
                distance: 10.0,
                decay: 2.0,
            },
            central: CentralLightConfig::default(),
            background: 0x010806,
            fog_range: [5.0, 15.0],
        }
    }
}

impl SceneLighting {
    /// Central light intensity at `progress` (0 when scattered).
    pub fn central_intensity(&self, progress: f32) -> f32 {
        self.central.intensity * progress.clamp(0.0, 1.0)
    }

    /// Resolve the rig into GPU uniforms.
    ///
    /// `central_world` is the central light position after the tree group
    /// transform has been applied.
    pub fn to_uniforms(&self, central_progress: f32, central_world: Vec3) -> LightingUniforms {
        let ambient = Color::from_hex(self.ambient_color).to_linear();
        let a = self.ambient_intensity;

        let key_color = Color::from_hex(self.key.color).to_linear();
        let fill_color = Color::from_hex(self.fill.color).to_linear();
        let central_color = Color::from_hex(self.central.color).to_linear();

        let lights = [
            GpuLight {
                position: self.key.position.extend(self.key.intensity).to_array(),
                color: key_color.with_alpha(0.0),
                params: [KIND_SPOT, 0.0, self.key.angle, self.key.penumbra],
            },
            GpuLight {
                position: self.fill.position.extend(self.fill.intensity).to_array(),
                color: fill_color.with_alpha(self.fill.distance),
                params: [KIND_POINT, self.fill.decay, 0.0, 0.0],
            },
            GpuLight {
                position: central_world
                    .extend(self.central_intensity(central_progress))
                    .to_array(),
                color: central_color.with_alpha(self.central.distance),
                params: [KIND_POINT, self.central.decay, 0.0, 0.0],
            },
        ];

        let fog = Color::from_hex(self.background).to_linear();
        LightingUniforms {
            ambient: [ambient.r * a, ambient.g * a, ambient.b * a, 1.0],
            fog_color: fog.with_alpha(1.0),
            fog_range: [self.fog_range[0], self.fog_range[1], 0.0, 0.0],
            lights,
            light_count: MAX_LIGHTS as u32,
            _padding: [0; 3],
        }
    }
}

// ============================================================================
// GPU Uniforms
// ============================================================================

/// One punctual light. 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz position (world), w intensity.
    pub position: [f32; 4],
    /// rgb linear color, a range (0 = unbounded).
    pub color: [f32; 4],
    /// x kind (0 point, 1 spot), y decay, z spot angle, w penumbra.
    pub params: [f32; 4],
}

/// GPU-ready lighting uniforms. 208 bytes, 16-byte aligned.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LightingUniforms {
    /// Ambient rgb pre-multiplied by intensity.
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    /// x near, y far.
    pub fog_range: [f32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
    pub light_count: u32,
    pub _padding: [u32; 3],
}

impl Default for LightingUniforms {
    fn default() -> Self {
        SceneLighting::default().to_uniforms(1.0, Vec3::ZERO)
    }
}
