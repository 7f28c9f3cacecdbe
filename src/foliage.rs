//! Foliage point-cloud layer.
//!
//! The foliage morph runs on the GPU: each particle carries both positions and
//! the vertex stage blends them with a single `morph_factor` uniform. The CPU
//! side only uploads the vertex buffer once and then updates [`FoliageUniforms`]
//! every frame.
//!
//! `displace_vertex` and `shade_fragment` mirror the shader so the visual
//! contract can be checked without a GPU.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::instance::VisualElement;
use crate::material::Color;

/// WGSL program for the foliage points.
pub const FOLIAGE_SHADER: &str = include_str!("shaders/foliage.wgsl");

/// Particles with a random value at or above this render gold.
pub const GOLD_THRESHOLD: f32 = 0.9;

/// Strength of the gold tint blend.
pub const GOLD_MIX: f32 = 0.8;

/// World-space base particle size.
pub const BASE_POINT_SIZE: f32 = 0.15;

/// Per-particle foliage data.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FoliageVertex {
    pub tree_pos: [f32; 3],
    pub scatter_pos: [f32; 3],
    pub random: f32,
}

impl FoliageVertex {
    pub fn from_element(e: &VisualElement) -> Self {
        Self {
            tree_pos: e.formed_position.to_array(),
            scatter_pos: e.scattered_position.to_array(),
            random: e.random_value,
        }
    }

    /// WGSL has no point size, so each particle is drawn as an instance of a
    /// six-vertex quad and this buffer steps per instance.
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FoliageVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Build the static vertex buffer contents.
pub fn build_vertices(elements: &[VisualElement]) -> Vec<FoliageVertex> {
    elements.iter().map(FoliageVertex::from_element).collect()
}

/// Foliage uniform block. 64 bytes, 16-byte aligned.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FoliageUniforms {
    pub time: f32,
    pub morph_factor: f32,
    pub _padding: [f32; 2],
    pub color_base: [f32; 4],
    pub color_tip: [f32; 4],
    pub color_gold: [f32; 4],
}

impl Default for FoliageUniforms {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl FoliageUniforms {
    pub fn new(time: f32, morph_factor: f32) -> Self {
        Self {
            time,
            morph_factor,
            _padding: [0.0; 2],
            color_base: Color::from_hex(0x001a0d).to_linear().with_alpha(1.0),
            color_tip: Color::from_hex(0x004d26).to_linear().with_alpha(1.0),
            color_gold: Color::from_hex(0xffd700).to_linear().with_alpha(1.0),
        }
    }
}

/// Vertex stage output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacedVertex {
    pub position: Vec3,
    pub alpha: f32,
    /// Size multiplier applied before perspective division.
    pub sparkle: f32,
}

/// CPU mirror of the foliage vertex stage (model space).
pub fn displace_vertex(v: &FoliageVertex, time: f32, morph: f32) -> DisplacedVertex {
    let tree = Vec3::from_array(v.tree_pos);
    let scatter = Vec3::from_array(v.scatter_pos);
    let mut pos = scatter * (1.0 - morph) + tree * morph;

    // Breathing while formed
    let breath = (time * 2.0 + pos.y * 3.0).sin() * 0.02 * morph;
    pos += pos.normalize_or_zero() * breath;

    // Floating while scattered
    let loose = 0.5 * (1.0 - morph);
    pos += Vec3::new(
        (time * 0.5 + v.random * 100.0).sin() * loose,
        (time * 0.3 + v.random * 50.0).cos() * loose,
        (time * 0.4 + v.random * 20.0).sin() * loose,
    );

    DisplacedVertex {
        position: pos,
        alpha: 0.6 + 0.4 * morph,
        sparkle: 1.0 + (time * 3.0 + v.random * 20.0).sin() * 0.5,
    }
}

/// Screen-space point size for a vertex at view depth `view_z` (negative in front).
pub fn point_size(sparkle: f32, view_z: f32) -> f32 {
    (BASE_POINT_SIZE * 300.0 * sparkle) / -view_z
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// CPU mirror of the foliage fragment stage.
///
/// `point_coord` is in [0, 1]² across the point sprite. Returns `None` where
/// the fragment is discarded (outside the inscribed circle).
pub fn shade_fragment(
    uniforms: &FoliageUniforms,
    point_coord: Vec2,
    random: f32,
    alpha: f32,
) -> Option<[f32; 4]> {
    let r = (point_coord - Vec2::splat(0.5)).length();
    if r > 0.5 {
        return None;
    }

    let strength = (1.0 - r * 2.0).powf(1.5);

    let base = Vec3::from_slice(&uniforms.color_base[..3]);
    let tip = Vec3::from_slice(&uniforms.color_tip[..3]);
    let gold = Vec3::from_slice(&uniforms.color_gold[..3]);

    let mut color = base.lerp(tip, strength);
    let is_gold = if random >= GOLD_THRESHOLD { 1.0 } else { 0.0 };
    color = color.lerp(gold, is_gold * GOLD_MIX);

    let edge = smoothstep(0.3, 0.5, r);
    color += gold * edge * 0.5;

    Some([color.x, color.y, color.z, strength * alpha])
}
