//! Per-frame transform evaluation for instanced layers.
//!
//! This module turns a layer's immutable elements plus its current progress
//! into GPU-ready instance matrices:
//! - position blends scattered -> formed along a cubic ease-out, with a
//!   drift that fades out as the layer assembles
//! - rotation spins faster while scattered and idles when formed
//! - scale grows as elements assemble

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::instance::VisualElement;
use crate::scene_graph::{compose, Transform};

/// Drift is suppressed once progress reaches this value.
pub const DRIFT_CUTOFF: f32 = 0.99;

/// Base drift amplitude per unit of drift weight.
const DRIFT_AMPLITUDE: f32 = 0.2;

/// GPU instance data for ornament meshes: one model matrix per element.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuInstanceTransform {
    /// Column-major world matrix.
    pub model: [[f32; 4]; 4],
}

impl GpuInstanceTransform {
    pub fn from_matrix(m: &Mat4) -> Self {
        Self {
            model: m.to_cols_array_2d(),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    /// Vertex buffer layout for instanced rendering (slot 1, step mode Instance).
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            // After mesh vertex attributes (0, 1)
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuInstanceTransform>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// How scale responds to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleLaw {
    /// `base * (0.2 + 0.8 * eased)`: small when scattered, full when formed.
    #[default]
    Grow,
    /// `base * eased`: gone when scattered.
    Vanish,
}

impl ScaleLaw {
    pub fn apply(&self, base_scale: f32, eased: f32) -> f32 {
        match self {
            ScaleLaw::Grow => base_scale * (0.2 + 0.8 * eased),
            ScaleLaw::Vanish => base_scale * eased,
        }
    }
}

/// Cubic ease-out: `1 - (1 - p)^3`. Exact at both endpoints.
pub fn ease_out_cubic(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Spin speed multiplier: fast while scattered, slow idle when formed.
pub fn spin_speed(progress: f32) -> f32 {
    (1.0 - progress) * 2.0 + 0.2
}

/// Everything the evaluator needs about a layer for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct MorphFrame {
    /// Raw layer progress in [0, 1].
    pub progress: f32,
    /// Elapsed scene time in seconds.
    pub time: f32,
    /// Integrated spin angle (see [`spin_speed`]).
    pub spin_phase: f32,
    pub drift_weight: f32,
    pub scale_law: ScaleLaw,
    /// Drift on/off. Off yields the bare morph pose.
    pub secondary_motion: bool,
}

impl MorphFrame {
    pub fn eased(&self) -> f32 {
        ease_out_cubic(self.progress)
    }
}

/// Final local pose of one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl ElementTransform {
    pub fn to_transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: Vec3::splat(self.scale),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        self.to_transform().to_matrix()
    }
}

/// Position on the scattered -> formed line.
pub fn blend_position(element: &VisualElement, eased: f32) -> Vec3 {
    // Weighted sum rather than `a + (b - a) * t` so both endpoints are exact.
    element.scattered_position * (1.0 - eased) + element.formed_position * eased
}

/// Low-frequency wander, phase-offset by element index. Zero once
/// progress reaches [`DRIFT_CUTOFF`].
pub fn drift_offset(index: usize, progress: f32, time: f32, drift_weight: f32) -> Vec3 {
    if progress >= DRIFT_CUTOFF {
        return Vec3::ZERO;
    }
    let amp = (1.0 - progress) * DRIFT_AMPLITUDE * drift_weight;
    let phase = index as f32;
    Vec3::new(
        (time * 0.3 + phase).cos() * amp,
        (time * 0.5 + phase).sin() * amp,
        (time * 0.4 + phase).sin() * amp,
    )
}

/// Evaluate one element.
pub fn evaluate_element(element: &VisualElement, index: usize, frame: &MorphFrame) -> ElementTransform {
    let eased = frame.eased();

    let mut position = blend_position(element, eased);
    if frame.secondary_motion {
        position += drift_offset(index, frame.progress, frame.time, frame.drift_weight);
    }

    let rotation = element.rotation_seed
        + Vec3::new(frame.spin_phase * 0.5, frame.spin_phase * 0.3, 0.0);

    ElementTransform {
        position,
        rotation,
        scale: frame.scale_law.apply(element.base_scale, eased),
    }
}

/// Evaluate a whole layer under `group` into `out` (cleared first).
pub fn evaluate_layer(
    elements: &[VisualElement],
    frame: &MorphFrame,
    group: &Mat4,
    out: &mut Vec<GpuInstanceTransform>,
) {
    out.clear();
    out.reserve(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let local = evaluate_element(element, i, frame).to_matrix();
        out.push(GpuInstanceTransform::from_matrix(&compose(group, &local)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element() -> VisualElement {
        VisualElement {
            formed_position: Vec3::new(1.0, 2.0, 0.5),
            scattered_position: Vec3::new(-4.0, 3.0, 2.0),
            rotation_seed: Vec3::new(0.3, 1.1, 0.0),
            base_scale: 1.25,
            random_value: 0.4,
        }
    }

    fn frame(progress: f32, secondary_motion: bool) -> MorphFrame {
        MorphFrame {
            progress,
            time: 3.7,
            spin_phase: 0.0,
            drift_weight: 2.0,
            scale_law: ScaleLaw::Grow,
            secondary_motion,
        }
    }

    #[test]
    fn test_ease_endpoints_exact() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
    }

    #[test]
    fn test_ease_monotonic() {
        let mut prev = ease_out_cubic(0.0);
        for i in 1..=1000 {
            let v = ease_out_cubic(i as f32 / 1000.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_scattered_pose_at_zero_progress() {
        let e = element();
        let t = evaluate_element(&e, 0, &frame(0.0, false));
        assert_eq!(t.position, e.scattered_position);
        assert!((t.scale - 0.2 * e.base_scale).abs() < 1e-6);
        assert_eq!(t.rotation, e.rotation_seed);
    }

    #[test]
    fn test_formed_pose_at_full_progress_even_with_drift() {
        let e = element();
        let t = evaluate_element(&e, 5, &frame(1.0, true));
        assert_eq!(t.position, e.formed_position);
        assert!((t.scale - e.base_scale).abs() < 1e-6);
    }

    #[test]
    fn test_drift_bounded_and_fading() {
        let weight = 2.0;
        for i in 0..20 {
            let d = drift_offset(i, 0.0, i as f32 * 0.9, weight);
            let amp = 0.2 * weight;
            assert!(d.x.abs() <= amp + 1e-6);
            assert!(d.y.abs() <= amp + 1e-6);
            assert!(d.z.abs() <= amp + 1e-6);
        }
        assert_eq!(drift_offset(3, 0.99, 1.0, weight), Vec3::ZERO);
        assert_eq!(drift_offset(3, 0.5, 1.0, 0.0), Vec3::ZERO);
    }

    #[test]
    fn test_drift_applied_while_scattered() {
        let e = element();
        let with = evaluate_element(&e, 2, &frame(0.0, true));
        let without = evaluate_element(&e, 2, &frame(0.0, false));
        let expected = drift_offset(2, 0.0, 3.7, 2.0);
        assert!((with.position - without.position - expected).length() < 1e-5);
    }

    #[test]
    fn test_spin_speed_never_stops() {
        assert!((spin_speed(0.0) - 2.2).abs() < 1e-6);
        assert!((spin_speed(1.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_vanish_scale_law() {
        assert_eq!(ScaleLaw::Vanish.apply(1.0, 0.0), 0.0);
        assert_eq!(ScaleLaw::Vanish.apply(1.0, 1.0), 1.0);
        assert!((ScaleLaw::Grow.apply(2.0, 0.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_layer_composes_group() {
        let elements = vec![element(); 3];
        let group = Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));
        let mut out = Vec::new();
        evaluate_layer(&elements, &frame(1.0, true), &group, &mut out);
        assert_eq!(out.len(), 3);

        let origin = out[0].matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 1.0, 0.5), 1e-5));
    }

    #[test]
    fn test_instance_size() {
        assert_eq!(std::mem::size_of::<GpuInstanceTransform>(), 64);
    }
}
