//! Visual elements and the per-layer instance datasets built from them.
//!
//! Every layer is described by a [`LayerSpec`] (how many elements, where they
//! sit when formed, where they go when scattered, how big they are). A
//! dataset is built once when the scene is constructed and is immutable
//! afterwards; only the interpretation of it changes as the layer morphs.

use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::sampler::{
    sample_cone_volume, sample_cube_volume, sample_rotation_seed, sample_sphere_volume, sample_spiral_on_cone,
    ConeProfile, SpiralPath,
};

/// The independently morphing layers of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Foliage,
    Gifts,
    Baubles,
    Topper,
    CentralLight,
    Sparkles,
}

impl LayerKind {
    pub const COUNT: usize = 6;

    pub const ALL: [LayerKind; Self::COUNT] = [
        LayerKind::Foliage,
        LayerKind::Gifts,
        LayerKind::Baubles,
        LayerKind::Topper,
        LayerKind::CentralLight,
        LayerKind::Sparkles,
    ];

    /// Position in [`LayerKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Foliage => "foliage",
            LayerKind::Gifts => "gifts",
            LayerKind::Baubles => "baubles",
            LayerKind::Topper => "topper",
            LayerKind::CentralLight => "central_light",
            LayerKind::Sparkles => "sparkles",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One foliage particle, gift, bauble or topper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualElement {
    /// Position when the layer is formed.
    pub formed_position: Vec3,
    /// Position when the layer is scattered.
    pub scattered_position: Vec3,
    /// Fixed base rotation (XYZ Euler, radians).
    pub rotation_seed: Vec3,
    /// Fixed scale multiplier.
    pub base_scale: f32,
    /// Uniform value in [0, 1): gold tint selection and motion phase.
    pub random_value: f32,
}

/// Where an element sits when the layer is formed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Formation {
    /// Random fill of a cone volume, shifted so its base sits at `base_y`.
    ConeVolume {
        height: f32,
        base_radius: f32,
        base_y: f32,
    },
    /// Even placement along a spiral on the cone surface.
    Spiral {
        path: SpiralPath,
        profile: ConeProfile,
    },
    /// Uniform fill of an axis-aligned cube of edge `size` centred on the origin.
    CubeVolume { size: f32 },
    /// Every element at the same point.
    Fixed(Vec3),
}

/// Where an element goes when the layer is scattered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scatter {
    /// Uniform-by-volume sphere sample, lifted by `y_offset`.
    Sphere { radius: f32, y_offset: f32 },
    /// Scattered position equals the formed position.
    InPlace,
}

/// Scatter sphere radius for an ornament layer: heavier ornaments (lower
/// drift weight) stay closer to the tree.
pub fn ornament_scatter_radius(drift_weight: f32) -> f32 {
    5.0 + drift_weight * 2.0
}

/// Construction recipe for one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    pub kind: LayerKind,
    pub count: usize,
    pub formation: Formation,
    pub scatter: Scatter,
    /// Base scale drawn uniformly from `[min, max]`.
    pub scale_range: [f32; 2],
    /// Applied on top of the drawn scale.
    pub scale_multiplier: f32,
    /// Whether elements get a random rotation seed.
    pub random_rotation: bool,
}

impl LayerSpec {
    /// Check construction preconditions.
    pub fn validate(&self) -> Result<(), SceneError> {
        let layer = self.kind;
        if self.count == 0 {
            return Err(SceneError::EmptyLayer { layer });
        }
        let [min, max] = self.scale_range;
        if !(min <= max) {
            return Err(SceneError::InvertedScaleRange { layer, min, max });
        }

        let check = |what: &'static str, value: f32| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SceneError::InvalidDimension { layer, what, value })
            }
        };

        match self.formation {
            Formation::ConeVolume {
                height,
                base_radius,
                ..
            } => {
                check("cone height", height)?;
                check("cone base radius", base_radius)?;
            }
            Formation::Spiral { profile, .. } => {
                check("spiral base radius", profile.base_radius)?;
                if !(profile.span.is_finite() && profile.span > 0.0) {
                    return Err(SceneError::InvalidDimension {
                        layer,
                        what: "spiral span",
                        value: profile.span,
                    });
                }
            }
            Formation::CubeVolume { size } => check("cube size", size)?,
            Formation::Fixed(_) => {}
        }

        if let Scatter::Sphere { radius, .. } = self.scatter {
            check("scatter radius", radius)?;
        }
        Ok(())
    }
}

/// Immutable element set for one layer.
#[derive(Clone, Debug)]
pub struct InstanceDataset {
    kind: LayerKind,
    elements: Vec<VisualElement>,
}

impl InstanceDataset {
    /// Build `spec.count` elements. Structure is fixed by the spec; exact
    /// coordinates depend on `rng`.
    pub fn build<R: Rng + ?Sized>(spec: &LayerSpec, rng: &mut R) -> Result<Self, SceneError> {
        spec.validate()?;

        let elements = (0..spec.count)
            .map(|i| {
                let formed_position = match spec.formation {
                    Formation::ConeVolume {
                        height,
                        base_radius,
                        base_y,
                    } => {
                        let p = sample_cone_volume(rng, height, base_radius);
                        // Shift from [-h/2, h/2] so the base lands on base_y.
                        p + Vec3::new(0.0, base_y + height * 0.5, 0.0)
                    }
                    Formation::Spiral { path, profile } => {
                        sample_spiral_on_cone(i, spec.count, &path, &profile)
                    }
                    Formation::CubeVolume { size } => sample_cube_volume(rng, size),
                    Formation::Fixed(p) => p,
                };

                let scattered_position = match spec.scatter {
                    Scatter::Sphere { radius, y_offset } => {
                        sample_sphere_volume(rng, radius) + Vec3::new(0.0, y_offset, 0.0)
                    }
                    Scatter::InPlace => formed_position,
                };

                let rotation_seed = if spec.random_rotation {
                    sample_rotation_seed(rng)
                } else {
                    Vec3::ZERO
                };

                let [min, max] = spec.scale_range;
                let base_scale = (min + rng.gen::<f32>() * (max - min)) * spec.scale_multiplier;

                VisualElement {
                    formed_position,
                    scattered_position,
                    rotation_seed,
                    base_scale,
                    random_value: rng.gen::<f32>(),
                }
            })
            .collect::<Vec<_>>();

        log::debug!("Built {} {} elements", elements.len(), spec.kind);

        Ok(Self {
            kind: spec.kind,
            elements,
        })
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn elements(&self) -> &[VisualElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn foliage_spec() -> LayerSpec {
        LayerSpec {
            kind: LayerKind::Foliage,
            count: 2_000,
            formation: Formation::ConeVolume {
                height: 6.0,
                base_radius: 2.2,
                base_y: -2.5,
            },
            scatter: Scatter::Sphere {
                radius: 7.0,
                y_offset: 1.0,
            },
            scale_range: [1.0, 1.0],
            scale_multiplier: 1.0,
            random_rotation: false,
        }
    }

    fn gift_spec(count: usize) -> LayerSpec {
        LayerSpec {
            kind: LayerKind::Gifts,
            count,
            formation: Formation::Spiral {
                path: SpiralPath {
                    turns: 4.0,
                    phase: 0.0,
                    y_start: -2.0,
                    y_end: 0.5,
                },
                profile: ConeProfile {
                    base_radius: 2.0,
                    base_y: -2.5,
                    span: 6.0,
                },
            },
            scatter: Scatter::Sphere {
                radius: ornament_scatter_radius(0.5),
                y_offset: 1.0,
            },
            scale_range: [1.0, 1.5],
            scale_multiplier: 1.0,
            random_rotation: true,
        }
    }

    #[test]
    fn test_foliage_dataset_respects_volumes() {
        let mut rng = StdRng::seed_from_u64(1);
        let dataset = InstanceDataset::build(&foliage_spec(), &mut rng).unwrap();
        assert_eq!(dataset.len(), 2_000);
        assert_eq!(dataset.kind(), LayerKind::Foliage);

        for e in dataset.elements() {
            let f = e.formed_position;
            assert!(f.y >= -2.5 - 1e-5 && f.y <= 3.5 + 1e-5);
            let y_norm = (f.y + 2.5) / 6.0;
            let radial = (f.x * f.x + f.z * f.z).sqrt();
            assert!(radial <= 2.2 * (1.0 - y_norm) + 1e-4);

            let s = e.scattered_position - Vec3::new(0.0, 1.0, 0.0);
            assert!(s.length() <= 7.0 + 1e-4);

            assert_eq!(e.rotation_seed, Vec3::ZERO);
            assert!(e.random_value >= 0.0 && e.random_value < 1.0);
        }
    }

    #[test]
    fn test_ornament_scatter_radius_scales_with_drift() {
        assert_eq!(ornament_scatter_radius(0.5), 6.0);
        assert_eq!(ornament_scatter_radius(2.0), 9.0);

        let mut rng = StdRng::seed_from_u64(9);
        let dataset = InstanceDataset::build(&gift_spec(15), &mut rng).unwrap();
        for e in dataset.elements() {
            let s = e.scattered_position - Vec3::new(0.0, 1.0, 0.0);
            assert!(s.length() <= 6.0 + 1e-4);
            assert!(e.base_scale >= 1.0 && e.base_scale <= 1.5);
        }
    }

    #[test]
    fn test_same_structure_different_layout() {
        let spec = gift_spec(15);
        let a = InstanceDataset::build(&spec, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = InstanceDataset::build(&spec, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a.len(), b.len());
        // Spiral placement is deterministic, scatter is not.
        assert_eq!(a.elements()[3].formed_position, b.elements()[3].formed_position);
        assert_ne!(a.elements()[3].scattered_position, b.elements()[3].scattered_position);
    }

    #[test]
    fn test_empty_spiral_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = InstanceDataset::build(&gift_spec(0), &mut rng).unwrap_err();
        assert!(matches!(err, SceneError::EmptyLayer { layer: LayerKind::Gifts }));
    }

    #[test]
    fn test_inverted_scale_range_rejected() {
        let mut spec = gift_spec(5);
        spec.scale_range = [2.0, 1.0];
        assert!(matches!(
            spec.validate(),
            Err(SceneError::InvertedScaleRange { .. })
        ));
    }

    #[test]
    fn test_cube_layer_stays_inside() {
        let spec = LayerSpec {
            kind: LayerKind::Sparkles,
            count: 80,
            formation: Formation::CubeVolume { size: 6.0 },
            scatter: Scatter::InPlace,
            scale_range: [1.0, 1.0],
            scale_multiplier: 1.0,
            random_rotation: false,
        };
        let dataset = InstanceDataset::build(&spec, &mut StdRng::seed_from_u64(4)).unwrap();
        for e in dataset.elements() {
            assert!(e.formed_position.abs().max_element() <= 3.0);
        }
    }

    #[test]
    fn test_fixed_in_place_layer() {
        let spec = LayerSpec {
            kind: LayerKind::Topper,
            count: 1,
            formation: Formation::Fixed(Vec3::new(0.0, 3.2, 0.0)),
            scatter: Scatter::InPlace,
            scale_range: [1.0, 1.0],
            scale_multiplier: 1.0,
            random_rotation: false,
        };
        let dataset = InstanceDataset::build(&spec, &mut StdRng::seed_from_u64(0)).unwrap();
        let e = dataset.elements()[0];
        assert_eq!(e.formed_position, Vec3::new(0.0, 3.2, 0.0));
        assert_eq!(e.scattered_position, e.formed_position);
        assert_eq!(e.base_scale, 1.0);
    }
}
