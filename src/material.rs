//! Physical materials for the tree layers.
//!
//! Materials are fixed by the host: the gold and emerald palette of the
//! original scene plus the additive foliage material. The render adapter
//! looks them up by id and maps them onto its own pipelines.

use std::collections::HashMap;
use std::sync::Arc;

use crate::instance::LayerKind;

/// Unique identifier for a material.
pub type MaterialId = &'static str;

/// sRGB color with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };

    /// Parse a `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// sRGB -> linear, per component.
    pub fn to_linear(&self) -> Self {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
        }
    }

    pub fn with_alpha(&self, a: f32) -> [f32; 4] {
        [self.r, self.g, self.b, a]
    }
}

/// Blend modes for materials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Additive blending (glowing particles).
    Additive,
}

impl BlendMode {
    /// Convert to wgpu blend state.
    pub fn to_blend_state(&self) -> wgpu::BlendState {
        match self {
            BlendMode::Opaque => wgpu::BlendState::REPLACE,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Physically based surface description.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    /// Skip tone mapping so the surface can exceed the bloom threshold.
    pub tone_mapped: bool,
    pub blend_mode: BlendMode,
    pub depth_write: bool,
}

impl Material {
    /// Create a new material builder.
    pub fn builder(id: MaterialId) -> MaterialBuilder {
        MaterialBuilder::new(id)
    }

    /// Linear-space emission (color times intensity).
    pub fn emission(&self) -> [f32; 3] {
        let e = self.emissive.to_linear();
        [
            e.r * self.emissive_intensity,
            e.g * self.emissive_intensity,
            e.b * self.emissive_intensity,
        ]
    }
}

/// Builder for creating materials.
pub struct MaterialBuilder {
    material: Material,
}

impl MaterialBuilder {
    pub fn new(id: MaterialId) -> Self {
        Self {
            material: Material {
                id,
                color: Color::from_hex(0xffffff),
                emissive: Color::BLACK,
                emissive_intensity: 1.0,
                metalness: 0.0,
                roughness: 1.0,
                clearcoat: 0.0,
                clearcoat_roughness: 0.0,
                tone_mapped: true,
                blend_mode: BlendMode::Opaque,
                depth_write: true,
            },
        }
    }

    pub fn color(mut self, hex: u32) -> Self {
        self.material.color = Color::from_hex(hex);
        self
    }

    pub fn emissive(mut self, hex: u32, intensity: f32) -> Self {
        self.material.emissive = Color::from_hex(hex);
        self.material.emissive_intensity = intensity;
        self
    }

    pub fn metal_rough(mut self, metalness: f32, roughness: f32) -> Self {
        self.material.metalness = metalness;
        self.material.roughness = roughness;
        self
    }

    pub fn clearcoat(mut self, amount: f32, roughness: f32) -> Self {
        self.material.clearcoat = amount;
        self.material.clearcoat_roughness = roughness;
        self
    }

    pub fn tone_mapped(mut self, tone_mapped: bool) -> Self {
        self.material.tone_mapped = tone_mapped;
        self
    }

    pub fn blend_mode(mut self, mode: BlendMode) -> Self {
        self.material.blend_mode = mode;
        self
    }

    pub fn depth_write(mut self, write: bool) -> Self {
        self.material.depth_write = write;
        self
    }

    pub fn build(self) -> Material {
        self.material
    }
}

/// All materials the tree uses.
pub struct MaterialRegistry {
    materials: HashMap<MaterialId, Arc<Material>>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            materials: HashMap::new(),
        };
        registry.register_builtin_materials();
        registry
    }

    fn register_builtin_materials(&mut self) {
        self.register(
            Material::builder("gold")
                .color(0xffd700)
                .emissive(0xb8860b, 0.2)
                .metal_rough(1.0, 0.1)
                .clearcoat(1.0, 0.1)
                .build(),
        );

        self.register(
            Material::builder("emerald")
                .color(0x002b15)
                .emissive(0x001a0d, 0.2)
                .metal_rough(0.4, 0.2)
                .clearcoat(1.0, 0.1)
                .build(),
        );

        // Lighter emerald for gifts
        self.register(
            Material::builder("gift_wrap")
                .color(0x053b23)
                .emissive(0x000000, 1.0)
                .metal_rough(0.1, 0.3)
                .clearcoat(0.5, 0.0)
                .build(),
        );

        self.register(
            Material::builder("topper_gold")
                .color(0xffd700)
                .emissive(0xffd700, 2.0)
                .metal_rough(1.0, 0.1)
                .clearcoat(1.0, 0.1)
                .tone_mapped(false)
                .build(),
        );

        self.register(
            Material::builder("light_orb")
                .color(0xfff8e7)
                .emissive(0xfff8e7, 4.0)
                .tone_mapped(false)
                .build(),
        );

        self.register(
            Material::builder("foliage")
                .color(0x004d26)
                .blend_mode(BlendMode::Additive)
                .depth_write(false)
                .build(),
        );
    }

    pub fn register(&mut self, material: Material) {
        self.materials.insert(material.id, Arc::new(material));
    }

    pub fn get(&self, id: &str) -> Option<Arc<Material>> {
        self.materials.get(id).cloned()
    }

    /// Material used to draw a layer, if the layer is drawn as geometry.
    pub fn for_layer(&self, layer: LayerKind) -> Option<Arc<Material>> {
        let id = match layer {
            LayerKind::Foliage => "foliage",
            LayerKind::Gifts => "gift_wrap",
            LayerKind::Baubles => "gold",
            LayerKind::Topper => "topper_gold",
            LayerKind::CentralLight | LayerKind::Sparkles => return None,
        };
        self.get(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.materials.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        let gold = Color::from_hex(0xffd700);
        assert_eq!(gold.r, 1.0);
        assert!((gold.g - 215.0 / 255.0).abs() < 1e-6);
        assert_eq!(gold.b, 0.0);
    }

    #[test]
    fn test_linear_conversion_endpoints() {
        let white = Color::from_hex(0xffffff).to_linear();
        assert!((white.r - 1.0).abs() < 1e-6);
        let black = Color::BLACK.to_linear();
        assert_eq!(black.r, 0.0);
        // Mid grey darkens in linear space.
        let grey = Color::from_hex(0x808080).to_linear();
        assert!(grey.r < 0.25 && grey.r > 0.2);
    }

    #[test]
    fn test_registry_covers_drawn_layers() {
        let registry = MaterialRegistry::new();
        assert_eq!(registry.len(), 6);
        for layer in [
            LayerKind::Foliage,
            LayerKind::Gifts,
            LayerKind::Baubles,
            LayerKind::Topper,
        ] {
            assert!(registry.for_layer(layer).is_some(), "{} has no material", layer);
        }
        assert!(registry.for_layer(LayerKind::CentralLight).is_none());
    }

    #[test]
    fn test_foliage_is_additive_without_depth_write() {
        let registry = MaterialRegistry::new();
        let foliage = registry.get("foliage").unwrap();
        assert_eq!(foliage.blend_mode, BlendMode::Additive);
        assert!(!foliage.depth_write);
    }

    #[test]
    fn test_topper_glows_past_tone_mapping() {
        let registry = MaterialRegistry::new();
        let topper = registry.get("topper_gold").unwrap();
        assert!(!topper.tone_mapped);
        assert!(topper.emission()[0] >= 2.0 - 1e-6);
    }
}
