//! Scene and service configuration.
//!
//! [`SceneConfig`] defaults reproduce the reference scene exactly; a JSON file
//! only needs the fields it wants to change at the top level. Nested ornament
//! sections are replaced whole.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::error::SceneError;
use crate::instance::{ornament_scatter_radius, Formation, LayerKind, LayerSpec, Scatter};
use crate::lighting::SceneLighting;
use crate::morph::SmoothingMode;
use crate::sampler::{ConeProfile, SpiralPath};
use crate::scene_graph::FloatMotion;

/// The foliage point cloud.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageConfig {
    pub count: usize,
    pub height: f32,
    pub base_radius: f32,
    /// Y of the cone base.
    pub base_y: f32,
    pub scatter_radius: f32,
    pub scatter_lift: f32,
    pub morph_rate: f32,
}

impl Default for FoliageConfig {
    fn default() -> Self {
        Self {
            count: 4000,
            height: 6.0,
            base_radius: 2.2,
            base_y: -2.5,
            scatter_radius: 7.0,
            scatter_lift: 1.0,
            morph_rate: 1.5,
        }
    }
}

/// An instanced ornament layer placed along a spiral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrnamentConfig {
    pub count: usize,
    pub path: SpiralPath,
    pub profile: ConeProfile,
    /// Heavier ornaments (lower weight) drift less and scatter closer in.
    pub drift_weight: f32,
    pub scale_range: [f32; 2],
    pub morph_rate: f32,
}

impl OrnamentConfig {
    pub fn gifts() -> Self {
        Self {
            count: 15,
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
            drift_weight: 0.5,
            scale_range: [1.0, 1.5],
            morph_rate: 2.0,
        }
    }

    pub fn baubles() -> Self {
        Self {
            count: 50,
            path: SpiralPath {
                turns: 6.5,
                phase: 1.0,
                y_start: -2.2,
                y_end: 2.8,
            },
            profile: ConeProfile {
                base_radius: 2.1,
                base_y: -2.5,
                span: 6.5,
            },
            drift_weight: 2.0,
            scale_range: [0.8, 1.2],
            morph_rate: 2.0,
        }
    }

    fn layer_spec(&self, kind: LayerKind) -> LayerSpec {
        LayerSpec {
            kind,
            count: self.count,
            formation: Formation::Spiral {
                path: self.path,
                profile: self.profile,
            },
            scatter: Scatter::Sphere {
                radius: ornament_scatter_radius(self.drift_weight),
                y_offset: 1.0,
            },
            scale_range: self.scale_range,
            scale_multiplier: 1.0,
            random_rotation: true,
        }
    }
}

/// The star on top.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopperConfig {
    pub position: Vec3,
    pub scale: f32,
    pub morph_rate: f32,
}

impl Default for TopperConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.2, 0.0),
            scale: 1.0,
            morph_rate: 4.0,
        }
    }
}

/// Ambient glitter around the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkleConfig {
    pub count: usize,
    /// Edge of the cube the sparkles fill.
    pub scale: f32,
    /// Point size in pixels.
    pub size: f32,
    pub speed: f32,
    pub color: u32,
    pub opacity_formed: f32,
    pub opacity_scattered: f32,
    pub morph_rate: f32,
}

impl Default for SparkleConfig {
    fn default() -> Self {
        Self {
            count: 80,
            scale: 6.0,
            size: 6.0,
            speed: 0.2,
            color: 0xffd700,
            opacity_formed: 0.6,
            opacity_scattered: 0.2,
            morph_rate: 2.0,
        }
    }
}

impl SparkleConfig {
    pub fn opacity_at(&self, progress: f32) -> f32 {
        self.opacity_scattered + (self.opacity_formed - self.opacity_scattered) * progress
    }
}

/// Transform of the group every layer hangs from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub position: Vec3,
    /// Radians per second of Y rotation while formed.
    pub idle_rotation_speed: f32,
    pub float_motion: FloatMotion,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -1.0, 0.0),
            idle_rotation_speed: 0.05,
            float_motion: FloatMotion::default(),
        }
    }
}

/// Everything needed to build a [`crate::tree::TreeScene`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub initially_formed: bool,
    pub smoothing: SmoothingMode,
    /// Ornament drift while scattered. Off gives the bare morph pose.
    pub secondary_motion: bool,
    pub foliage: FoliageConfig,
    pub gifts: OrnamentConfig,
    pub baubles: OrnamentConfig,
    pub topper: TopperConfig,
    pub central_light_rate: f32,
    pub sparkles: SparkleConfig,
    pub group: GroupConfig,
    pub lighting: SceneLighting,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            initially_formed: true,
            smoothing: SmoothingMode::default(),
            secondary_motion: true,
            foliage: FoliageConfig::default(),
            gifts: OrnamentConfig::gifts(),
            baubles: OrnamentConfig::baubles(),
            topper: TopperConfig::default(),
            central_light_rate: 3.0,
            sparkles: SparkleConfig::default(),
            group: GroupConfig::default(),
            lighting: SceneLighting::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scene config {}", path.display()))?;
        Ok(config)
    }

    /// Morph rate per layer.
    pub fn morph_rate(&self, layer: LayerKind) -> f32 {
        match layer {
            LayerKind::Foliage => self.foliage.morph_rate,
            LayerKind::Gifts => self.gifts.morph_rate,
            LayerKind::Baubles => self.baubles.morph_rate,
            LayerKind::Topper => self.topper.morph_rate,
            LayerKind::CentralLight => self.central_light_rate,
            LayerKind::Sparkles => self.sparkles.morph_rate,
        }
    }

    /// Drift weight per layer; zero for layers that do not drift.
    pub fn drift_weight(&self, layer: LayerKind) -> f32 {
        match layer {
            LayerKind::Gifts => self.gifts.drift_weight,
            LayerKind::Baubles => self.baubles.drift_weight,
            _ => 0.0,
        }
    }

    /// Construction recipes for every layer that owns elements.
    pub fn layer_specs(&self) -> Vec<LayerSpec> {
        let foliage = &self.foliage;
        vec![
            LayerSpec {
                kind: LayerKind::Foliage,
                count: foliage.count,
                formation: Formation::ConeVolume {
                    height: foliage.height,
                    base_radius: foliage.base_radius,
                    base_y: foliage.base_y,
                },
                scatter: Scatter::Sphere {
                    radius: foliage.scatter_radius,
                    y_offset: foliage.scatter_lift,
                },
                scale_range: [1.0, 1.0],
                scale_multiplier: 1.0,
                random_rotation: false,
            },
            self.gifts.layer_spec(LayerKind::Gifts),
            self.baubles.layer_spec(LayerKind::Baubles),
            LayerSpec {
                kind: LayerKind::Topper,
                count: 1,
                formation: Formation::Fixed(self.topper.position),
                scatter: Scatter::InPlace,
                scale_range: [self.topper.scale, self.topper.scale],
                scale_multiplier: 1.0,
                random_rotation: false,
            },
            LayerSpec {
                kind: LayerKind::Sparkles,
                count: self.sparkles.count,
                formation: Formation::CubeVolume {
                    size: self.sparkles.scale,
                },
                scatter: Scatter::InPlace,
                scale_range: [self.sparkles.size, self.sparkles.size],
                scale_multiplier: 1.0,
                random_rotation: false,
            },
        ]
    }

    /// Check every layer recipe and morph rate.
    pub fn validate(&self) -> Result<(), SceneError> {
        for layer in LayerKind::ALL {
            let rate = self.morph_rate(layer);
            if !(rate.is_finite() && rate > 0.0) {
                return Err(SceneError::InvalidMorphRate { layer, rate });
            }
        }
        for spec in self.layer_specs() {
            spec.validate()?;
        }
        Ok(())
    }
}

/// Default Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Settings for the blessing service client.
#[derive(Clone, Debug, PartialEq)]
pub struct BlessingConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for BlessingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.8,
            timeout: Duration::from_secs(30),
        }
    }
}

impl BlessingConfig {
    /// Read the API key from `API_KEY`, falling back to `GEMINI_API_KEY`.
    /// Blank values count as missing.
    pub fn from_env() -> Self {
        let api_key = ["API_KEY", "GEMINI_API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty());
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.initially_formed);
        // Foliage lags behind the ornaments.
        assert!(config.morph_rate(LayerKind::Foliage) < config.morph_rate(LayerKind::Gifts));
    }

    #[test]
    fn test_layer_specs_cover_element_layers() {
        let specs = SceneConfig::default().layer_specs();
        let counts: Vec<_> = specs.iter().map(|s| (s.kind, s.count)).collect();
        assert_eq!(
            counts,
            [
                (LayerKind::Foliage, 4000),
                (LayerKind::Gifts, 15),
                (LayerKind::Baubles, 50),
                (LayerKind::Topper, 1),
                (LayerKind::Sparkles, 80),
            ]
        );
        match specs[2].scatter {
            Scatter::Sphere { radius, y_offset } => {
                assert_eq!(radius, 9.0);
                assert_eq!(y_offset, 1.0);
            }
            Scatter::InPlace => panic!("baubles must scatter"),
        }
    }

    #[test]
    fn test_partial_json_overrides_top_level() {
        let config: SceneConfig =
            serde_json::from_str(r#"{"initially_formed": false, "foliage": {"count": 10}}"#)
                .unwrap();
        assert!(!config.initially_formed);
        assert_eq!(config.foliage.count, 10);
        assert_eq!(config.foliage.morph_rate, 1.5);
        assert_eq!(config.baubles, OrnamentConfig::baubles());
    }

    #[test]
    fn test_bad_rate_rejected() {
        let mut config = SceneConfig::default();
        config.central_light_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SceneError::InvalidMorphRate {
                layer: LayerKind::CentralLight,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_gifts_rejected() {
        let mut config = SceneConfig::default();
        config.gifts.count = 0;
        assert!(matches!(
            config.validate(),
            Err(SceneError::EmptyLayer {
                layer: LayerKind::Gifts
            })
        ));
    }

    #[test]
    fn test_sparkle_opacity() {
        let sparkles = SparkleConfig::default();
        assert!((sparkles.opacity_at(0.0) - 0.2).abs() < 1e-6);
        assert!((sparkles.opacity_at(1.0) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_blessing_defaults() {
        let config = BlessingConfig::default().with_api_key("k");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.temperature, 0.8);
        assert!(config.has_api_key());
    }
}
