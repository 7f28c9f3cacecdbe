//! Post-processing effect chain.
//!
//! Effect definitions live in a [`PostEffectRegistry`] with parameter
//! defaults and ranges; a [`PostProcessingChain`] is an ordered list of
//! instances that override parameters by name. The renderer walks the
//! enabled effects in order.

use std::collections::HashMap;

/// Unique identifier for a post-processing effect.
pub type EffectId = String;

/// Runtime value for an effect parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectParamValue {
    Float(f32),
    Vec4([f32; 4]),
}

impl Default for EffectParamValue {
    fn default() -> Self {
        EffectParamValue::Float(0.0)
    }
}

impl EffectParamValue {
    /// Convert to bytes for GPU upload.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            EffectParamValue::Float(v) => bytemuck::cast_slice(&[*v]).to_vec(),
            EffectParamValue::Vec4(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }

    /// Get as float.
    pub fn as_float(&self) -> f32 {
        match self {
            EffectParamValue::Float(v) => *v,
            EffectParamValue::Vec4(v) => v[0],
        }
    }
}

/// Definition of an effect parameter.
#[derive(Clone, Debug)]
pub struct EffectParamDef {
    pub name: String,
    pub default_value: EffectParamValue,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub description: String,
}

impl EffectParamDef {
    pub fn float(name: impl Into<String>, default: f32) -> Self {
        Self {
            name: name.into(),
            default_value: EffectParamValue::Float(default),
            min: None,
            max: None,
            description: String::new(),
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Clamp a float value into this parameter's range.
    pub fn clamp(&self, value: EffectParamValue) -> EffectParamValue {
        match value {
            EffectParamValue::Float(v) => {
                let lo = self.min.unwrap_or(f32::NEG_INFINITY);
                let hi = self.max.unwrap_or(f32::INFINITY);
                EffectParamValue::Float(v.clamp(lo, hi))
            }
            other => other,
        }
    }
}

/// Definition of a post-processing effect.
#[derive(Clone, Debug)]
pub struct PostEffect {
    pub id: EffectId,
    pub name: String,
    pub description: String,
    pub params: Vec<EffectParamDef>,
}

impl PostEffect {
    /// Create a new effect builder.
    pub fn builder(id: impl Into<String>) -> PostEffectBuilder {
        PostEffectBuilder::new(id)
    }

    /// Get the default value for a parameter.
    pub fn get_default(&self, name: &str) -> Option<&EffectParamValue> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.default_value)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

/// Builder for post-processing effects.
pub struct PostEffectBuilder {
    id: String,
    name: String,
    description: String,
    params: Vec<EffectParamDef>,
}

impl PostEffectBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            params: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn param(mut self, param: EffectParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn build(self) -> PostEffect {
        PostEffect {
            id: self.id,
            name: self.name,
            description: self.description,
            params: self.params,
        }
    }
}

/// Runtime instance of a post-processing effect.
#[derive(Clone, Debug, Default)]
pub struct PostEffectInstance {
    pub effect_id: EffectId,
    pub enabled: bool,
    /// Overrides; anything missing falls back to the definition default.
    pub params: HashMap<String, EffectParamValue>,
}

impl PostEffectInstance {
    pub fn new(effect_id: impl Into<String>) -> Self {
        Self {
            effect_id: effect_id.into(),
            enabled: true,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f32) -> Self {
        self.params.insert(name.into(), EffectParamValue::Float(value));
        self
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: EffectParamValue) {
        self.params.insert(name.into(), value);
    }

    pub fn get_param(&self, name: &str) -> Option<&EffectParamValue> {
        self.params.get(name)
    }
}

/// The post-processing chain - ordered list of effects to apply.
#[derive(Clone, Debug, Default)]
pub struct PostProcessingChain {
    pub effects: Vec<PostEffectInstance>,
}

impl PostProcessingChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bloom, then vignette, then film noise.
    pub fn tree_default() -> Self {
        let mut chain = Self::new();
        chain.add(
            PostEffectInstance::new("bloom")
                .with_param("threshold", 1.1)
                .with_param("intensity", 1.2)
                .with_param("radius", 0.6),
        );
        chain.add(
            PostEffectInstance::new("vignette")
                .with_param("offset", 0.1)
                .with_param("darkness", 0.8),
        );
        chain.add(PostEffectInstance::new("noise").with_param("opacity", 0.05));
        chain
    }

    pub fn add(&mut self, effect: PostEffectInstance) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Get enabled effects in order.
    pub fn enabled_effects(&self) -> impl Iterator<Item = &PostEffectInstance> {
        self.effects.iter().filter(|e| e.enabled)
    }

    pub fn set_enabled(&mut self, effect_id: &str, enabled: bool) {
        for effect in &mut self.effects {
            if effect.effect_id == effect_id {
                effect.enabled = enabled;
            }
        }
    }

    pub fn get(&self, effect_id: &str) -> Option<&PostEffectInstance> {
        self.effects.iter().find(|e| e.effect_id == effect_id)
    }

    /// Resolved parameters per enabled effect, in definition order, clamped
    /// to each parameter's range. Unknown effects are skipped with a warning.
    pub fn build_params_map(
        &self,
        registry: &PostEffectRegistry,
    ) -> HashMap<String, Vec<EffectParamValue>> {
        let mut result = HashMap::new();
        for effect in self.enabled_effects() {
            let Some(def) = registry.get(&effect.effect_id) else {
                log::warn!("Unknown post effect '{}' skipped", effect.effect_id);
                continue;
            };
            let params = def
                .params
                .iter()
                .map(|param_def| {
                    let value = effect
                        .params
                        .get(&param_def.name)
                        .cloned()
                        .unwrap_or_else(|| param_def.default_value.clone());
                    param_def.clamp(value)
                })
                .collect();
            result.insert(effect.effect_id.clone(), params);
        }
        result
    }
}

/// Registry of available post-processing effects.
pub struct PostEffectRegistry {
    effects: HashMap<EffectId, PostEffect>,
}

impl PostEffectRegistry {
    /// Create a new registry with built-in effects.
    pub fn new() -> Self {
        let mut registry = Self {
            effects: HashMap::new(),
        };
        registry.register_builtin_effects();
        registry
    }

    fn register_builtin_effects(&mut self) {
        // Mipmap-blurred bloom over an HDR buffer
        self.register(
            PostEffect::builder("bloom")
                .name("Bloom")
                .description("Glow around pixels brighter than the threshold")
                .param(
                    EffectParamDef::float("threshold", 0.9)
                        .with_range(0.0, 4.0)
                        .with_description("Luminance threshold"),
                )
                .param(
                    EffectParamDef::float("intensity", 1.0)
                        .with_range(0.0, 4.0)
                        .with_description("Bloom intensity"),
                )
                .param(
                    EffectParamDef::float("radius", 0.85)
                        .with_range(0.0, 1.0)
                        .with_description("Mip blur radius"),
                )
                .build(),
        );

        self.register(
            PostEffect::builder("vignette")
                .name("Vignette")
                .description("Darkens edges of the frame")
                .param(EffectParamDef::float("offset", 0.5).with_range(0.0, 1.0))
                .param(EffectParamDef::float("darkness", 0.5).with_range(0.0, 1.0))
                .build(),
        );

        self.register(
            PostEffect::builder("noise")
                .name("Noise")
                .description("Film grain")
                .param(EffectParamDef::float("opacity", 1.0).with_range(0.0, 1.0))
                .build(),
        );
    }

    pub fn register(&mut self, effect: PostEffect) {
        self.effects.insert(effect.id.clone(), effect);
    }

    pub fn get(&self, id: &str) -> Option<&PostEffect> {
        self.effects.get(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.effects.contains_key(id)
    }
}

impl Default for PostEffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}
