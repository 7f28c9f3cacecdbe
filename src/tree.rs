//! The morphing tree: layer datasets, per-layer morph state and the frame step.
//!
//! [`TreeScene::advance`] is the per-frame callback: it retargets the layers
//! from the shared [`SceneState`] and then runs [`TreeScene::update`], which
//! advances every layer's
//! progress, integrates spin, moves the group and camera, and fills a
//! [`FrameOutput`] with everything the render adapter needs: foliage
//! uniforms, per-instance world matrices for the ornament layers, and the
//! light/sparkle scalars. Nothing in here suspends or allocates per frame
//! once the instance buffers have grown to size.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use rand::Rng;
use serde::Serialize;

use crate::camera::OrbitCamera;
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::foliage::{build_vertices, FoliageUniforms, FoliageVertex};
use crate::gpu::mesh::{self, MeshData};
use crate::instance::{InstanceDataset, LayerKind};
use crate::instance_eval::{evaluate_layer, spin_speed, GpuInstanceTransform, MorphFrame, ScaleLaw};
use crate::lighting::LightingUniforms;
use crate::material::{Material, MaterialRegistry};
use crate::morph::MorphController;
use crate::scene_graph::TreeGroup;
use crate::scene_state::SceneState;

/// Morph state plus integrated spin for one layer.
#[derive(Clone, Copy, Debug)]
struct LayerMorph {
    morph: MorphController,
    spin_phase: f32,
}

impl LayerMorph {
    fn step(&mut self, dt: f32) {
        let progress = self.morph.step(dt);
        if dt > 0.0 {
            self.spin_phase += spin_speed(progress) * dt;
        }
    }
}

/// Per-frame results handed to the render adapter.
#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    pub time: f32,
    /// World matrix of the tree group (foliage model matrix).
    pub group_matrix: Mat4,
    pub foliage: FoliageUniforms,
    pub gifts: Vec<GpuInstanceTransform>,
    pub baubles: Vec<GpuInstanceTransform>,
    pub topper: Vec<GpuInstanceTransform>,
    pub central_light_intensity: f32,
    pub sparkle_opacity: f32,
    pub lighting: LightingUniforms,
}

/// Serializable summary of one layer.
#[derive(Clone, Debug, Serialize)]
pub struct LayerSnapshot {
    pub layer: LayerKind,
    pub progress: f32,
    pub target: f32,
    pub settled: bool,
    pub elements: usize,
}

/// Serializable summary of the scene for headless runs.
#[derive(Clone, Debug, Serialize)]
pub struct SceneSnapshot {
    pub time: f32,
    pub formed: bool,
    pub layers: Vec<LayerSnapshot>,
    pub central_light_intensity: f32,
    pub sparkle_opacity: f32,
    pub camera_azimuth: f32,
}

/// Mesh, material and instance count for one instanced layer.
#[derive(Clone, Debug)]
pub struct Drawable {
    pub layer: LayerKind,
    pub mesh: MeshData,
    pub material: Arc<Material>,
    pub instances: usize,
}

pub struct TreeScene {
    config: SceneConfig,
    foliage: InstanceDataset,
    gifts: InstanceDataset,
    baubles: InstanceDataset,
    topper: InstanceDataset,
    sparkles: InstanceDataset,
    layers: [LayerMorph; LayerKind::COUNT],
    group: TreeGroup,
    camera: OrbitCamera,
    elapsed: f32,
    output: FrameOutput,
}

impl TreeScene {
    /// Build the scene with a fresh random layout.
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Build the scene drawing every random value from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(config: SceneConfig, rng: &mut R) -> Result<Self, SceneError> {
        config.validate()?;

        let mut datasets = Vec::with_capacity(5);
        for spec in config.layer_specs() {
            datasets.push(InstanceDataset::build(&spec, rng)?);
        }
        let mut datasets = datasets.into_iter();
        let mut next = |layer: LayerKind| {
            datasets
                .next()
                .filter(|d| d.kind() == layer)
                .ok_or(SceneError::EmptyLayer { layer })
        };
        let foliage = next(LayerKind::Foliage)?;
        let gifts = next(LayerKind::Gifts)?;
        let baubles = next(LayerKind::Baubles)?;
        let topper = next(LayerKind::Topper)?;
        let sparkles = next(LayerKind::Sparkles)?;

        log::info!(
            "Tree built: {} foliage, {} gifts, {} baubles, {} sparkles",
            foliage.len(),
            gifts.len(),
            baubles.len(),
            sparkles.len()
        );

        let formed = config.initially_formed;
        let layers = LayerKind::ALL.map(|layer| LayerMorph {
            morph: MorphController::new(config.morph_rate(layer), formed, config.smoothing),
            spin_phase: 0.0,
        });

        let group = TreeGroup::new(
            config.group.position,
            config.group.idle_rotation_speed,
            config.group.float_motion,
        );
        let camera = OrbitCamera::new(config.camera.clone());

        let mut scene = Self {
            config,
            foliage,
            gifts,
            baubles,
            topper,
            sparkles,
            layers,
            group,
            camera,
            elapsed: 0.0,
            output: FrameOutput::default(),
        };
        // Populate the output so the first frame can render before any step.
        scene.update(0.0);
        Ok(scene)
    }

    /// Retarget every layer. Progress is untouched; it chases the target on
    /// subsequent updates.
    pub fn set_formed(&mut self, formed: bool) {
        if formed != self.is_formed() {
            log::debug!("Tree target -> {}", if formed { "formed" } else { "scattered" });
        }
        for layer in &mut self.layers {
            layer.morph.set_formed(formed);
        }
    }

    pub fn toggle(&mut self) -> bool {
        let formed = !self.is_formed();
        self.set_formed(formed);
        formed
    }

    /// Current target, shared by every layer.
    pub fn is_formed(&self) -> bool {
        self.layers[LayerKind::Foliage.index()].morph.is_formed_target()
    }

    /// Follow the display state of `state`.
    pub fn sync(&mut self, state: &SceneState) {
        self.set_formed(state.is_formed());
    }

    /// Frame step driven by the shared scene state: picks up toggles and
    /// blessing requests made since the last frame, then advances by `dt`.
    pub fn advance(&mut self, state: &SceneState, dt: f32) -> &FrameOutput {
        self.sync(state);
        self.update(dt)
    }

    /// Advance by `dt` seconds and evaluate the frame.
    pub fn update(&mut self, dt: f32) -> &FrameOutput {
        if dt > 0.0 {
            self.elapsed += dt;
        }
        for layer in &mut self.layers {
            layer.step(dt);
        }
        let formed = self.is_formed();
        self.group.update(self.elapsed, formed);
        self.camera.update(dt, formed);

        let group_matrix = self.group.matrix();
        let time = self.elapsed;
        let out = &mut self.output;
        out.time = time;
        out.group_matrix = group_matrix;
        out.foliage = FoliageUniforms::new(time, self.layers[LayerKind::Foliage.index()].morph.progress());

        for (layer, dataset, buffer) in [
            (LayerKind::Gifts, &self.gifts, &mut out.gifts),
            (LayerKind::Baubles, &self.baubles, &mut out.baubles),
        ] {
            let state = self.layers[layer.index()];
            let frame = MorphFrame {
                progress: state.morph.progress(),
                time,
                spin_phase: state.spin_phase,
                drift_weight: self.config.drift_weight(layer),
                scale_law: ScaleLaw::Grow,
                secondary_motion: self.config.secondary_motion,
            };
            evaluate_layer(dataset.elements(), &frame, &group_matrix, buffer);
        }

        // The star neither spins nor drifts; it only grows in.
        let topper_frame = MorphFrame {
            progress: self.layers[LayerKind::Topper.index()].morph.progress(),
            time,
            spin_phase: 0.0,
            drift_weight: 0.0,
            scale_law: ScaleLaw::Vanish,
            secondary_motion: false,
        };
        evaluate_layer(self.topper.elements(), &topper_frame, &group_matrix, &mut out.topper);

        let light_progress = self.layers[LayerKind::CentralLight.index()].morph.progress();
        let lighting = &self.config.lighting;
        out.central_light_intensity = lighting.central_intensity(light_progress);
        out.lighting = lighting.to_uniforms(light_progress, group_matrix.transform_point3(Vec3::ZERO));

        let sparkle_progress = self.layers[LayerKind::Sparkles.index()].morph.progress();
        out.sparkle_opacity = self.config.sparkles.opacity_at(sparkle_progress);

        &self.output
    }

    /// Result of the most recent [`TreeScene::update`].
    pub fn output(&self) -> &FrameOutput {
        &self.output
    }

    pub fn progress(&self, layer: LayerKind) -> f32 {
        self.layers[layer.index()].morph.progress()
    }

    /// Every layer within the settle epsilon of its target.
    pub fn is_settled(&self) -> bool {
        self.layers.iter().all(|l| l.morph.is_settled())
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn dataset(&self, layer: LayerKind) -> Option<&InstanceDataset> {
        match layer {
            LayerKind::Foliage => Some(&self.foliage),
            LayerKind::Gifts => Some(&self.gifts),
            LayerKind::Baubles => Some(&self.baubles),
            LayerKind::Topper => Some(&self.topper),
            LayerKind::Sparkles => Some(&self.sparkles),
            LayerKind::CentralLight => None,
        }
    }

    /// Static foliage vertex buffer contents.
    pub fn foliage_vertices(&self) -> Vec<FoliageVertex> {
        build_vertices(self.foliage.elements())
    }

    /// Meshes and materials of the instanced layers.
    pub fn drawables(&self, materials: &MaterialRegistry) -> Vec<Drawable> {
        [
            (LayerKind::Gifts, mesh::gift_box(), self.gifts.len()),
            (LayerKind::Baubles, mesh::bauble(), self.baubles.len()),
            (LayerKind::Topper, mesh::topper(), self.topper.len()),
        ]
        .into_iter()
        .filter_map(|(layer, mesh, instances)| {
            let material = materials.for_layer(layer)?;
            Some(Drawable {
                layer,
                mesh,
                material,
                instances,
            })
        })
        .collect()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let layers = LayerKind::ALL
            .iter()
            .map(|&layer| {
                let morph = &self.layers[layer.index()].morph;
                LayerSnapshot {
                    layer,
                    progress: morph.progress(),
                    target: morph.target(),
                    settled: morph.is_settled(),
                    elements: self.dataset(layer).map_or(0, |d| d.len()),
                }
            })
            .collect();
        SceneSnapshot {
            time: self.elapsed,
            formed: self.is_formed(),
            layers,
            central_light_intensity: self.output.central_light_intensity,
            sparkle_opacity: self.output.sparkle_opacity,
            camera_azimuth: self.camera.azimuth(),
        }
    }
}
