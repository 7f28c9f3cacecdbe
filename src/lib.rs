pub mod error;
pub mod config;

// Morph core
pub mod sampler;
pub mod instance;
pub mod morph;
pub mod instance_eval;
pub mod scene_graph;
pub mod tree;

// Rendering description
pub mod gpu;
pub mod foliage;
pub mod material;
pub mod lighting;
pub mod post_processing;
pub mod camera;

// Blessing flow and overlay
pub mod blessing;
pub mod scene_state;

pub mod cli;
