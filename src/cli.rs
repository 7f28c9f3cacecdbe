use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::blessing::BlessingClient;
use crate::config::{BlessingConfig, SceneConfig};
use crate::instance::LayerKind;
use crate::material::MaterialRegistry;
use crate::post_processing::{PostEffectRegistry, PostProcessingChain};
use crate::scene_state::{overlay_view, BlessingFlow, OverlayView, Panel, SceneState};
use crate::tree::TreeScene;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the morph engine headless and report layer progress
    Simulate {
        /// Number of frames to step
        #[arg(long, default_value_t = 300)]
        frames: usize,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Start scattered instead of formed
        #[arg(long)]
        scattered: bool,

        /// Toggle the display state before this frame
        #[arg(long)]
        toggle_at: Option<usize>,

        /// Scene config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print one JSON snapshot per frame
        #[arg(long)]
        json: bool,
    },
    /// Request one blessing and print the overlay
    Bless {
        /// Name to address the blessing to
        #[arg(long)]
        name: Option<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            frames,
            fps,
            scattered,
            toggle_at,
            config,
            json,
        } => simulate(frames, fps, scattered, toggle_at, config, json),
        Commands::Bless { name } => bless(name),
    }
}

fn simulate(
    frames: usize,
    fps: f32,
    scattered: bool,
    toggle_at: Option<usize>,
    config_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    anyhow::ensure!(fps > 0.0, "--fps must be positive");

    let mut config = match config_path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if scattered {
        config.initially_formed = false;
    }

    let mut state = SceneState::new(config.initially_formed);
    let mut tree = TreeScene::new(config).context("Failed to build tree scene")?;

    for drawable in tree.drawables(&MaterialRegistry::new()) {
        log::info!(
            "{}: {} instances, {} triangles, material {}",
            drawable.layer,
            drawable.instances,
            drawable.mesh.triangle_count(),
            drawable.material.id
        );
    }
    let post = PostProcessingChain::tree_default().build_params_map(&PostEffectRegistry::new());
    log::debug!("Post chain: {:?}", post);

    let dt = 1.0 / fps;
    let report_every = (fps.round() as usize).max(1);

    for frame in 0..frames {
        if toggle_at == Some(frame) {
            state.toggle();
            log::info!("Frame {}: toggled to {}", frame, overlay_view(&state).toggle_label);
        }
        tree.advance(&state, dt);

        if json {
            println!("{}", serde_json::to_string(&tree.snapshot())?);
        } else if frame % report_every == 0 {
            log::info!("{}", progress_line(&tree));
        }
    }

    if !json {
        println!(
            "After {} frames ({:.2}s): {}",
            frames,
            tree.elapsed(),
            progress_line(&tree)
        );
        println!(
            "Settled: {}  central light {:.2}  sparkle opacity {:.2}",
            tree.is_settled(),
            tree.output().central_light_intensity,
            tree.output().sparkle_opacity
        );
    }
    Ok(())
}

fn progress_line(tree: &TreeScene) -> String {
    LayerKind::ALL
        .iter()
        .map(|&layer| format!("{}={:.3}", layer, tree.progress(layer)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bless(name: Option<String>) -> Result<()> {
    let client = BlessingClient::gemini(BlessingConfig::from_env());
    let state = Rc::new(RefCell::new(SceneState::default()));
    let flow = BlessingFlow::new(Rc::clone(&state), client);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let pending = flow.request_blessing(name);
    print_overlay(&overlay_view(&state.borrow()));
    runtime.block_on(pending);
    print_overlay(&overlay_view(&state.borrow()));
    Ok(())
}

fn print_overlay(view: &OverlayView) {
    println!("[{}] [{}]", view.info_label, view.toggle_label);
    if let Some(info) = view.info_panel {
        println!("  {}: {}", info.title, info.body);
    }
    match &view.panel {
        Panel::Empty => {}
        Panel::Loading { text } => println!("  {}", text),
        Panel::Blessing {
            blessing,
            again_label,
        } => {
            println!("  \"{}\"", blessing.message);
            println!("  mood: {}", blessing.mood);
            println!("  [{}]", again_label);
        }
    }
    if let Some(label) = view.request_button {
        println!("  [{}]", label);
    }
}
