//! Render command implementation
//!
//! Reads a JSON scene, draws it and writes the result.

use anyhow::{Context, Result};
use swraster_render::RasterEngine;

use crate::cli::RenderArgs;
use crate::scene::Scene;

pub fn run(args: &RenderArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("Failed to read scene {}", args.scene.display()))?;
    let scene = Scene::from_json(&text).with_context(|| format!("In {}", args.scene.display()))?;
    log::info!(
        "Scene {}: {}x{}, {} commands",
        args.scene.display(),
        scene.width,
        scene.height,
        scene.commands.len()
    );

    let engine = RasterEngine::new(super::resolve_config(&args.raster));
    let surface = scene.render(&engine)?;
    engine.dump_surface("scene", &surface)?;
    super::write_output(&surface, &args.output)
}
