//! Loads a scene headlessly and prints what the viewer's status bar would show.
//!
//! Usage: `scene-stats <model file> [config.toml]`

use std::time::Duration;

use anyhow::{Context, bail};
use scene_core::{
    Scene,
    config::SceneConfig,
    data_structures::{bounds::BoundingBox, graph::ImportedScene},
    render::{Camera, RenderBackend, RenderFrame, Renderer, UiOptions},
    resources::texture::{TextureState, TextureStore},
};

/// Renderer that only logs what it would draw.
struct HeadlessRenderer {
    frames: u64,
}

impl Renderer for HeadlessRenderer {
    fn update(&mut self, delta: f64) {
        log::trace!("update {:.3}s", delta);
    }

    fn render(&mut self, frame: RenderFrame<'_>) {
        self.frames += 1;
        log::debug!(
            "frame {}: flags {:?}, textures changed: {}, topology changed: {}",
            self.frames,
            frame.flags,
            frame.textures_changed,
            frame.topology_changed
        );
    }

    fn release(&mut self) {
        log::debug!("headless renderer released after {} frames", self.frames);
    }
}

struct HeadlessBackend;

impl RenderBackend for HeadlessBackend {
    fn create_renderer(
        &self,
        _: &ImportedScene,
        _: &BoundingBox,
    ) -> anyhow::Result<Box<dyn Renderer>> {
        Ok(Box::new(HeadlessRenderer { frames: 0 }))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(model) = args.next() else {
        bail!("usage: scene-stats <model file> [config.toml]");
    };
    let config = match args.next() {
        Some(path) => SceneConfig::load(&path).with_context(|| format!("reading {path}"))?,
        None => SceneConfig::default(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let directory = std::path::Path::new(&model)
        .parent()
        .map(|dir| dir.to_path_buf())
        .unwrap_or_default();
    let textures = TextureStore::new(directory, runtime.handle().clone());
    let mut scene = Scene::open(&model, &config, Box::new(textures), &HeadlessBackend)?;

    let camera = Camera::framing(scene.bounds(), 16.0 / 9.0);
    let options = UiOptions::default();
    // Give background texture loads a moment to finish, drawing as they come in
    for _ in 0..50 {
        scene.update(1.0 / 60.0, false);
        scene.render(&options, &camera);
        let pending = scene.raw().materials.iter().flat_map(|m| &m.textures).any(|slot| {
            scene.textures().and_then(|t| t.state(&slot.path)) == Some(TextureState::Pending)
        });
        if !pending {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    println!("{}", scene.file().display());
    println!("{}", scene.stats_string());
    let bounds = scene.bounds();
    if bounds.is_empty() {
        println!(" Bounds: empty");
    } else {
        println!(
            " Bounds: min {:?} max {:?} center {:?}",
            bounds.min,
            bounds.max,
            scene.center()
        );
    }
    for record in scene.log_records() {
        println!(
            " [{:>6} ms] {:<5} T{}: {}",
            record.elapsed_ms, record.category, record.thread_id, record.message
        );
    }
    if let Some(textures) = scene.textures() {
        for slot in scene.raw().materials.iter().flat_map(|m| &m.textures) {
            println!(" texture {}: {:?}", slot.path, textures.state(&slot.path));
        }
    }

    scene.dispose();
    Ok(())
}
