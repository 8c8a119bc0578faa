#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use cgmath::{Matrix4, Point3};
use scene_core::{
    animation::Animator,
    config::ImportConfig,
    data_structures::{
        bounds::BoundingBox,
        graph::{EmbeddedTexture, Face, ImportedScene, Mesh, Node, NodeId},
    },
    render::{RenderBackend, RenderFlags, RenderFrame, Renderer},
    resources::{
        Importer, LogSink,
        texture::{ChangeCallback, TextureSet, TextureState},
    },
};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Per-test scratch directory, removed on drop.
pub(crate) struct TempDir(PathBuf);

impl TempDir {
    pub fn new(name: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "scene-core-{}-{}-{}",
            name,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).expect("failed to create temp dir");
        Self(dir)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.0.join(name);
        std::fs::write(&path, contents).expect("failed to write fixture");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("failed to encode png");
    bytes.into_inner()
}

pub(crate) fn mesh(positions: &[[f32; 3]], faces: &[&[u32]]) -> Mesh {
    Mesh {
        name: "mesh".to_string(),
        positions: positions.iter().map(|&p| Point3::from(p)).collect(),
        normals: Vec::new(),
        faces: faces.iter().map(|&f| Face::new(f)).collect(),
        material: None,
    }
}

pub(crate) fn unit_triangle() -> Mesh {
    mesh(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[&[0, 1, 2]])
}

/// Root node with one child carrying `transform` and referencing mesh 0.
pub(crate) fn single_mesh_scene(mesh: Mesh, transform: Matrix4<f32>) -> ImportedScene {
    let mut scene = ImportedScene::empty();
    scene.meshes.push(mesh);
    let mut child = Node::new("child");
    child.transform = transform;
    child.meshes.push(0);
    scene.add_child(NodeId(0), child);
    scene
}

pub(crate) struct MockImporter {
    pub lines: Vec<String>,
    pub result: Result<ImportedScene, String>,
}

impl MockImporter {
    pub fn ok(scene: ImportedScene) -> Self {
        Self {
            lines: Vec::new(),
            result: Ok(scene),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            lines: vec![format!("Error, T1: {}", message)],
            result: Err(message.to_string()),
        }
    }
}

impl Importer for MockImporter {
    fn import(
        &self,
        _: &Path,
        _: &ImportConfig,
        log: &LogSink<'_>,
    ) -> anyhow::Result<ImportedScene> {
        self.lines.iter().for_each(|line| log(line));
        match &self.result {
            Ok(scene) => Ok(scene.clone()),
            Err(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

#[derive(Default)]
pub(crate) struct TextureLog {
    pub added: Vec<(String, bool)>,
    pub callbacks: Vec<ChangeCallback>,
    pub releases: usize,
}

/// Texture set that records everything and lets tests fire change callbacks.
#[derive(Clone, Default)]
pub(crate) struct RecordingTextures(pub Arc<Mutex<TextureLog>>);

impl RecordingTextures {
    pub fn fire(&self, path: &str) {
        let callbacks = self.0.lock().unwrap().callbacks.clone();
        callbacks.iter().for_each(|callback| callback(path));
    }

    pub fn added(&self) -> Vec<(String, bool)> {
        self.0.lock().unwrap().added.clone()
    }

    pub fn releases(&self) -> usize {
        self.0.lock().unwrap().releases
    }
}

impl TextureSet for RecordingTextures {
    fn add(&self, path: &str, embedded: Option<Arc<EmbeddedTexture>>) -> bool {
        let mut log = self.0.lock().unwrap();
        if log.added.iter().any(|(known, _)| known == path) {
            return false;
        }
        log.added.push((path.to_string(), embedded.is_some()));
        true
    }

    fn state(&self, path: &str) -> Option<TextureState> {
        let log = self.0.lock().unwrap();
        log.added
            .iter()
            .any(|(known, _)| known == path)
            .then_some(TextureState::Pending)
    }

    fn add_change_callback(&self, callback: ChangeCallback) {
        self.0.lock().unwrap().callbacks.push(callback);
    }

    fn release(&self) {
        self.0.lock().unwrap().releases += 1;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FrameRecord {
    pub flags: RenderFlags,
    pub topology_changed: bool,
    pub textures_changed: bool,
}

#[derive(Default)]
pub(crate) struct RenderLog {
    pub frames: Vec<FrameRecord>,
    pub updates: Vec<f64>,
    pub animated: Vec<f64>,
    pub releases: usize,
}

/// Hook run inside `Renderer::render`, e.g. to fire a texture callback mid-frame.
pub(crate) type DuringRender = Arc<dyn Fn(usize) + Send + Sync>;

pub(crate) struct RecordingRenderer {
    log: Arc<Mutex<RenderLog>>,
    during_render: Option<DuringRender>,
}

impl Renderer for RecordingRenderer {
    fn update(&mut self, delta: f64) {
        self.log.lock().unwrap().updates.push(delta);
    }

    fn render(&mut self, frame: RenderFrame<'_>) {
        let frame_idx = {
            let mut log = self.log.lock().unwrap();
            log.frames.push(FrameRecord {
                flags: frame.flags,
                topology_changed: frame.topology_changed,
                textures_changed: frame.textures_changed,
            });
            log.frames.len() - 1
        };
        if let Some(hook) = &self.during_render {
            hook(frame_idx);
        }
    }

    fn release(&mut self) {
        self.log.lock().unwrap().releases += 1;
    }
}

struct RecordingAnimator(Arc<Mutex<RenderLog>>);

impl Animator for RecordingAnimator {
    fn advance(&mut self, seconds: f64) {
        self.0.lock().unwrap().animated.push(seconds);
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    pub log: Arc<Mutex<RenderLog>>,
    pub during_render: Option<DuringRender>,
    pub fail: bool,
}

impl RecordingBackend {
    pub fn frames(&self) -> Vec<FrameRecord> {
        self.log.lock().unwrap().frames.clone()
    }

    pub fn animated(&self) -> Vec<f64> {
        self.log.lock().unwrap().animated.clone()
    }

    pub fn updates(&self) -> Vec<f64> {
        self.log.lock().unwrap().updates.clone()
    }

    pub fn releases(&self) -> usize {
        self.log.lock().unwrap().releases
    }
}

impl RenderBackend for RecordingBackend {
    fn create_renderer(
        &self,
        _: &ImportedScene,
        _: &BoundingBox,
    ) -> anyhow::Result<Box<dyn Renderer>> {
        if self.fail {
            anyhow::bail!("no adapter");
        }
        Ok(Box::new(RecordingRenderer {
            log: self.log.clone(),
            during_render: self.during_render.clone(),
        }))
    }

    fn create_animator(&self, _: &ImportedScene) -> Box<dyn Animator> {
        Box::new(RecordingAnimator(self.log.clone()))
    }
}
