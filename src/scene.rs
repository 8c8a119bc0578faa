//! Scene: one loaded asset file and its per-frame update/render contract.
//!
//! # Lifecycle
//!
//! 1. [`Scene::load`] runs the importer (timed), then computes bounds and primitive
//!    statistics, resolves and registers textures and builds the renderer.
//! 2. Each frame the caller invokes [`Scene::update`] and, unless the frame is
//!    silent, [`Scene::render`].
//! 3. [`Scene::dispose`] (or dropping the scene) releases textures and renderer.
//!
//! A failed load never hands out a scene; whatever was acquired up to that point is
//! released before the error is returned.

use std::path::{Path, PathBuf};

use cgmath::Point3;
use instant::{Duration, Instant};
use log::{debug, info, warn};

use crate::{
    animation::{AnimationClock, Animator},
    config::SceneConfig,
    data_structures::{
        bounds::{BoundingBox, compute_bounds},
        graph::{ImportedScene, NodeId},
        stats::PrimitiveStats,
    },
    error::{Result, SceneError},
    notify::ChangeNotifier,
    render::{Camera, RenderBackend, RenderFlags, RenderFrame, Renderer, UiOptions, VisibilityFilter},
    resources::{
        Importer,
        import_log::{LogCollector, LogRecord, LogStore},
        importer_for_path,
        texture::{TextureSet, TextureSource, resolve_textures},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Ready,
    Disposed,
}

/// Owns the collaborators that need an explicit release. Releasing takes them out,
/// so it can run any number of times, and dropping the guard releases as well.
struct SceneResources {
    textures: Option<Box<dyn TextureSet>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl SceneResources {
    fn release(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release();
        }
        if let Some(textures) = self.textures.take() {
            textures.release();
        }
    }

    fn is_released(&self) -> bool {
        self.textures.is_none() && self.renderer.is_none()
    }
}

impl Drop for SceneResources {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Scene {
    file: PathBuf,
    directory: PathBuf,
    raw: ImportedScene,
    bounds: BoundingBox,
    stats: PrimitiveStats,
    load_duration: Duration,
    resources: SceneResources,
    animator: Box<dyn Animator>,
    clock: AnimationClock,
    notifier: ChangeNotifier,
    visibility: VisibilityFilter,
    logs: LogStore,
    override_skeleton: bool,
}

impl Scene {
    /// Loads `path` with an importer chosen by file extension.
    pub fn open(
        path: impl AsRef<Path>,
        config: &SceneConfig,
        textures: Box<dyn TextureSet>,
        backend: &dyn RenderBackend,
    ) -> Result<Self> {
        let path = path.as_ref();
        match importer_for_path(path) {
            Some(importer) => Self::load(path, config, importer.as_ref(), textures, backend),
            None => {
                textures.release();
                Err(SceneError::Load {
                    path: path.display().to_string(),
                    message: "unsupported file format".to_string(),
                })
            }
        }
    }

    pub fn load(
        path: impl AsRef<Path>,
        config: &SceneConfig,
        importer: &dyn Importer,
        textures: Box<dyn TextureSet>,
        backend: &dyn RenderBackend,
    ) -> Result<Self> {
        let file = path.as_ref().to_path_buf();
        let mut resources = SceneResources {
            textures: Some(textures),
            renderer: None,
        };
        info!("Loading scene {}", file.display());

        let logs = LogStore::default();
        let collector = LogCollector::new(logs.clone());
        let started = Instant::now();
        let imported = importer.import(&file, &config.import, &|line: &str| collector.accept(line));
        let load_duration = started.elapsed();
        let raw = match imported {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Import of {} failed: {:#}", file.display(), e);
                resources.release();
                return Err(SceneError::Load {
                    path: file.display().to_string(),
                    message: format!("{:#}", e),
                });
            }
        };
        if raw.incomplete {
            warn!("{} was imported as incomplete", file.display());
        }

        let bounds = compute_bounds(&raw);
        let stats = PrimitiveStats::aggregate(&raw.meshes)?;

        let notifier = ChangeNotifier::new();
        if let Some(textures) = resources.textures.as_deref() {
            textures.add_change_callback(notifier.callback());
            for texture in resolve_textures(&raw.materials, &raw.embedded_textures) {
                let embedded = match texture.source {
                    TextureSource::Embedded(idx) => raw.embedded_textures.get(idx).cloned(),
                    TextureSource::External => None,
                };
                if !textures.add(&texture.path, embedded) {
                    debug!("Texture '{}' was already registered", texture.path);
                }
            }
        }

        let renderer = backend
            .create_renderer(&raw, &bounds)
            .map_err(SceneError::Renderer)?;
        resources.renderer = Some(renderer);
        let animator = backend.create_animator(&raw);

        let directory = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let scene = Self {
            file,
            directory,
            raw,
            bounds,
            stats,
            load_duration,
            resources,
            animator,
            clock: AnimationClock::new(),
            notifier,
            visibility: VisibilityFilter::default(),
            logs,
            override_skeleton: config.override_skeleton,
        };
        info!("{}", scene.stats_string());
        Ok(scene)
    }

    pub fn state(&self) -> SceneState {
        if self.resources.is_released() {
            SceneState::Disposed
        } else {
            SceneState::Ready
        }
    }

    /// Releases textures and renderer. Further calls are no-ops.
    pub fn dispose(&mut self) {
        if !self.resources.is_released() {
            debug!("Disposing scene {}", self.file.display());
        }
        self.resources.release();
    }

    /// Advances animation time. Silent frames only bank their time; the next visible
    /// frame delivers it to the animator together with its own delta.
    pub fn update(&mut self, delta: f64, silent: bool) {
        let Some(renderer) = self.resources.renderer.as_mut() else {
            return;
        };
        if self.clock.advance(delta, silent, self.animator.as_mut()).is_some() {
            renderer.update(delta);
        }
    }

    pub fn render(&mut self, options: &UiOptions, camera: &Camera) {
        let Some(renderer) = self.resources.renderer.as_mut() else {
            warn!("Render called on disposed scene {}", self.file.display());
            return;
        };
        let flags = options.to_flags(self.override_skeleton) | RenderFlags::SHOW_GHOSTS;
        let textures_changed = self.notifier.begin_frame();
        renderer.render(RenderFrame {
            visibility: &self.visibility,
            flags,
            topology_changed: self.visibility.changed(),
            textures_changed,
            camera,
        });
        self.notifier.end_frame();
        self.visibility.reset_changed();
    }

    pub fn set_override_skeleton(&mut self, enabled: bool) {
        self.override_skeleton = enabled;
    }

    pub fn set_visible_meshes(&mut self, node: NodeId, meshes: Vec<usize>) {
        self.visibility.set_visible_meshes(node, meshes);
    }

    pub fn show_all(&mut self) {
        self.visibility.show_all();
    }

    pub fn visibility(&self) -> &VisibilityFilter {
        &self.visibility
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn raw(&self) -> &ImportedScene {
        &self.raw
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn center(&self) -> Point3<f32> {
        self.bounds.center()
    }

    pub fn stats(&self) -> &PrimitiveStats {
        &self.stats
    }

    pub fn total_vertex_count(&self) -> usize {
        self.stats.vertices
    }

    pub fn total_triangle_count(&self) -> usize {
        self.stats.triangles
    }

    pub fn total_line_count(&self) -> usize {
        self.stats.lines
    }

    pub fn total_point_count(&self) -> usize {
        self.stats.points
    }

    pub fn load_duration_ms(&self) -> u128 {
        self.load_duration.as_millis()
    }

    pub fn is_animated(&self) -> bool {
        !self.raw.animations.is_empty()
    }

    /// One-line summary, e.g. `" Raw Loading Time: 12 ms - 8 Vertices, 12 Triangles, 3 Lines"`.
    pub fn stats_string(&self) -> String {
        let mut line = format!(
            " Raw Loading Time: {} ms - {} Vertices, {} Triangles",
            self.load_duration_ms(),
            self.stats.vertices,
            self.stats.triangles
        );
        if self.stats.lines > 0 {
            line.push_str(&format!(", {} Lines", self.stats.lines));
        }
        if self.stats.points > 0 {
            line.push_str(&format!(", {} Points", self.stats.points));
        }
        line
    }

    /// Importer log records in arrival order.
    pub fn log_records(&self) -> Vec<LogRecord> {
        self.logs.records()
    }

    pub fn log_store(&self) -> &LogStore {
        &self.logs
    }

    /// `None` once the scene is disposed.
    pub fn textures(&self) -> Option<&dyn TextureSet> {
        self.resources.textures.as_deref()
    }

    pub fn textures_changed(&self) -> bool {
        self.notifier.is_committed()
    }
}
