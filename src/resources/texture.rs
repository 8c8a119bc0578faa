use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, anyhow};
use image::{ImageFormat, RgbaImage};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::data_structures::graph::{EmbeddedTexture, Material};

/// Texture paths of the form `*<n>` point into the embedded texture table.
pub const EMBEDDED_TEXTURE_PREFIX: char = '*';

/// Fired with the texture path whenever an entry is registered or changes state.
pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSource {
    Embedded(usize),
    External,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTexture {
    pub path: String,
    pub source: TextureSource,
}

/// `"*12"` gives `Some(12)`. Anything but the prefix followed by decimal digits gives `None`.
pub fn parse_embedded_index(path: &str) -> Option<usize> {
    let digits = path.strip_prefix(EMBEDDED_TEXTURE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/**
 * Collects every texture path referenced by `materials`, once per path and in the
 * order of first appearance.
 *
 * Embedded references whose index can't be used (no embedded table, index out of
 * range) fall back to being external paths. They are kept so that they show up as
 * unresolved and can be replaced by hand later.
 */
pub fn resolve_textures(
    materials: &[Material],
    embedded: &[Arc<EmbeddedTexture>],
) -> Vec<ResolvedTexture> {
    let mut resolved: IndexMap<&str, TextureSource> = IndexMap::new();
    for slot in materials.iter().flat_map(|material| material.textures.iter()) {
        if resolved.contains_key(slot.path.as_str()) {
            continue;
        }
        let source = match parse_embedded_index(&slot.path) {
            Some(idx) if idx < embedded.len() => TextureSource::Embedded(idx),
            Some(_) => {
                warn!(
                    "Embedded texture reference '{}' is out of range ({} embedded textures).",
                    slot.path,
                    embedded.len()
                );
                TextureSource::External
            }
            None => TextureSource::External,
        };
        resolved.insert(&slot.path, source);
    }
    resolved
        .into_iter()
        .map(|(path, source)| ResolvedTexture {
            path: path.to_string(),
            source,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed(String),
}

/// The texture collaborator of a scene: accepts registrations, loads them on its own
/// schedule and reports progress through change callbacks.
pub trait TextureSet: Send + Sync {
    /// Registers `path`. Returns `false` (and does nothing) if it is already known.
    fn add(&self, path: &str, embedded: Option<Arc<EmbeddedTexture>>) -> bool;

    fn state(&self, path: &str) -> Option<TextureState>;

    fn add_change_callback(&self, callback: ChangeCallback);

    /// Frees everything. Safe to call more than once.
    fn release(&self);
}

#[derive(Clone, Debug)]
struct TextureEntry {
    state: TextureState,
    image: Option<Arc<RgbaImage>>,
    /// Bumped on replacement so that a stale load can't overwrite a newer one.
    generation: u64,
}

enum TextureOrigin {
    Embedded(Arc<EmbeddedTexture>),
    File(PathBuf),
}

#[derive(Default)]
struct StoreInner {
    base_dir: PathBuf,
    entries: Mutex<IndexMap<String, TextureEntry>>,
    callbacks: Mutex<Vec<ChangeCallback>>,
    released: AtomicBool,
}

impl StoreInner {
    fn entries(&self) -> MutexGuard<'_, IndexMap<String, TextureEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Callbacks run without any store lock held.
    fn fire(&self, path: &str) {
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        callbacks.iter().for_each(|callback| callback(path));
    }

    fn finish(&self, path: &str, generation: u64, result: anyhow::Result<RgbaImage>) {
        if self.released.load(Ordering::Acquire) {
            return;
        }
        {
            let mut entries = self.entries();
            let Some(entry) = entries.get_mut(path) else {
                return;
            };
            if entry.generation != generation {
                debug!("Dropping stale load of texture '{}'.", path);
                return;
            }
            match result {
                Ok(image) => {
                    entry.state = TextureState::Loaded {
                        width: image.width(),
                        height: image.height(),
                    };
                    entry.image = Some(Arc::new(image));
                }
                Err(e) => {
                    warn!("Texture '{}' could not be loaded: {:#}", path, e);
                    entry.state = TextureState::Failed(format!("{:#}", e));
                    entry.image = None;
                }
            }
        }
        self.fire(path);
    }
}

/// [`TextureSet`] that decodes textures with the `image` crate on the tokio blocking
/// pool. External paths are looked up relative to the scene's directory.
pub struct TextureStore {
    inner: Arc<StoreInner>,
    runtime: tokio::runtime::Handle,
}

impl TextureStore {
    pub fn new(base_dir: impl Into<PathBuf>, runtime: tokio::runtime::Handle) -> Self {
        let inner = StoreInner {
            base_dir: base_dir.into(),
            ..Default::default()
        };
        Self {
            inner: Arc::new(inner),
            runtime,
        }
    }

    pub fn image(&self, path: &str) -> Option<Arc<RgbaImage>> {
        self.inner.entries().get(path).and_then(|entry| entry.image.clone())
    }

    /// Registered paths in registration order.
    pub fn paths(&self) -> Vec<String> {
        self.inner.entries().keys().cloned().collect()
    }

    pub fn failed(&self) -> Vec<String> {
        self.inner
            .entries()
            .iter()
            .filter(|(_, entry)| matches!(entry.state, TextureState::Failed(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reloads a registered texture from a user-chosen file, e.g. to repair a
    /// reference that could not be resolved. Returns `false` for unknown paths.
    pub fn replace(&self, path: &str, file: impl AsRef<Path>) -> bool {
        if self.inner.released.load(Ordering::Acquire) {
            return false;
        }
        let generation = {
            let mut entries = self.inner.entries();
            let Some(entry) = entries.get_mut(path) else {
                return false;
            };
            entry.generation += 1;
            entry.state = TextureState::Pending;
            entry.image = None;
            entry.generation
        };
        self.inner.fire(path);
        self.spawn_load(path, TextureOrigin::File(file.as_ref().to_path_buf()), generation);
        true
    }

    fn external_path(&self, path: &str) -> PathBuf {
        let normalized = path.replace('\\', "/");
        let path = Path::new(&normalized);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.inner.base_dir.join(path)
        }
    }

    fn spawn_load(&self, path: &str, origin: TextureOrigin, generation: u64) {
        let inner = self.inner.clone();
        let path = path.to_string();
        self.runtime.spawn_blocking(move || {
            let result = decode(&origin);
            inner.finish(&path, generation, result);
        });
    }
}

impl TextureSet for TextureStore {
    fn add(&self, path: &str, embedded: Option<Arc<EmbeddedTexture>>) -> bool {
        if self.inner.released.load(Ordering::Acquire) {
            warn!("Texture '{}' registered after the texture set was released.", path);
            return false;
        }
        {
            let mut entries = self.inner.entries();
            if entries.contains_key(path) {
                return false;
            }
            entries.insert(
                path.to_string(),
                TextureEntry {
                    state: TextureState::Pending,
                    image: None,
                    generation: 0,
                },
            );
        }
        self.inner.fire(path);
        let origin = match embedded {
            Some(texture) => TextureOrigin::Embedded(texture),
            None => TextureOrigin::File(self.external_path(path)),
        };
        self.spawn_load(path, origin, 0);
        true
    }

    fn state(&self, path: &str) -> Option<TextureState> {
        self.inner.entries().get(path).map(|entry| entry.state.clone())
    }

    fn add_change_callback(&self, callback: ChangeCallback) {
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    fn release(&self) {
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("Releasing {} textures.", self.len());
        self.inner.entries().clear();
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Drop for TextureStore {
    fn drop(&mut self) {
        self.release();
    }
}

fn decode(origin: &TextureOrigin) -> anyhow::Result<RgbaImage> {
    match origin {
        TextureOrigin::Embedded(texture) => match texture.as_ref() {
            EmbeddedTexture::Compressed { bytes, format_hint } => {
                decode_bytes(bytes, format_hint.as_deref())
            }
            EmbeddedTexture::Raw {
                width,
                height,
                rgba,
            } => RgbaImage::from_raw(*width, *height, rgba.clone()).ok_or_else(|| {
                anyhow!(
                    "raw texture of {}x{} needs {} bytes, got {}",
                    width,
                    height,
                    *width as usize * *height as usize * 4,
                    rgba.len()
                )
            }),
        },
        TextureOrigin::File(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let format = path.extension().and_then(|ext| ext.to_str());
            decode_bytes(&bytes, format)
        }
    }
}

/// `format` is a file extension hint; unknown hints fall back to guessing.
fn decode_bytes(bytes: &[u8], format: Option<&str>) -> anyhow::Result<RgbaImage> {
    let img = match format.and_then(ImageFormat::from_extension) {
        Some(fmt) => image::load_from_memory_with_format(bytes, fmt)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(img.to_rgba8())
}
