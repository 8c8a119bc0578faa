//! scene-core
//!
//! The part of a 3D asset viewer that runs after a file has been imported: it turns
//! the raw asset graph into a render-ready scene. Parsing file formats is left to
//! importers (`gltf`, `tobj`) and drawing is left to a renderer back-end. What lives
//! here is bounding volume computation, primitive statistics, texture resolution,
//! the cross-thread "textures changed" signal, animation time keeping and recovery of
//! structured records from the importer's text log.
//!
//! High-level modules
//! - `animation`: animation clock that keeps time across silent frames
//! - `config`: scene and import configuration (TOML)
//! - `data_structures`: imported graph, bounding box and primitive statistics
//! - `error`: error taxonomy
//! - `notify`: change notification between texture loading and rendering
//! - `render`: render flags, visibility filter, camera and the renderer seam
//! - `resources`: importers, texture resolution/loading and importer log parsing
//! - `scene`: the orchestrating `Scene`
//!

pub mod animation;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod notify;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Matrix4, Point3, Vector3};
pub use error::{Result, SceneError};
pub use scene::{Scene, SceneState};
