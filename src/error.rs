//! Error taxonomy of the scene core.
//!
//! Load failures are fatal to a [`Scene`](crate::scene::Scene), malformed geometry is
//! an integrity violation that aborts the load. Unresolved textures and malformed
//! importer log lines never surface here: the former are kept in a failed state by
//! the texture set, the latter are dropped by the log parser.

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("[scene] failed to load {path}: {message}")]
    Load { path: String, message: String },

    #[error("[scene] malformed geometry: mesh {mesh}, face {face} has {count} indices")]
    MalformedGeometry {
        mesh: usize,
        face: usize,
        count: usize,
    },

    #[error("[scene] renderer setup failed: {0:#}")]
    Renderer(anyhow::Error),

    #[error("[scene] {0}")]
    Config(#[from] ConfigError),
}
