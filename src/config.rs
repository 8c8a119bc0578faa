//! Scene configuration.
//!
//! Everything here has a sensible default, so a config file only needs to name the
//! values it wants to change:
//!
//! ```toml
//! override_skeleton = true
//!
//! [import]
//! smoothing_angle = 80.0
//! preset = "realtime_quality"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Named bundle of post-processing steps requested from the importer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessPreset {
    RealtimeFast,
    RealtimeQuality,
    #[default]
    RealtimeMaxQuality,
}

/// Settings handed to an [`Importer`](crate::resources::Importer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Maximum angle (degrees) between faces whose normals get smoothed together.
    pub smoothing_angle: f32,
    pub preset: PostProcessPreset,
    pub generate_normals: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            smoothing_angle: 66.0,
            preset: PostProcessPreset::default(),
            generate_normals: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub import: ImportConfig,
    /// Draw the skeleton even if the UI has it switched off.
    pub override_skeleton: bool,
}

impl SceneConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml_str(&contents)
            }
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
