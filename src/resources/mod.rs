use std::path::Path;

use crate::{
    config::ImportConfig,
    data_structures::graph::ImportedScene,
    resources::{
        gltf_loader::GltfImporter,
        import_log::{LogCategory, current_thread_number},
        obj_loader::ObjImporter,
    },
};

/**
 * This module contains all logic for getting scenes, textures and importer logs in from
 * external files.
 */
pub mod gltf_loader;
pub mod import_log;
pub mod obj_loader;
pub mod texture;

/// Receives raw importer log lines, possibly from several threads.
pub type LogSink<'a> = dyn Fn(&str) + Sync + 'a;

/// The import collaborator: turns a file into an [`ImportedScene`].
///
/// Implementations report progress by writing `"<Severity>, T<thread>: <message>"`
/// lines to `log`.
pub trait Importer {
    fn import(
        &self,
        path: &Path,
        config: &ImportConfig,
        log: &LogSink<'_>,
    ) -> anyhow::Result<ImportedScene>;
}

/// Picks an importer by file extension.
pub fn importer_for_path(path: &Path) -> Option<Box<dyn Importer>> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "gltf" | "glb" => Some(Box::new(GltfImporter)),
        "obj" => Some(Box::new(ObjImporter)),
        _ => None,
    }
}

pub(crate) fn emit(log: &LogSink<'_>, category: LogCategory, message: impl AsRef<str>) {
    log(&format!(
        "{}, T{}: {}",
        category,
        current_thread_number(),
        message.as_ref()
    ));
}

pub(crate) fn emit_config(log: &LogSink<'_>, config: &ImportConfig) {
    emit(
        log,
        LogCategory::Debug,
        format!(
            "post-processing preset {:?}, normal smoothing angle {} deg, generate normals: {}",
            config.preset, config.smoothing_angle, config.generate_normals
        ),
    );
}
