use std::path::Path;

use anyhow::Context;
use cgmath::{Point3, Vector3};

use crate::{
    config::ImportConfig,
    data_structures::graph::{
        Face, ImportedScene, Material, Mesh, Node, NodeId, TextureKind, TextureSlot,
    },
    resources::{Importer, LogSink, emit, emit_config, import_log::LogCategory},
};

/// Imports Wavefront `.obj` files (and their `.mtl` libraries) through `tobj`.
///
/// OBJ has no hierarchy: the root node gets one child per object, each holding that
/// object's mesh.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn import(
        &self,
        path: &Path,
        config: &ImportConfig,
        log: &LogSink<'_>,
    ) -> anyhow::Result<ImportedScene> {
        emit(log, LogCategory::Info, format!("Load {}", path.display()));
        emit_config(log, config);

        // tobj's own triangulation turns line elements into degenerate triangles, so
        // polygons are split in `to_mesh` instead
        let (models, obj_materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: false,
                single_index: true,
                ..Default::default()
            },
        )
        .with_context(|| format!("parsing {}", path.display()))?;

        // tobj has no representation for `p` elements and skips them
        let skipped_points = count_point_elements(path);
        if skipped_points > 0 {
            emit(
                log,
                LogCategory::Warn,
                format!(
                    "Skipped {} point element(s); they are missing from the statistics",
                    skipped_points
                ),
            );
        }

        let materials = match obj_materials {
            Ok(materials) => materials.iter().map(to_material).collect(),
            Err(e) => {
                emit(
                    log,
                    LogCategory::Warn,
                    format!("Material library could not be loaded: {}", e),
                );
                Vec::new()
            }
        };

        let mut root = Node::new(
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("root"),
        );
        let mut nodes = Vec::with_capacity(models.len() + 1);
        let mut meshes = Vec::with_capacity(models.len());
        for (idx, model) in models.iter().enumerate() {
            if model.mesh.normals.is_empty() && config.generate_normals {
                emit(
                    log,
                    LogCategory::Warn,
                    format!("Object '{}' carries no normals", model.name),
                );
            }
            let mut node = Node::new(model.name.clone());
            node.meshes.push(idx);
            root.children.push(NodeId(idx + 1));
            nodes.push(node);
            meshes.push(to_mesh(model));
        }
        nodes.insert(0, root);

        emit(
            log,
            LogCategory::Info,
            format!(
                "Found {} meshes, {} materials",
                meshes.len(),
                materials.len()
            ),
        );

        Ok(ImportedScene {
            incomplete: meshes.is_empty(),
            nodes,
            root: NodeId(0),
            meshes,
            materials,
            embedded_textures: Vec::new(),
            animations: Vec::new(),
        })
    }
}

fn to_mesh(model: &tobj::Model) -> Mesh {
    let mesh = &model.mesh;
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Point3::new(p[0], p[1], p[2]))
        .collect();
    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| Vector3::new(n[0], n[1], n[2]))
        .collect();

    Mesh {
        name: model.name.clone(),
        positions,
        normals,
        faces: split_faces(&mesh.indices, &mesh.face_arities),
        material: mesh.material_id,
    }
}

/// Cuts tobj's flat index list into faces. Points and lines keep their arity,
/// polygons with more than three corners are fanned into triangles.
pub(crate) fn split_faces(indices: &[u32], face_arities: &[u32]) -> Vec<Face> {
    // `face_arities` stays empty when every face is a triangle
    if face_arities.is_empty() {
        return indices.chunks(3).map(Face::new).collect();
    }
    let mut faces = Vec::with_capacity(face_arities.len());
    let mut start = 0;
    for &arity in face_arities {
        let end = (start + arity as usize).min(indices.len());
        let corners = &indices[start..end];
        start = end;
        match corners.split_first() {
            Some((&first, rest)) if corners.len() > 3 => faces.extend(
                rest.windows(2)
                    .map(|edge| Face::new([first, edge[0], edge[1]])),
            ),
            _ => faces.push(Face::new(corners)),
        }
    }
    faces
}

/// Number of `p` statements in the file. Unreadable files count as none; tobj has
/// already reported those.
fn count_point_elements(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|contents| {
            contents
                .lines()
                .filter(|line| {
                    let line = line.trim_start();
                    line.starts_with("p ") || line.starts_with("p\t")
                })
                .count()
        })
        .unwrap_or(0)
}

fn to_material(material: &tobj::Material) -> Material {
    let textures = [
        (TextureKind::Diffuse, &material.diffuse_texture),
        (TextureKind::Normal, &material.normal_texture),
        (TextureKind::Ambient, &material.ambient_texture),
        (TextureKind::Specular, &material.specular_texture),
        (TextureKind::Shininess, &material.shininess_texture),
        (TextureKind::Opacity, &material.dissolve_texture),
    ]
    .into_iter()
    .filter_map(|(kind, path)| {
        path.as_ref().map(|path| TextureSlot {
            kind,
            path: path.clone(),
        })
    })
    .collect();

    Material {
        name: material.name.clone(),
        textures,
    }
}
