//! glTF 2.0 import (`.gltf` and `.glb`).

use std::{ops::Range, path::Path, sync::Arc};

use anyhow::Context;
use base64::{Engine, prelude::BASE64_STANDARD};
use cgmath::{Matrix4, Point3, Vector3};
use gltf::mesh::Mode;

use crate::{
    config::ImportConfig,
    data_structures::graph::{
        AnimationInfo, EmbeddedTexture, Face, ImportedScene, Material, Mesh, Node, NodeId,
        TextureKind, TextureSlot,
    },
    resources::{
        Importer, LogSink, emit, emit_config, import_log::LogCategory,
        texture::EMBEDDED_TEXTURE_PREFIX,
    },
};

/// Imports glTF through the `gltf` crate.
///
/// Every primitive becomes one [`Mesh`]; a node referencing a glTF mesh references all
/// of its primitives. Images stored in buffer views go into the embedded texture table
/// and are referenced as `*<n>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfImporter;

impl Importer for GltfImporter {
    fn import(
        &self,
        path: &Path,
        config: &ImportConfig,
        log: &LogSink<'_>,
    ) -> anyhow::Result<ImportedScene> {
        emit(log, LogCategory::Info, format!("Load {}", path.display()));
        emit_config(log, config);

        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).with_context(|| format!("parsing {}", path.display()))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .with_context(|| format!("loading buffers of {}", path.display()))?;

        let (embedded_textures, image_paths) = load_images(&document, &buffers)?;
        let materials = document
            .materials()
            .map(|material| to_material(&material, &image_paths))
            .collect::<Vec<_>>();

        let mut meshes = Vec::new();
        let mut primitive_ranges = Vec::new();
        for mesh in document.meshes() {
            let start = meshes.len();
            for primitive in mesh.primitives() {
                let converted = to_mesh(&mesh, &primitive, &buffers);
                if converted.normals.is_empty() && config.generate_normals {
                    emit(
                        log,
                        LogCategory::Warn,
                        format!("Mesh '{}' carries no normals", converted.name),
                    );
                }
                meshes.push(converted);
            }
            primitive_ranges.push(start..meshes.len());
        }

        let mut nodes = Vec::new();
        let root = match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                let mut roots = scene.nodes().collect::<Vec<_>>();
                if roots.len() == 1 {
                    add_node(roots.remove(0), &mut nodes, &primitive_ranges)
                } else {
                    nodes.push(Node::new(scene.name().unwrap_or("root")));
                    let children = roots
                        .into_iter()
                        .map(|node| add_node(node, &mut nodes, &primitive_ranges))
                        .collect();
                    nodes[0].children = children;
                    NodeId(0)
                }
            }
            None => {
                emit(log, LogCategory::Warn, "File defines no scene");
                nodes.push(Node::new("root"));
                NodeId(0)
            }
        };

        let animations = document
            .animations()
            .map(|animation| to_animation_info(&animation, &buffers))
            .collect::<Vec<_>>();

        emit(
            log,
            LogCategory::Info,
            format!(
                "Found {} meshes, {} materials, {} embedded textures, {} animations",
                meshes.len(),
                materials.len(),
                embedded_textures.len(),
                animations.len()
            ),
        );

        Ok(ImportedScene {
            incomplete: meshes.is_empty(),
            nodes,
            root,
            meshes,
            materials,
            embedded_textures,
            animations,
        })
    }
}

/// Returns the embedded texture table and, per glTF image, the path materials use.
fn load_images(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> anyhow::Result<(Vec<Arc<EmbeddedTexture>>, Vec<String>)> {
    let mut embedded = Vec::new();
    let mut paths = Vec::new();
    for image in document.images() {
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                let bytes = buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..end))
                    .with_context(|| format!("image {} points outside its buffer", image.index()))?
                    .to_vec();
                paths.push(format!("{}{}", EMBEDDED_TEXTURE_PREFIX, embedded.len()));
                embedded.push(Arc::new(EmbeddedTexture::Compressed {
                    bytes,
                    format_hint: format_from_mime(mime_type),
                }));
            }
            gltf::image::Source::Uri { uri, mime_type } => match decode_data_uri(uri) {
                Some(decoded) => {
                    let (bytes, uri_mime) = decoded
                        .with_context(|| format!("image {} has a malformed data URI", image.index()))?;
                    paths.push(format!("{}{}", EMBEDDED_TEXTURE_PREFIX, embedded.len()));
                    embedded.push(Arc::new(EmbeddedTexture::Compressed {
                        bytes,
                        format_hint: mime_type.or(uri_mime.as_deref()).and_then(format_from_mime),
                    }));
                }
                None => paths.push(decode_relative_uri(uri)),
            },
        }
    }
    Ok((embedded, paths))
}

/// `"image/png"` gives `"png"`.
fn format_from_mime(mime_type: &str) -> Option<String> {
    mime_type
        .rsplit('/')
        .next()
        .filter(|format| !format.is_empty())
        .map(str::to_string)
}

/// Decodes `data:[<mime>][;base64],<payload>` URIs the way the gltf crate does for
/// buffers. Returns `None` for any other URI.
pub(crate) fn decode_data_uri(uri: &str) -> Option<anyhow::Result<(Vec<u8>, Option<String>)>> {
    uri.strip_prefix("data:").map(decode_data_payload)
}

fn decode_data_payload(rest: &str) -> anyhow::Result<(Vec<u8>, Option<String>)> {
    let (header, payload) = rest
        .split_once(',')
        .context("data URI without ',' separator")?;
    let bytes = match header.strip_suffix(";base64") {
        Some(_) => BASE64_STANDARD
            .decode(payload)
            .context("invalid base64 payload")?,
        None => urlencoding::decode_binary(payload.as_bytes()).into_owned(),
    };
    let mime_type = header
        .split(';')
        .next()
        .filter(|mime_type| !mime_type.is_empty())
        .map(str::to_string);
    Ok((bytes, mime_type))
}

/// Relative image URIs are percent-encoded; texture paths are plain file paths.
fn decode_relative_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(path) => path.into_owned(),
        Err(_) => uri.to_string(),
    }
}

fn to_material(material: &gltf::Material<'_>, image_paths: &[String]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let textures = [
        pbr.base_color_texture()
            .map(|info| (TextureKind::Diffuse, info.texture())),
        pbr.metallic_roughness_texture()
            .map(|info| (TextureKind::MetallicRoughness, info.texture())),
        material
            .normal_texture()
            .map(|normal| (TextureKind::Normal, normal.texture())),
        material
            .occlusion_texture()
            .map(|occlusion| (TextureKind::Occlusion, occlusion.texture())),
        material
            .emissive_texture()
            .map(|info| (TextureKind::Emissive, info.texture())),
    ]
    .into_iter()
    .flatten()
    .filter_map(|(kind, texture)| {
        image_paths
            .get(texture.source().index())
            .map(|path| TextureSlot {
                kind,
                path: path.clone(),
            })
    })
    .collect();

    Material {
        name: material.name().unwrap_or("default").to_string(),
        textures,
    }
}

fn to_mesh(
    mesh: &gltf::Mesh<'_>,
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Mesh {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<Point3<f32>> = reader
        .read_positions()
        .map(|positions| positions.map(Point3::from).collect())
        .unwrap_or_default();
    let normals: Vec<Vector3<f32>> = reader
        .read_normals()
        .map(|normals| normals.map(Vector3::from).collect())
        .unwrap_or_default();
    // Non-indexed primitives draw their vertices in order
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    Mesh {
        name: mesh
            .name()
            .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string),
        positions,
        normals,
        faces: assemble_faces(primitive.mode(), &indices),
        material: primitive.material().index(),
    }
}

/// Splits an index stream into point, line or triangle faces according to `mode`.
/// Strips, loops and fans are unrolled into independent faces.
pub(crate) fn assemble_faces(mode: Mode, indices: &[u32]) -> Vec<Face> {
    match mode {
        Mode::Points => indices.iter().map(|&i| Face::new([i])).collect(),
        Mode::Lines => indices.chunks_exact(2).map(Face::new).collect(),
        Mode::LineStrip => indices.windows(2).map(Face::new).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Face> = indices.windows(2).map(Face::new).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(Face::new([last, first]));
                }
            }
            faces
        }
        Mode::Triangles => indices.chunks_exact(3).map(Face::new).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                // Keep the winding consistent on odd triangles
                if i % 2 == 0 {
                    Face::new([w[0], w[1], w[2]])
                } else {
                    Face::new([w[1], w[0], w[2]])
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&center, rest)) => rest
                .windows(2)
                .map(|w| Face::new([center, w[0], w[1]]))
                .collect(),
            None => Vec::new(),
        },
    }
}

fn add_node(node: gltf::Node<'_>, nodes: &mut Vec<Node>, primitive_ranges: &[Range<usize>]) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        name: node
            .name()
            .map_or_else(|| format!("node_{}", node.index()), str::to_string),
        transform: Matrix4::from(node.transform().matrix()),
        meshes: node
            .mesh()
            .and_then(|mesh| primitive_ranges.get(mesh.index()))
            .map(|range| range.clone().collect())
            .unwrap_or_default(),
        children: Vec::new(),
    });
    let children = node
        .children()
        .map(|child| add_node(child, nodes, primitive_ranges))
        .collect();
    nodes[id.0].children = children;
    id
}

fn to_animation_info(animation: &gltf::Animation<'_>, buffers: &[gltf::buffer::Data]) -> AnimationInfo {
    let duration = animation
        .channels()
        .filter_map(|channel| {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
            reader
                .read_inputs()
                .map(|times| times.fold(0.0f32, f32::max))
        })
        .fold(0.0f32, f32::max);
    AnimationInfo {
        name: animation.name().unwrap_or("Default").to_string(),
        duration: duration as f64,
        channels: animation.channels().count(),
    }
}
