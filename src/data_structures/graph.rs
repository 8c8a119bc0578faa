//! The imported asset graph.
//!
//! Importers produce an [`ImportedScene`] once; afterwards it is read-only. Nodes,
//! meshes, materials and embedded textures live in flat arrays and refer to each
//! other by index, so the hierarchy needs no back-pointers.

use std::sync::Arc;

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

/// Index of a [`Node`] in [`ImportedScene::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: Matrix4<f32>,
    /// Indices into [`ImportedScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A single face. Valid faces have 1 (point), 2 (line) or 3 (triangle) indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: impl Into<Vec<u32>>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    pub fn arity(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Point3<f32>>,
    /// Empty when the source carried no normals.
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
    pub material: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Normal,
    Specular,
    Ambient,
    Emissive,
    Occlusion,
    MetallicRoughness,
    Shininess,
    Opacity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureSlot {
    pub kind: TextureKind,
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct Material {
    pub name: String,
    pub textures: Vec<TextureSlot>,
}

impl Material {
    pub fn with_texture(mut self, kind: TextureKind, path: impl Into<String>) -> Self {
        self.textures.push(TextureSlot {
            kind,
            path: path.into(),
        });
        self
    }
}

/// Image data packaged inside the asset file itself.
#[derive(Clone, Debug)]
pub enum EmbeddedTexture {
    /// An encoded image file (png, jpeg, ...). `format_hint` is a file extension.
    Compressed {
        bytes: Vec<u8>,
        format_hint: Option<String>,
    },
    /// Uncompressed RGBA8 texels.
    Raw {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
}

#[derive(Clone, Debug, Default)]
pub struct AnimationInfo {
    pub name: String,
    /// Length in seconds.
    pub duration: f64,
    pub channels: usize,
}

#[derive(Clone, Debug)]
pub struct ImportedScene {
    pub nodes: Vec<Node>,
    pub root: NodeId,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub embedded_textures: Vec<Arc<EmbeddedTexture>>,
    pub animations: Vec<AnimationInfo>,
    /// Set by importers when the file describes no renderable geometry.
    pub incomplete: bool,
}

impl ImportedScene {
    /// A scene consisting of a single, empty root node.
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node::new("root")],
            root: NodeId(0),
            meshes: Vec::new(),
            materials: Vec::new(),
            embedded_textures: Vec::new(),
            animations: Vec::new(),
            incomplete: false,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.node(self.root)
    }

    /// Appends `node` as a child of `parent` and returns its id.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }
}
