//! The boundary towards the actual renderer.
//!
//! The scene core never touches the GPU. Each frame it hands a [`RenderFrame`] to a
//! [`Renderer`] supplied by a [`RenderBackend`]:
//!
//! - [`RenderFlags`] built from the UI-facing [`UiOptions`]
//! - a [`VisibilityFilter`] saying which meshes of which nodes may be drawn
//! - "topology changed" and "textures changed" markers
//! - the [`Camera`] to draw with
//!

use std::collections::HashMap;

use bitflags::bitflags;
use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    animation::{Animator, ClipCursor},
    data_structures::{bounds::BoundingBox, graph::{ImportedScene, NodeId}},
};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        const SHOW_NORMALS = 1 << 0;
        const SHOW_BOUNDING_BOXES = 1 << 1;
        const SHOW_SKELETON = 1 << 2;
        const SHADED = 1 << 3;
        const TEXTURED = 1 << 4;
        const WIREFRAME = 1 << 5;
        /// Draw meshes filtered out by the visibility filter as translucent ghosts.
        const SHOW_GHOSTS = 1 << 6;
    }
}

/// Display options as the UI exposes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiOptions {
    pub show_normals: bool,
    pub show_bounding_boxes: bool,
    pub show_skeleton: bool,
    pub lit: bool,
    pub textured: bool,
    pub wireframe: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            show_normals: false,
            show_bounding_boxes: false,
            show_skeleton: false,
            lit: true,
            textured: true,
            wireframe: false,
        }
    }
}

impl UiOptions {
    /// Maps each option 1:1 onto its flag. `override_skeleton` forces the skeleton on.
    pub fn to_flags(&self, override_skeleton: bool) -> RenderFlags {
        let mut flags = RenderFlags::empty();
        flags.set(RenderFlags::SHOW_NORMALS, self.show_normals);
        flags.set(RenderFlags::SHOW_BOUNDING_BOXES, self.show_bounding_boxes);
        flags.set(RenderFlags::SHOW_SKELETON, self.show_skeleton || override_skeleton);
        flags.set(RenderFlags::SHADED, self.lit);
        flags.set(RenderFlags::TEXTURED, self.textured);
        flags.set(RenderFlags::WIREFRAME, self.wireframe);
        flags
    }
}

/// Which meshes of which nodes are eligible for display.
///
/// Without a filter every mesh is visible. With one, nodes that are not listed show
/// nothing.
#[derive(Clone, Debug, Default)]
pub struct VisibilityFilter {
    visible: Option<HashMap<NodeId, Vec<usize>>>,
    changed: bool,
}

impl VisibilityFilter {
    pub fn is_filtering(&self) -> bool {
        self.visible.is_some()
    }

    pub fn set_visible_meshes(&mut self, node: NodeId, meshes: Vec<usize>) {
        self.visible
            .get_or_insert_with(HashMap::new)
            .insert(node, meshes);
        self.changed = true;
    }

    pub fn hide_node(&mut self, node: NodeId) {
        self.set_visible_meshes(node, Vec::new());
    }

    /// Removes the filter altogether.
    pub fn show_all(&mut self) {
        if self.visible.take().is_some() {
            self.changed = true;
        }
    }

    pub fn is_mesh_visible(&self, node: NodeId, mesh: usize) -> bool {
        match &self.visible {
            None => true,
            Some(visible) => visible
                .get(&node)
                .is_some_and(|meshes| meshes.contains(&mesh)),
        }
    }

    /// `None` while unfiltered.
    pub fn visible_meshes(&self, node: NodeId) -> Option<&[usize]> {
        self.visible
            .as_ref()
            .map(|visible| visible.get(&node).map_or(&[][..], Vec::as_slice))
    }

    /// Whether the filter changed since the last completed frame.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn reset_changed(&mut self) {
        self.changed = false;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(eye: Point3<f32>, target: Point3<f32>, fovy: Deg<f32>, aspect: f32) -> Self {
        Self {
            view: Matrix4::look_at_rh(eye, target, Vector3::unit_y()),
            projection: cgmath::perspective(fovy, aspect, 0.1, 1000.0),
        }
    }

    /// Looks at the center of `bounds` from a distance that keeps the whole box in view.
    pub fn framing(bounds: &BoundingBox, aspect: f32) -> Self {
        let fovy = Deg(45.0);
        if bounds.is_empty() {
            return Self::new(Point3::new(0.0, 0.0, 5.0), Point3::origin(), fovy, aspect);
        }
        let center = bounds.center();
        let radius = (bounds.size().magnitude() * 0.5).max(0.01);
        let distance = radius / (fovy.0.to_radians() * 0.5).tan();
        let eye = center + Vector3::new(0.0, radius * 0.5, distance);
        let far = (distance + radius) * 2.0;
        Self {
            view: Matrix4::look_at_rh(eye, center, Vector3::unit_y()),
            projection: cgmath::perspective(fovy, aspect, far / 1000.0, far),
        }
    }
}

/// Everything a renderer gets to know about one frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderFrame<'a> {
    pub visibility: &'a VisibilityFilter,
    pub flags: RenderFlags,
    pub topology_changed: bool,
    pub textures_changed: bool,
    pub camera: &'a Camera,
}

pub trait Renderer {
    fn update(&mut self, delta: f64);

    fn render(&mut self, frame: RenderFrame<'_>);

    /// Frees renderer resources. Called at most once by the scene.
    fn release(&mut self) {}
}

/// Builds renderer (and animator) for a freshly imported scene.
pub trait RenderBackend {
    fn create_renderer(
        &self,
        scene: &ImportedScene,
        bounds: &BoundingBox,
    ) -> anyhow::Result<Box<dyn Renderer>>;

    fn create_animator(&self, scene: &ImportedScene) -> Box<dyn Animator> {
        Box::new(ClipCursor::from_scene(scene))
    }
}
