//! World-space axis-aligned bounding volume of an imported scene.

use cgmath::{Matrix4, Point3, SquareMatrix, Transform, Vector3};
use log::warn;

use crate::data_structures::graph::{ImportedScene, Mesh, Node, NodeId};

/// Sentinel magnitude; an untouched box has `min > max` on every axis.
const SENTINEL: f32 = f32::MAX;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(SENTINEL, SENTINEL, SENTINEL),
            max: Point3::new(-SENTINEL, -SENTINEL, -SENTINEL),
        }
    }

    /// True when no point was ever folded in (or the box is otherwise inverted).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, point: Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn contains(&self, point: Point3<f32>, epsilon: f32) -> bool {
        point.x >= self.min.x - epsilon
            && point.y >= self.min.y - epsilon
            && point.z >= self.min.z - epsilon
            && point.x <= self.max.x + epsilon
            && point.y <= self.max.y + epsilon
            && point.z <= self.max.z + epsilon
    }

    /// Walks the hierarchy below `root` and folds every transformed vertex of every
    /// referenced mesh into a fresh box.
    pub fn compute(root: NodeId, nodes: &[Node], meshes: &[Mesh]) -> Self {
        let mut bounds = Self::empty();
        if root.0 < nodes.len() {
            visit(root, Matrix4::identity(), nodes, meshes, &mut bounds);
        } else {
            warn!("Root node {} is out of bounds for {} nodes.", root.0, nodes.len());
        }
        bounds
    }
}

pub fn compute_bounds(scene: &ImportedScene) -> BoundingBox {
    BoundingBox::compute(scene.root, &scene.nodes, &scene.meshes)
}

/**
 * The parent's world transform is passed by value, so each sibling starts from the
 * same matrix no matter what the previous sibling's subtree did with it.
 */
fn visit(
    id: NodeId,
    parent_world: Matrix4<f32>,
    nodes: &[Node],
    meshes: &[Mesh],
    bounds: &mut BoundingBox,
) {
    let Some(node) = nodes.get(id.0) else {
        warn!("Skipping dangling node reference {}.", id.0);
        return;
    };
    let world = parent_world * node.transform;

    for &mesh_idx in &node.meshes {
        match meshes.get(mesh_idx) {
            Some(mesh) => mesh
                .positions
                .iter()
                .for_each(|&p| bounds.extend(world.transform_point(p))),
            None => warn!(
                "Node '{}' references mesh {}, but there are only {} meshes.",
                node.name,
                mesh_idx,
                meshes.len()
            ),
        }
    }
    for &child in &node.children {
        visit(child, world, nodes, meshes, bounds);
    }
}
