//! Primitive statistics gathered once after import.

use crate::{
    data_structures::graph::Mesh,
    error::{Result, SceneError},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrimitiveStats {
    pub vertices: usize,
    pub triangles: usize,
    pub lines: usize,
    pub points: usize,
}

impl PrimitiveStats {
    /// Counts vertices and classifies every face by its index count.
    ///
    /// A face with any count other than 1, 2 or 3 means the importer handed over
    /// malformed geometry. That is reported as an error instead of being folded into
    /// the displayed numbers.
    pub fn aggregate(meshes: &[Mesh]) -> Result<Self> {
        let mut stats = Self::default();
        for (mesh_idx, mesh) in meshes.iter().enumerate() {
            stats.vertices += mesh.positions.len();
            for (face_idx, face) in mesh.faces.iter().enumerate() {
                match face.arity() {
                    1 => stats.points += 1,
                    2 => stats.lines += 1,
                    3 => stats.triangles += 1,
                    count => {
                        return Err(SceneError::MalformedGeometry {
                            mesh: mesh_idx,
                            face: face_idx,
                            count,
                        });
                    }
                }
            }
        }
        Ok(stats)
    }

    pub fn total_faces(&self) -> usize {
        self.triangles + self.lines + self.points
    }
}
