//! Indexed triangle meshes built from deduplicated surface vertices.

#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use glam::Vec3;

use crate::vertex::Vertex;

/// An immutable snapshot of the extracted surface.
///
/// `positions` interleaves, for every vertex `i`, the vertex position at `2 * i`
/// and the tip of its debug normal line (`position + normal`) at `2 * i + 1`.
/// `normals[i]` and `indices` refer to vertices by insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Returns the interleaved position / normal-tip buffer.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the per-vertex normals.
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Returns the triangle indices (every 3 consecutive indices form a triangle).
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the number of distinct vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.normals.len()
    }

    /// Returns the number of triangles in the mesh.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`.
    #[must_use]
    pub fn vertex_position(&self, i: usize) -> Option<Vec3> {
        self.positions.get(2 * i).copied()
    }

    /// Start and end of the debug normal line of vertex `i`.
    #[must_use]
    pub fn normal_line(&self, i: usize) -> Option<(Vec3, Vec3)> {
        Some((*self.positions.get(2 * i)?, *self.positions.get(2 * i + 1)?))
    }

    /// Iterates vertex positions, skipping the normal-line tips.
    pub fn vertex_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.iter().step_by(2).copied()
    }

    /// Iterates triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[2 * tri[0] as usize],
                self.positions[2 * tri[1] as usize],
                self.positions[2 * tri[2] as usize],
            ]
        })
    }

    /// Line-list indices into [`Self::positions`] drawing every normal line.
    #[must_use]
    pub fn normal_line_indices(&self) -> Vec<u32> {
        (0..self.positions.len() as u32).collect()
    }

    /// Triangle indices rebased onto [`Self::positions`], for renderers that bind
    /// the interleaved buffer directly.
    #[must_use]
    pub fn interleaved_indices(&self) -> Vec<u32> {
        self.indices.iter().map(|&i| 2 * i).collect()
    }

    /// Axis-aligned bounds of the vertex positions, if any.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self.vertex_positions();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Raw bytes of the interleaved position buffer.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions.as_slice())
    }

    /// Raw bytes of the normal buffer.
    #[must_use]
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.normals.as_slice())
    }

    /// Raw bytes of the index buffer.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices.as_slice())
    }
}

/// Growing mesh that assigns each distinct vertex exactly one index.
#[derive(Debug, Default)]
pub struct MeshAccumulator {
    lookup: HashMap<Vertex, u32>,
    mesh: Mesh,
}

impl MeshAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `vertex`, appending it if it has not been seen.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        if let Some(&index) = self.lookup.get(&vertex) {
            return index;
        }
        let index = self.mesh.normals.len() as u32;
        self.mesh.positions.push(vertex.position);
        self.mesh.positions.push(vertex.normal_tip());
        self.mesh.normals.push(vertex.normal);
        self.lookup.insert(vertex, index);
        index
    }

    /// Appends one triangle.
    pub fn push_triangle(&mut self, triangle: [Vertex; 3]) {
        for vertex in triangle {
            let index = self.push_vertex(vertex);
            self.mesh.indices.push(index);
        }
    }

    /// Number of distinct vertices so far.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.mesh.num_vertices()
    }

    /// Number of indices so far.
    #[must_use]
    pub fn num_indices(&self) -> usize {
        self.mesh.indices.len()
    }

    /// Returns the accumulated mesh without copying.
    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Copies the current state into an independent snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Mesh {
        self.mesh.clone()
    }

    /// Consumes the accumulator, returning the final mesh.
    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z)
    }

    #[test]
    fn test_shared_edge_reuses_indices() {
        let mut acc = MeshAccumulator::new();
        acc.push_triangle([v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)]);
        acc.push_triangle([v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)]);

        let mesh = acc.snapshot();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.indices(), &[0, 1, 2, 1, 3, 2]);
        assert_eq!(mesh.positions().len(), 8);
        assert_eq!(mesh.normals().len(), 4);
    }

    #[test]
    fn test_normal_line_companion() {
        let mut acc = MeshAccumulator::new();
        acc.push_vertex(Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y));
        let mesh = acc.into_mesh();
        assert_eq!(
            mesh.normal_line(0),
            Some((Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 3.0, 3.0)))
        );
        assert_eq!(mesh.normal_line(1), None);
        assert_eq!(mesh.normal_line_indices(), vec![0, 1]);
    }

    #[test]
    fn test_same_position_different_normal_is_distinct() {
        let mut acc = MeshAccumulator::new();
        let a = acc.push_vertex(Vertex::new(Vec3::ZERO, Vec3::X));
        let b = acc.push_vertex(Vertex::new(Vec3::ZERO, Vec3::Y));
        assert_ne!(a, b);
        assert_eq!(acc.num_vertices(), 2);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut acc = MeshAccumulator::new();
        acc.push_triangle([v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)]);
        let before = acc.snapshot();
        acc.push_triangle([v(5.0, 0.0), v(6.0, 0.0), v(5.0, 1.0)]);
        assert_eq!(before.num_triangles(), 1);
        assert_eq!(acc.mesh().num_triangles(), 2);
    }

    #[test]
    fn test_bounding_box_and_bytes() {
        let mut acc = MeshAccumulator::new();
        assert_eq!(acc.mesh().bounding_box(), None);
        acc.push_triangle([v(0.0, 0.0), v(2.0, 0.0), v(0.0, 3.0)]);
        let mesh = acc.into_mesh();
        assert_eq!(
            mesh.bounding_box(),
            Some((Vec3::ZERO, Vec3::new(2.0, 3.0, 0.0)))
        );
        assert_eq!(mesh.position_bytes().len(), 6 * 12);
        assert_eq!(mesh.normal_bytes().len(), 3 * 12);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
        assert_eq!(mesh.interleaved_indices(), vec![0, 2, 4]);
        let tri: Vec<_> = mesh.triangles().collect();
        assert_eq!(tri[0][2], Vec3::new(0.0, 3.0, 0.0));
    }
}
