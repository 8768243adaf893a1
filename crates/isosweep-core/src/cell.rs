//! A single lattice cell: 8 corners, 12 edges.
//!
//! Corner numbering (offsets in strides from the cell origin):
//!
//! ```text
//!         7 ---------- 6
//!        /|           /|         z
//!       4 ---------- 5 |         |  y
//!       | |          | |         | /
//!       | 3 ---------|-2         |/
//!       |/           |/          +---- x
//!       0 ---------- 1
//! ```
//!
//! Edges 0-3 run around the bottom face, 4-7 around the top face and 8-11 are
//! the vertical edges joining corner `i` to corner `i + 4`.

use glam::Vec3;

use crate::case_tables;
use crate::error::{IsosweepError, Result};
use crate::vertex::{interpolate, CornerVertex, Vertex};
use crate::volume::VolumeSource;

/// Number of corners of a cell.
pub const CORNER_COUNT: usize = 8;

/// Number of edges of a cell.
pub const EDGE_COUNT: usize = 12;

/// Corner offsets in units of the grid stride.
pub const CORNER_OFFSETS: [[i32; 3]; CORNER_COUNT] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// The two corners joined by each edge.
pub const EDGE_CORNERS: [[usize; 2]; EDGE_COUNT] = [
    // Bottom face
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    // Top face
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    // Vertical edges
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// One hexahedron of the sampling lattice.
///
/// Holds the sampled corners and, once resolved, the surface crossing on each
/// edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cell {
    corners: [CornerVertex; CORNER_COUNT],
    edges: [Option<Vertex>; EDGE_COUNT],
}

impl Cell {
    /// Creates a cell from its eight corners with no resolved edges.
    pub fn new(corners: [CornerVertex; CORNER_COUNT]) -> Self {
        Self {
            corners,
            edges: [None; EDGE_COUNT],
        }
    }

    /// Samples all eight corners of the cell at `(x, y, z)` from scratch.
    pub fn sample<V: VolumeSource + ?Sized>(
        source: &V,
        x: i32,
        y: i32,
        z: i32,
        stride: i32,
    ) -> Self {
        let corners = CORNER_OFFSETS.map(|[dx, dy, dz]| {
            CornerVertex::sample(
                source,
                x + dx * stride,
                y + dy * stride,
                z + dz * stride,
                stride,
            )
        });
        Self::new(corners)
    }

    /// Returns a corner.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 8`.
    #[must_use]
    pub fn corner(&self, i: usize) -> &CornerVertex {
        &self.corners[i]
    }

    /// Returns all corners.
    #[must_use]
    pub fn corners(&self) -> &[CornerVertex; CORNER_COUNT] {
        &self.corners
    }

    /// Position of corner 0, which identifies the cell.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.corners[0].position
    }

    /// Computes the 8-bit configuration: bit `i` is set iff corner `i`'s value is
    /// at or below `level`.
    #[must_use]
    pub fn case_index(&self, level: f32) -> u8 {
        self.corners
            .iter()
            .enumerate()
            .fold(0_u8, |acc, (i, c)| acc | (u8::from(c.value <= level) << i))
    }

    /// Returns the resolved crossing on an edge, if any.
    #[must_use]
    pub fn edge(&self, i: usize) -> Option<Vertex> {
        self.edges[i]
    }

    /// Stores the crossing on an edge.
    pub fn set_edge(&mut self, i: usize, vertex: Vertex) {
        self.edges[i] = Some(vertex);
    }

    /// Interpolates the crossing on edge `i` from this cell's corners.
    #[must_use]
    pub fn interpolate_edge(&self, i: usize, level: f32) -> Vertex {
        let [a, b] = EDGE_CORNERS[i];
        interpolate(level, &self.corners[a], &self.corners[b])
    }

    /// Resolves every crossed edge locally, without any neighbor sharing.
    pub fn resolve_edges(&mut self, level: f32) -> u8 {
        let case = self.case_index(level);
        let mask = case_tables::edge_mask(case);
        for i in 0..EDGE_COUNT {
            if mask & (1 << i) != 0 {
                let v = self.interpolate_edge(i, level);
                self.set_edge(i, v);
            }
        }
        case
    }

    /// Returns the triangles of this cell as vertex triples.
    ///
    /// Edges that have not been resolved are skipped along with their triangle.
    pub fn triangles(&self, case_index: u8) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        case_tables::triangle_edges(case_index).filter_map(|[a, b, c]| {
            Some([self.edges[a]?, self.edges[b]?, self.edges[c]?])
        })
    }
}

impl TryFrom<&[CornerVertex]> for Cell {
    type Error = IsosweepError;

    fn try_from(corners: &[CornerVertex]) -> Result<Self> {
        let corners: [CornerVertex; CORNER_COUNT] =
            corners
                .try_into()
                .map_err(|_| IsosweepError::CornerCount {
                    expected: CORNER_COUNT,
                    actual: corners.len(),
                })?;
        Ok(Self::new(corners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::DenseVolume;

    fn cell_with_values(values: [f32; 8]) -> Cell {
        let mut corners = [CornerVertex::default(); 8];
        for (i, c) in corners.iter_mut().enumerate() {
            let [dx, dy, dz] = CORNER_OFFSETS[i];
            #[allow(clippy::cast_precision_loss)]
            let p = Vec3::new(dx as f32, dy as f32, dz as f32);
            *c = CornerVertex::new(p, Vec3::Z, values[i]);
        }
        Cell::new(corners)
    }

    #[test]
    fn test_rejects_wrong_corner_count() {
        let corners = vec![CornerVertex::default(); 7];
        let err = Cell::try_from(corners.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            IsosweepError::CornerCount {
                expected: 8,
                actual: 7
            }
        ));

        let corners = vec![CornerVertex::default(); 9];
        assert!(Cell::try_from(corners.as_slice()).is_err());

        let corners = vec![CornerVertex::default(); 8];
        assert!(Cell::try_from(corners.as_slice()).is_ok());
    }

    #[test]
    fn test_case_index_uses_at_or_below() {
        let cell = cell_with_values([0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(cell.case_index(0.5), 0b1000_0001);
        assert_eq!(cell.case_index(-1.0), 0);
        assert_eq!(cell.case_index(1.0), 255);
    }

    #[test]
    fn test_uniform_cell_has_no_triangles() {
        let mut cell = cell_with_values([2.0; 8]);
        let case = cell.resolve_edges(0.5);
        assert_eq!(case, 0);
        assert_eq!(cell.triangles(case).count(), 0);
        assert!((0..EDGE_COUNT).all(|i| cell.edge(i).is_none()));
    }

    #[test]
    fn test_bottom_face_below_level() {
        let mut cell = cell_with_values([0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let case = cell.resolve_edges(0.5);
        assert_eq!(case, 0x0f);
        assert_eq!(cell.triangles(case).count(), 2);
        for i in 8..12 {
            let v = cell.edge(i).unwrap();
            assert!((v.position.z - 0.5).abs() < 1e-6);
        }
        for i in 0..8 {
            assert!(cell.edge(i).is_none());
        }
    }

    #[test]
    fn test_sample_places_corners() {
        let volume = DenseVolume::from_fn([5, 5, 5], |x, y, z| (x + y + z) as f32);
        let cell = Cell::sample(&volume, 1, 1, 1, 2);
        assert_eq!(cell.origin(), Vec3::ONE);
        assert_eq!(cell.corner(6).position, Vec3::splat(3.0));
        assert_eq!(cell.corner(6).value, 9.0);
        assert_eq!(cell.corner(1).value, 5.0);
    }
}
