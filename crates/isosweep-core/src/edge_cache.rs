//! Reuse of edge crossings between adjacent cells.
//!
//! Each resolved crossing is stored under the identity of the cell that
//! resolved it (corner-0 lattice position plus local edge index). A later cell
//! finds a shared edge by asking for the matching edge of its predecessor along
//! -x, -y or -z.

use std::collections::HashMap;

use crate::cell::EDGE_COUNT;
use crate::vertex::Vertex;

/// Identity of one edge as seen from one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    /// Lattice X of the cell's corner 0.
    pub x: i32,
    /// Lattice Y of the cell's corner 0.
    pub y: i32,
    /// Lattice Z of the cell's corner 0.
    pub z: i32,
    /// Local edge index, `0..12`.
    pub edge: u8,
}

impl EdgeKey {
    /// Creates a key.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(x: i32, y: i32, z: i32, edge: usize) -> Self {
        debug_assert!(edge < EDGE_COUNT);
        Self {
            x,
            y,
            z,
            edge: edge as u8,
        }
    }

    /// Returns true for edges on the cell's top face (4-7).
    #[must_use]
    pub fn is_top_face(&self) -> bool {
        (4..8).contains(&self.edge)
    }
}

/// For each local edge, the index of the same physical edge in the preceding
/// cell along -x, -y and -z, if that cell touches it.
pub const SHARED_EDGES: [[Option<usize>; 3]; EDGE_COUNT] = [
    [None, Some(2), Some(4)], // 0
    [None, None, Some(5)], // 1
    [None, None, Some(6)], // 2
    [Some(1), None, Some(7)], // 3
    [None, Some(6), None], // 4
    [None, None, None], // 5
    [None, None, None], // 6
    [Some(5), None, None], // 7
    [Some(9), Some(11), None], // 8
    [None, Some(10), None], // 9
    [None, None, None], // 10
    [Some(10), None, None], // 11
];

/// Returns the keys under which a predecessor cell may have stored edge `edge`
/// of the cell at `(x, y, z)`, nearest axis first.
pub fn shared_keys(x: i32, y: i32, z: i32, stride: i32, edge: usize) -> impl Iterator<Item = EdgeKey> {
    let [along_x, along_y, along_z] = SHARED_EDGES[edge];
    along_x
        .map(|e| EdgeKey::new(x - stride, y, z, e))
        .into_iter()
        .chain(along_y.map(|e| EdgeKey::new(x, y - stride, z, e)))
        .chain(along_z.map(|e| EdgeKey::new(x, y, z - stride, e)))
}

/// Map from edge identity to an already-interpolated crossing.
#[derive(Debug, Default)]
pub struct EdgeCache {
    entries: HashMap<EdgeKey, Vertex>,
    peak_len: usize,
}

impl EdgeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up one key.
    #[must_use]
    pub fn get(&self, key: &EdgeKey) -> Option<Vertex> {
        self.entries.get(key).copied()
    }

    /// Looks up the first shared key of a predecessor cell that is present.
    #[must_use]
    pub fn find_shared(&self, x: i32, y: i32, z: i32, stride: i32, edge: usize) -> Option<Vertex> {
        shared_keys(x, y, z, stride, edge).find_map(|key| self.get(&key))
    }

    /// Stores a crossing.
    pub fn insert(&mut self, key: EdgeKey, vertex: Vertex) {
        self.entries.insert(key, vertex);
        self.peak_len = self.peak_len.max(self.entries.len());
    }

    /// Drops everything future cells can no longer reach once the slice at `z`
    /// is finished: all older slices and every non-top edge of slice `z`.
    ///
    /// Returns the number of evicted entries.
    pub fn evict_finished_slice(&mut self, z: i32) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| key.z > z || (key.z == z && key.is_top_face()));
        let evicted = before - self.entries.len();
        log::trace!("edge cache: evicted {evicted} entries after slice z={z}");
        evicted
    }

    /// Number of cached crossings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest size the cache has reached.
    #[must_use]
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }
}
