//! Circular buffer of cell corners, one z-slice per slot.
//!
//! The sweep keeps the corners of the current z-slice and the one below it.
//! Crossings are shared through the edge cache instead. Slot `k % 2`
//! holds slice `k`; writing slice `k` overwrites slice `k - 2`, which no
//! future cell can reach.

use isosweep_core::{CornerVertex, CORNER_COUNT};

type Corners = [CornerVertex; CORNER_COUNT];

/// Number of slices kept alive.
pub(crate) const SLICE_SLOTS: usize = 2;

#[derive(Debug)]
pub(crate) struct CellSlices {
    nx: usize,
    ny: usize,
    cells: Vec<Corners>,
}

impl CellSlices {
    /// Allocates corners for `SLICE_SLOTS` slices of `nx * ny` cells.
    pub(crate) fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            cells: vec![[CornerVertex::default(); CORNER_COUNT]; SLICE_SLOTS * nx * ny],
        }
    }

    fn index(&self, slice: usize, ix: usize, iy: usize) -> usize {
        debug_assert!(ix < self.nx && iy < self.ny);
        (slice % SLICE_SLOTS) * self.nx * self.ny + iy * self.nx + ix
    }

    pub(crate) fn get(&self, slice: usize, ix: usize, iy: usize) -> &Corners {
        &self.cells[self.index(slice, ix, iy)]
    }

    pub(crate) fn set(&mut self, slice: usize, ix: usize, iy: usize, corners: Corners) {
        let i = self.index(slice, ix, iy);
        self.cells[i] = corners;
    }
}
