//! Marching squares: the 2D contour counterpart of the cell sweep.
//!
//! Runs in a single pass without any cross-cell cache; shared points are merged
//! by value only.

use std::collections::HashMap;

use glam::Vec2;

use crate::error::Result;
use crate::options::ExtractionOptions;
use crate::vertex::INTERPOLATION_EPSILON;
use crate::volume::VolumeSource;

/// A scalar field on a 2D integer lattice, zero outside `[0, size)`.
pub trait PlaneSource {
    /// Returns the sample at `(x, y)`, or `0.0` outside the lattice.
    fn sample(&self, x: i32, y: i32) -> f32;

    /// Number of samples along X.
    fn size_x(&self) -> usize;

    /// Number of samples along Y.
    fn size_y(&self) -> usize;
}

/// One z-slice of a volume viewed as a plane.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSlice<'a, V: ?Sized> {
    volume: &'a V,
    z: i32,
}

impl<'a, V: VolumeSource + ?Sized> VolumeSlice<'a, V> {
    /// Views slice `z` of `volume`.
    pub fn new(volume: &'a V, z: i32) -> Self {
        Self { volume, z }
    }
}

impl<V: VolumeSource + ?Sized> PlaneSource for VolumeSlice<'_, V> {
    fn sample(&self, x: i32, y: i32) -> f32 {
        self.volume.sample(x, y, self.z)
    }

    fn size_x(&self) -> usize {
        self.volume.size_x()
    }

    fn size_y(&self) -> usize {
        self.volume.size_y()
    }
}

/// A set of line segments approximating the level set of a plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    /// Distinct contour points in lattice units.
    pub points: Vec<Vec2>,
    /// Segments as pairs of indices into `points`.
    pub segments: Vec<[u32; 2]>,
}

impl Contour {
    /// Returns true if no segment was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates segments as point pairs.
    pub fn lines(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.segments
            .iter()
            .map(|&[a, b]| (self.points[a as usize], self.points[b as usize]))
    }
}

/// Square corners in strides: bottom-left, bottom-right, top-right, top-left.
const SQUARE_CORNERS: [[i32; 2]; 4] = [[0, 0], [1, 0], [1, 1], [0, 1]];

/// Square edges as corner pairs: bottom, right, top, left.
const SQUARE_EDGES: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];

/// Segments per configuration; saddles (5, 10) list the variant used when the
/// square's center lies outside the level set.
const SEGMENT_TABLE: [&[[usize; 2]]; 16] = [
    &[],
    &[[3, 0]],
    &[[0, 1]],
    &[[3, 1]],
    &[[1, 2]],
    &[[3, 0], [1, 2]],
    &[[0, 2]],
    &[[2, 3]],
    &[[2, 3]],
    &[[0, 2]],
    &[[0, 1], [2, 3]],
    &[[1, 2]],
    &[[3, 1]],
    &[[0, 1]],
    &[[3, 0]],
    &[],
];

/// Saddle segments used when the center lies inside the level set.
const SADDLE_CONNECTED: [(usize, &[[usize; 2]]); 2] =
    [(5, &[[0, 1], [2, 3]]), (10, &[[3, 0], [1, 2]])];

/// Traces the contour of `source` at `level`, stepping `grid_size` lattice units.
///
/// Bit `i` of a square's configuration is set when corner `i` is at or below
/// the level, matching the 3D sweep.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn extract_contour<P: PlaneSource + ?Sized>(
    source: &P,
    level: f32,
    grid_size: u32,
) -> Result<Contour> {
    ExtractionOptions::new(level)
        .with_grid_size(grid_size)
        .validate()?;
    let stride = grid_size as i32;
    let (nx, ny) = (source.size_x() as i64, source.size_y() as i64);

    let mut contour = Contour::default();
    let mut lookup: HashMap<[u32; 2], u32> = HashMap::new();

    let mut y = 0_i32;
    while i64::from(y) + i64::from(stride) < ny {
        let mut x = 0_i32;
        while i64::from(x) + i64::from(stride) < nx {
            let corners = SQUARE_CORNERS.map(|[dx, dy]| {
                let (cx, cy) = (x + dx * stride, y + dy * stride);
                (Vec2::new(cx as f32, cy as f32), source.sample(cx, cy))
            });
            let case = corners
                .iter()
                .enumerate()
                .fold(0_usize, |acc, (i, &(_, v))| acc | (usize::from(v <= level) << i));

            let mut segments = SEGMENT_TABLE[case];
            if let Some(&(_, connected)) = SADDLE_CONNECTED.iter().find(|(c, _)| *c == case) {
                let center = corners.iter().map(|&(_, v)| v).sum::<f32>() * 0.25;
                if center <= level {
                    segments = connected;
                }
            }

            for &[ea, eb] in segments {
                let a = edge_point(level, &corners, ea);
                let b = edge_point(level, &corners, eb);
                let ia = push_point(&mut contour, &mut lookup, a);
                let ib = push_point(&mut contour, &mut lookup, b);
                contour.segments.push([ia, ib]);
            }
            x += stride;
        }
        y += stride;
    }

    log::debug!(
        "contour at level {level}: {} points, {} segments",
        contour.points.len(),
        contour.segments.len()
    );
    Ok(contour)
}

fn edge_point(level: f32, corners: &[(Vec2, f32); 4], edge: usize) -> Vec2 {
    let [a, b] = SQUARE_EDGES[edge];
    let (p1, v1) = corners[a];
    let (p2, v2) = corners[b];
    if (level - v1).abs() < INTERPOLATION_EPSILON {
        return p1;
    }
    if (level - v2).abs() < INTERPOLATION_EPSILON {
        return p2;
    }
    if (v1 - v2).abs() < INTERPOLATION_EPSILON {
        return p1;
    }
    let alpha = (level - v2) / (v1 - v2);
    alpha * p1 + (1.0 - alpha) * p2
}

#[allow(clippy::cast_possible_truncation)]
fn push_point(contour: &mut Contour, lookup: &mut HashMap<[u32; 2], u32>, p: Vec2) -> u32 {
    *lookup.entry([p.x.to_bits(), p.y.to_bits()]).or_insert_with(|| {
        contour.points.push(p);
        (contour.points.len() - 1) as u32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::DenseVolume;

    struct Grid {
        size: usize,
        values: Vec<f32>,
    }

    impl PlaneSource for Grid {
        fn sample(&self, x: i32, y: i32) -> f32 {
            let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                return 0.0;
            };
            if x < self.size && y < self.size {
                self.values[x + y * self.size]
            } else {
                0.0
            }
        }

        fn size_x(&self) -> usize {
            self.size
        }

        fn size_y(&self) -> usize {
            self.size
        }
    }

    #[test]
    fn test_flat_plane_has_no_contour() {
        let grid = Grid {
            size: 4,
            values: vec![1.0; 16],
        };
        assert!(extract_contour(&grid, 0.5, 1).unwrap().is_empty());
    }

    #[test]
    fn test_vertical_line() {
        // Left column 0, right column 1: one vertical segment at x = 0.5.
        let grid = Grid {
            size: 2,
            values: vec![0.0, 1.0, 0.0, 1.0],
        };
        let contour = extract_contour(&grid, 0.5, 1).unwrap();
        assert_eq!(contour.segments.len(), 1);
        for (a, b) in contour.lines() {
            assert!((a.x - 0.5).abs() < 1e-6);
            assert!((b.x - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_closed_loop_shares_points() {
        // A single bump in the middle of a 3x3 grid yields a closed diamond.
        let mut values = vec![0.0; 9];
        values[4] = 1.0;
        let grid = Grid { size: 3, values };
        let contour = extract_contour(&grid, 0.5, 1).unwrap();
        assert_eq!(contour.segments.len(), 4);
        assert_eq!(contour.points.len(), 4);
    }

    #[test]
    fn test_saddle_resolution_depends_on_center() {
        // Corners 0 and 2 low, 1 and 3 high; the center averages to 0.5.
        let grid = Grid {
            size: 2,
            values: vec![0.0, 1.0, 1.0, 0.0],
        };

        // Center inside: the low corners connect, cutting off corners 1 and 3.
        let connected = extract_contour(&grid, 0.6, 1).unwrap();
        let (a, b) = connected.lines().next().unwrap();
        assert_eq!(connected.segments.len(), 2);
        assert!(a.y.abs() < 1e-6);
        assert!((b.x - 1.0).abs() < 1e-6);

        // Center outside: corners 0 and 2 are cut off separately.
        let separated = extract_contour(&grid, 0.4, 1).unwrap();
        let (a, b) = separated.lines().next().unwrap();
        assert_eq!(separated.segments.len(), 2);
        assert!(a.x.abs() < 1e-6);
        assert!(b.y.abs() < 1e-6);
    }

    #[test]
    fn test_volume_slice() {
        let volume = DenseVolume::from_fn([3, 3, 2], |x, _, z| if z == 1 { x as f32 } else { 0.0 });
        let empty = extract_contour(&VolumeSlice::new(&volume, 0), 0.5, 1).unwrap();
        assert!(empty.is_empty());
        let ramp = extract_contour(&VolumeSlice::new(&volume, 1), 0.5, 1).unwrap();
        assert_eq!(ramp.segments.len(), 2);
    }

    #[test]
    fn test_rejects_bad_grid_size() {
        let grid = Grid {
            size: 2,
            values: vec![0.0; 4],
        };
        assert!(extract_contour(&grid, 0.5, 0).is_err());
    }
}
