//! Scalar volume sources.
//!
//! A [`VolumeSource`] is the pull-based boundary between the sweep and whatever
//! produces samples (an image decoder, a procedural field, a test fixture).
//! Reads outside `[0, size)` on any axis return `0.0`; there is no clamping and
//! no error signaling, so callers may freely read one stride past the lattice
//! when estimating gradients.

use std::sync::Arc;

use crate::error::{IsosweepError, Result};

/// Largest supported extent along any single axis.
///
/// Lattice coordinates are `i32`, and the sweep reads up to two strides past a
/// coordinate, so extents are kept well below `i32::MAX`.
pub const MAX_AXIS_EXTENT: usize = 1 << 30;

/// A read-only scalar field sampled on an integer lattice.
///
/// Implementations may keep internal caches, but must then provide their own
/// synchronization if one source is shared between concurrent runs.
pub trait VolumeSource {
    /// Returns the sample at `(x, y, z)`, or `0.0` outside the lattice.
    fn sample(&self, x: i32, y: i32, z: i32) -> f32;

    /// Number of samples along X.
    fn size_x(&self) -> usize;

    /// Number of samples along Y.
    fn size_y(&self) -> usize;

    /// Number of samples along Z.
    fn size_z(&self) -> usize;

    /// Returns all three extents.
    fn dims(&self) -> [usize; 3] {
        [self.size_x(), self.size_y(), self.size_z()]
    }

    /// Returns true if the coordinate lies inside the lattice.
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        in_range(x, self.size_x()) && in_range(y, self.size_y()) && in_range(z, self.size_z())
    }
}

#[inline]
fn in_range(c: i32, size: usize) -> bool {
    usize::try_from(c).is_ok_and(|c| c < size)
}

/// Checks that a source can be swept: non-empty and addressable on every axis.
pub fn checked_dims<V: VolumeSource + ?Sized>(source: &V) -> Result<[usize; 3]> {
    let [x, y, z] = source.dims();
    if x == 0 || y == 0 || z == 0 {
        return Err(IsosweepError::EmptyVolume { x, y, z });
    }
    for (axis, extent) in [('x', x), ('y', y), ('z', z)] {
        if extent > MAX_AXIS_EXTENT {
            return Err(IsosweepError::ExtentTooLarge {
                axis,
                extent,
                max: MAX_AXIS_EXTENT,
            });
        }
    }
    Ok([x, y, z])
}

/// A volume that owns its samples in a flat buffer.
///
/// The value for lattice point `(x, y, z)` is stored at `x + y * nx + z * nx * ny`.
#[derive(Debug, Clone, Default)]
pub struct DenseVolume {
    dims: [usize; 3],
    values: Vec<f32>,
}

impl DenseVolume {
    /// Wraps an existing buffer.
    ///
    /// Returns an error if `values.len()` does not match the product of `dims`.
    pub fn new(dims: [usize; 3], values: Vec<f32>) -> Result<Self> {
        let expected = dims[0] * dims[1] * dims[2];
        if values.len() != expected {
            return Err(IsosweepError::SizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { dims, values })
    }

    /// Creates a zero-filled volume.
    pub fn zeros(dims: [usize; 3]) -> Self {
        Self {
            dims,
            values: vec![0.0; dims[0] * dims[1] * dims[2]],
        }
    }

    /// Builds a volume by evaluating `f` at every lattice point.
    pub fn from_fn(dims: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    values.push(f(x, y, z));
                }
            }
        }
        Self { dims, values }
    }

    /// Flattens a lattice coordinate to a buffer index.
    #[must_use]
    pub fn flatten_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dims[0] + z * self.dims[0] * self.dims[1]
    }

    /// Returns the sample at an in-range coordinate.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        if x < self.dims[0] && y < self.dims[1] && z < self.dims[2] {
            Some(self.values[self.flatten_index(x, y, z)])
        } else {
            None
        }
    }

    /// Overwrites the sample at an in-range coordinate.
    ///
    /// Out-of-range writes are ignored and return false.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) -> bool {
        if x < self.dims[0] && y < self.dims[1] && z < self.dims[2] {
            let idx = self.flatten_index(x, y, z);
            self.values[idx] = value;
            true
        } else {
            false
        }
    }

    /// Returns the raw sample buffer.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl VolumeSource for DenseVolume {
    fn sample(&self, x: i32, y: i32, z: i32) -> f32 {
        match (usize::try_from(x), usize::try_from(y), usize::try_from(z)) {
            (Ok(x), Ok(y), Ok(z)) => self.get(x, y, z).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn size_x(&self) -> usize {
        self.dims[0]
    }

    fn size_y(&self) -> usize {
        self.dims[1]
    }

    fn size_z(&self) -> usize {
        self.dims[2]
    }
}

/// A procedural volume backed by a closure.
///
/// The closure is only called for in-range coordinates.
pub struct FnVolume<F> {
    dims: [usize; 3],
    f: F,
}

impl<F> FnVolume<F>
where
    F: Fn(i32, i32, i32) -> f32,
{
    /// Creates a procedural volume with the given extents.
    pub fn new(dims: [usize; 3], f: F) -> Self {
        Self { dims, f }
    }
}

impl<F> VolumeSource for FnVolume<F>
where
    F: Fn(i32, i32, i32) -> f32,
{
    fn sample(&self, x: i32, y: i32, z: i32) -> f32 {
        if self.contains(x, y, z) {
            (self.f)(x, y, z)
        } else {
            0.0
        }
    }

    fn size_x(&self) -> usize {
        self.dims[0]
    }

    fn size_y(&self) -> usize {
        self.dims[1]
    }

    fn size_z(&self) -> usize {
        self.dims[2]
    }
}

impl<V: VolumeSource + ?Sized> VolumeSource for &V {
    fn sample(&self, x: i32, y: i32, z: i32) -> f32 {
        (**self).sample(x, y, z)
    }

    fn size_x(&self) -> usize {
        (**self).size_x()
    }

    fn size_y(&self) -> usize {
        (**self).size_y()
    }

    fn size_z(&self) -> usize {
        (**self).size_z()
    }
}

impl<V: VolumeSource + ?Sized> VolumeSource for Arc<V> {
    fn sample(&self, x: i32, y: i32, z: i32) -> f32 {
        (**self).sample(x, y, z)
    }

    fn size_x(&self) -> usize {
        (**self).size_x()
    }

    fn size_y(&self) -> usize {
        (**self).size_y()
    }

    fn size_z(&self) -> usize {
        (**self).size_z()
    }
}
