//! Corner samples, edge-intersection vertices and the interpolation between them.

use std::hash::{Hash, Hasher};

use glam::Vec3;

use crate::volume::VolumeSource;

/// Threshold below which two scalar values are treated as equal during
/// interpolation.
pub const INTERPOLATION_EPSILON: f32 = 1e-4;

/// A lattice point of a cell: its position, a gradient-estimated normal and the
/// sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerVertex {
    /// Position in lattice units.
    pub position: Vec3,
    /// Negated central-difference gradient, not normalized.
    pub normal: Vec3,
    /// Sample value at `position`.
    pub value: f32,
}

impl CornerVertex {
    /// Creates a corner from precomputed parts.
    pub fn new(position: Vec3, normal: Vec3, value: f32) -> Self {
        Self {
            position,
            normal,
            value,
        }
    }

    /// Samples a corner from a volume.
    ///
    /// The normal is `(s(p - stride * e_i) - s(p + stride * e_i)) / stride` per
    /// axis, which costs six extra reads on top of the value itself.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample<V: VolumeSource + ?Sized>(source: &V, x: i32, y: i32, z: i32, stride: i32) -> Self {
        let inv = 1.0 / stride as f32;
        let normal = Vec3::new(
            source.sample(x - stride, y, z) - source.sample(x + stride, y, z),
            source.sample(x, y - stride, z) - source.sample(x, y + stride, z),
            source.sample(x, y, z - stride) - source.sample(x, y, z + stride),
        ) * inv;
        Self {
            position: Vec3::new(x as f32, y as f32, z as f32),
            normal,
            value: source.sample(x, y, z),
        }
    }

    /// Returns this corner as a surface vertex (position and normal only).
    #[must_use]
    pub fn to_vertex(&self) -> Vertex {
        Vertex::new(self.position, self.normal)
    }
}

/// A point where the isosurface crosses a cell edge.
///
/// Equality and hashing are bitwise over position and normal, which is what
/// output-vertex deduplication keys on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    /// Position in lattice units.
    pub position: Vec3,
    /// Shading normal.
    pub normal: Vec3,
}

impl Vertex {
    /// Creates a vertex.
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }

    /// Bit pattern used for equality and hashing.
    #[must_use]
    pub fn key(&self) -> [u32; 6] {
        [
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
            self.normal.x.to_bits(),
            self.normal.y.to_bits(),
            self.normal.z.to_bits(),
        ]
    }

    /// End point of the debug normal line drawn from this vertex.
    #[must_use]
    pub fn normal_tip(&self) -> Vec3 {
        self.position + self.normal
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Finds where the field crosses `level` between two corners.
///
/// Snaps to an endpoint when the level is within [`INTERPOLATION_EPSILON`] of
/// it (checking `a` first), and returns `a` for a flat edge. Otherwise
/// positions and normals are blended linearly and the normal is renormalized;
/// a vanishing normal stays zero.
#[must_use]
pub fn interpolate(level: f32, a: &CornerVertex, b: &CornerVertex) -> Vertex {
    if (level - a.value).abs() < INTERPOLATION_EPSILON {
        return a.to_vertex();
    }
    if (level - b.value).abs() < INTERPOLATION_EPSILON {
        return b.to_vertex();
    }
    if (a.value - b.value).abs() < INTERPOLATION_EPSILON {
        return a.to_vertex();
    }

    let alpha = (level - b.value) / (a.value - b.value);
    let position = alpha * a.position + (1.0 - alpha) * b.position;
    let normal = (alpha * a.normal + (1.0 - alpha) * b.normal).normalize_or_zero();
    Vertex::new(position, normal)
}
