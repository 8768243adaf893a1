//! Core building blocks for isosweep.
//!
//! This crate provides the pieces the incremental sweep is assembled from:
//! - [`VolumeSource`] trait for pull-based scalar sampling, plus dense and
//!   closure-backed adapters
//! - [`Cell`] with the fixed corner/edge numbering, case index and the
//!   Marching Cubes [`case_tables`]
//! - [`interpolate`] for edge crossings and the [`EdgeCache`] sharing them
//!   between neighboring cells
//! - [`MeshAccumulator`] producing deduplicated, indexed [`Mesh`] snapshots
//! - [`ExtractionOptions`] and the error type
//! - [`extract_contour`], the marching squares variant for a single plane

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Lattice math keeps short single-letter axis names
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod case_tables;
pub mod cell;
pub mod contour;
pub mod edge_cache;
pub mod error;
pub mod mesh;
pub mod options;
pub mod vertex;
pub mod volume;

pub use cell::{Cell, CORNER_COUNT, CORNER_OFFSETS, EDGE_CORNERS, EDGE_COUNT};
pub use contour::{extract_contour, Contour, PlaneSource, VolumeSlice};
pub use edge_cache::{EdgeCache, EdgeKey};
pub use error::{IsosweepError, Result};
pub use mesh::{Mesh, MeshAccumulator};
pub use options::{ExtractionOptions, UpdateType};
pub use vertex::{interpolate, CornerVertex, Vertex, INTERPOLATION_EPSILON};
pub use volume::{checked_dims, DenseVolume, FnVolume, VolumeSource, MAX_AXIS_EXTENT};

// Re-export glam types for convenience
pub use glam::{Vec2, Vec3};
