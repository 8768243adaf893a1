//! isosweep: incremental, pausable Marching Cubes over streamed scalar volumes.
//!
//! An [`IsosurfaceRunner`] sweeps a [`VolumeSource`] one cell at a time and
//! hands growing [`Mesh`] snapshots to a consumer while it goes, so a viewer can
//! show the surface building up instead of waiting for the whole volume.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use isosweep::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     // A sphere of radius 20 centered in a 64^3 volume
//!     let volume = FnVolume::new([64, 64, 64], |x, y, z| {
//!         Vec3::new(x as f32, y as f32, z as f32).distance(Vec3::splat(32.0))
//!     });
//!
//!     let options = ExtractionOptions::new(20.0).with_update(UpdateType::Slice);
//!     let sweep = IsosurfaceRunner::new(options)?
//!         .on_mesh(|mesh| println!("{} triangles so far", mesh.num_triangles()))
//!         .spawn(Arc::new(volume))?;
//!
//!     let outcome = sweep.join();
//!     println!("{:?}", outcome.stats());
//!     Ok(())
//! }
//! ```
//!
//! # Update granularity
//!
//! - [`UpdateType::Cube`] - a snapshot after every cell that added triangles
//! - [`UpdateType::Slice`] - a snapshot after every z-slice that added triangles
//! - [`UpdateType::Complete`] - exactly one snapshot, at the end
//!
//! With [`ExtractionOptions::pause_on_update`] the sweep suspends after each
//! snapshot until [`RunnerHandle::resume`] is called.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::many_single_char_names)]

mod control;
mod runner;
mod slices;

pub use control::{RunState, RunnerHandle};
pub use runner::{IsosurfaceRunner, RunOutcome, SweepStats, SweepThread, WORKER_THREAD_NAME};

// Re-export core types
pub use isosweep_core::{
    case_tables, checked_dims, extract_contour, interpolate, Cell, Contour, CornerVertex,
    DenseVolume, EdgeCache, EdgeKey, ExtractionOptions, FnVolume, IsosweepError, Mesh,
    MeshAccumulator, PlaneSource, Result, UpdateType, Vertex, VolumeSlice, VolumeSource, Vec2,
    Vec3, INTERPOLATION_EPSILON, MAX_AXIS_EXTENT,
};

/// Initializes `env_logger` from the `RUST_LOG` environment variable.
///
/// Safe to call more than once; later calls do nothing.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("isosweep logging initialized");
    }
}
