//! Extracts a sphere slice by slice on a worker thread.
//!
//! The sweep pauses after every snapshot; the main thread prints what it got
//! and resumes it. Run with `RUST_LOG=debug` to see per-slice logging.
//!
//! ```sh
//! cargo run --example isosurface_demo -- 48
//! ```

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use isosweep::*;

fn main() -> Result<()> {
    init_logging();

    let size: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(32);
    let center = Vec3::splat((size as f32 - 1.0) / 2.0);
    let radius = size as f32 / 3.0;
    let volume = FnVolume::new([size, size, size], move |x, y, z| {
        Vec3::new(x as f32, y as f32, z as f32).distance(center)
    });

    let options = ExtractionOptions::new(radius)
        .with_update(UpdateType::Slice)
        .with_pause_on_update(true);
    println!("options: {}", options.to_json()?);

    let (tx, rx) = mpsc::channel();
    let sweep = IsosurfaceRunner::new(options)?
        .on_mesh(move |mesh| {
            // Hand the snapshot off; the worker must not block on the consumer.
            let _ = tx.send(mesh);
        })
        .on_complete(|elapsed| println!("sweep completed in {elapsed:?}"))
        .spawn(Arc::new(volume))?;
    let handle = sweep.handle().clone();

    while handle.wait_until_paused(Duration::from_secs(5)) {
        for mesh in rx.try_iter() {
            println!(
                "{:5.1}%  {:6} triangles  {:6} vertices",
                handle.progress() * 100.0,
                mesh.num_triangles(),
                mesh.num_vertices()
            );
        }
        handle.resume();
    }

    let outcome = sweep.join();
    let stats = outcome.stats();
    println!(
        "cells: {} visited, {} skipped; corners: {} sampled, {} reused; edges: {} interpolated, {} reused",
        stats.cells_visited,
        stats.cells_skipped,
        stats.corners_computed,
        stats.corners_reused,
        stats.edges_interpolated,
        stats.edges_reused
    );
    if let Some((min, max)) = outcome.mesh().and_then(Mesh::bounding_box) {
        println!("bounds: {min} .. {max}");
    }

    // The same field traced in 2D through the middle slice.
    let middle = DenseVolume::from_fn([size, size, 1], |x, y, _| {
        Vec3::new(x as f32, y as f32, center.z).distance(center)
    });
    let contour = extract_contour(&VolumeSlice::new(&middle, 0), radius, 1)?;
    println!(
        "middle slice contour: {} points, {} segments",
        contour.points.len(),
        contour.segments.len()
    );
    Ok(())
}
