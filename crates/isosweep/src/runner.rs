//! The incremental Marching Cubes sweep.
//!
//! Cells are visited z outer, y middle, x inner, one grid stride apart. Each
//! cell takes the corners it shares with its -x, -y and -z neighbors from the
//! slice buffer and the crossings it shares with them from the edge cache, so
//! every lattice point is sampled once and every crossed edge is interpolated
//! once.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use isosweep_core::case_tables;
use isosweep_core::{
    checked_dims, Cell, CornerVertex, EdgeCache, EdgeKey, ExtractionOptions, Mesh,
    MeshAccumulator, Result, UpdateType, VolumeSource, CORNER_COUNT, CORNER_OFFSETS, EDGE_COUNT,
};

use crate::control::{Control, RunState, RunnerHandle};
use crate::slices::CellSlices;

/// Name of the worker thread started by [`IsosurfaceRunner::spawn`].
pub const WORKER_THREAD_NAME: &str = "isosurface-sweep";

/// Corners taken from the cell below: `(mine, theirs)`.
const FROM_BELOW: [(usize, usize); 4] = [(0, 4), (1, 5), (2, 6), (3, 7)];
/// Corners taken from the cell at -x.
const FROM_LEFT: [(usize, usize); 4] = [(0, 1), (3, 2), (4, 5), (7, 6)];
/// Corners taken from the cell at -y.
const FROM_FRONT: [(usize, usize); 4] = [(0, 3), (1, 2), (4, 7), (5, 6)];

type MeshCallback = Box<dyn FnMut(Mesh) + Send>;
type ProgressCallback = Box<dyn FnMut(f32) + Send>;
type CompleteCallback = Box<dyn FnOnce(Duration) + Send>;

/// Counters collected during one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Cells whose corners were assembled.
    pub cells_visited: u64,
    /// Visited cells that were entirely inside or outside the surface.
    pub cells_skipped: u64,
    /// Corners sampled from the volume, gradient included.
    pub corners_computed: u64,
    /// Corners copied from an already visited neighbor.
    pub corners_reused: u64,
    /// Edge crossings computed by interpolation.
    pub edges_interpolated: u64,
    /// Edge crossings taken from the edge cache.
    pub edges_reused: u64,
    /// Snapshots handed to the mesh callback.
    pub snapshots_emitted: u64,
    /// Largest number of crossings held by the edge cache at once.
    pub peak_cache_len: usize,
}

/// How a sweep ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every cell was visited.
    Completed {
        /// The complete surface.
        mesh: Mesh,
        /// Sweep counters.
        stats: SweepStats,
        /// Wall-clock duration of the sweep.
        elapsed: Duration,
    },
    /// The sweep was cancelled; the last emitted snapshot is the final state.
    Cancelled {
        /// Counters up to the point of cancellation.
        stats: SweepStats,
    },
}

impl RunOutcome {
    /// The final mesh of a completed sweep.
    pub fn mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Completed { mesh, .. } => Some(mesh),
            Self::Cancelled { .. } => None,
        }
    }

    /// Sweep counters.
    pub fn stats(&self) -> &SweepStats {
        match self {
            Self::Completed { stats, .. } | Self::Cancelled { stats } => stats,
        }
    }

    /// Returns true if the sweep was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[derive(Default)]
struct Callbacks {
    on_mesh: Option<MeshCallback>,
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompleteCallback>,
}

/// Extracts an isosurface from a [`VolumeSource`], one cell at a time.
///
/// Options are validated when the runner is created and fixed from then on.
/// Snapshots, progress and completion are delivered through callbacks on the
/// thread executing the sweep. Use [`Self::handle`] to pause, resume or cancel
/// from other threads.
///
/// # Example
///
/// ```
/// use isosweep::{DenseVolume, ExtractionOptions, IsosurfaceRunner, UpdateType};
///
/// let volume = DenseVolume::from_fn([2, 2, 2], |_, _, z| z as f32);
/// let options = ExtractionOptions::new(0.5).with_update(UpdateType::Complete);
/// let outcome = IsosurfaceRunner::new(options)?.run(&volume)?;
/// assert_eq!(outcome.mesh().map(|m| m.num_triangles()), Some(2));
/// # Ok::<(), isosweep::IsosweepError>(())
/// ```
pub struct IsosurfaceRunner {
    options: ExtractionOptions,
    control: Arc<Control>,
    callbacks: Callbacks,
}

impl fmt::Debug for IsosurfaceRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsosurfaceRunner")
            .field("options", &self.options)
            .field("state", &self.handle().state())
            .finish_non_exhaustive()
    }
}

impl IsosurfaceRunner {
    /// Creates an idle runner, rejecting invalid options.
    pub fn new(options: ExtractionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            control: Arc::new(Control::default()),
            callbacks: Callbacks::default(),
        })
    }

    /// The options this runner sweeps with.
    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Returns a handle controlling this runner's sweep.
    pub fn handle(&self) -> RunnerHandle {
        RunnerHandle::new(self.control.clone())
    }

    /// Sets the consumer of mesh snapshots.
    ///
    /// The callback runs on the sweep thread and holds it up while it runs.
    pub fn on_mesh(mut self, callback: impl FnMut(Mesh) + Send + 'static) -> Self {
        self.callbacks.on_mesh = Some(Box::new(callback));
        self
    }

    /// Sets the progress observer, called once per slice and once at the end.
    pub fn on_progress(mut self, callback: impl FnMut(f32) + Send + 'static) -> Self {
        self.callbacks.on_progress = Some(Box::new(callback));
        self
    }

    /// Sets the callback invoked with the elapsed time when the sweep
    /// completes. Not invoked on cancellation.
    pub fn on_complete(mut self, callback: impl FnOnce(Duration) + Send + 'static) -> Self {
        self.callbacks.on_complete = Some(Box::new(callback));
        self
    }

    /// Sweeps `source` on the calling thread.
    ///
    /// Fails before reading any sample if the volume is empty or too large.
    pub fn run<V: VolumeSource + ?Sized>(self, source: &V) -> Result<RunOutcome> {
        let dims = checked_dims(source)?;
        Ok(Sweep::new(self, source, dims).run())
    }

    /// Sweeps `source` on a dedicated worker thread.
    ///
    /// Fails before starting the thread if the volume is empty or too large, or
    /// if the thread cannot be created.
    pub fn spawn<V>(self, source: Arc<V>) -> Result<SweepThread>
    where
        V: VolumeSource + Send + Sync + ?Sized + 'static,
    {
        let dims = checked_dims(&*source)?;
        let handle = self.handle();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || Sweep::new(self, &*source, dims).run())?;
        Ok(SweepThread { handle, thread })
    }
}

/// A sweep running on its own thread.
#[derive(Debug)]
pub struct SweepThread {
    handle: RunnerHandle,
    thread: JoinHandle<RunOutcome>,
}

impl SweepThread {
    /// Control handle of the running sweep.
    pub fn handle(&self) -> &RunnerHandle {
        &self.handle
    }

    /// Returns true once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the worker and returns its outcome.
    ///
    /// A panic inside a callback is resumed on the joining thread.
    pub fn join(self) -> RunOutcome {
        self.thread
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
    }
}

/// Number of cells along an axis of `extent` samples.
fn cells_along(extent: usize, stride: usize) -> usize {
    extent.saturating_sub(1) / stride
}

fn share(
    shared: &mut [Option<CornerVertex>; CORNER_COUNT],
    from: &[CornerVertex; CORNER_COUNT],
    pairs: &[(usize, usize); 4],
) {
    for &(mine, theirs) in pairs {
        if shared[mine].is_none() {
            shared[mine] = Some(from[theirs]);
        }
    }
}

/// Working state of one sweep, owned by the thread executing it.
struct Sweep<'a, V: ?Sized> {
    source: &'a V,
    options: ExtractionOptions,
    stride: i32,
    cells: [usize; 3],
    control: Arc<Control>,
    callbacks: Callbacks,
    slices: CellSlices,
    cache: EdgeCache,
    mesh: MeshAccumulator,
    stats: SweepStats,
    /// Index count of the last emitted snapshot.
    emitted: Option<usize>,
    progress: f32,
}

impl<'a, V: VolumeSource + ?Sized> Sweep<'a, V> {
    fn new(runner: IsosurfaceRunner, source: &'a V, dims: [usize; 3]) -> Self {
        let stride = runner.options.grid_size as usize;
        let cells = dims.map(|extent| cells_along(extent, stride));
        if cells.contains(&0) {
            log::warn!(
                "grid size {stride} leaves no cells in a {}x{}x{} volume",
                dims[0],
                dims[1],
                dims[2]
            );
        }
        Self {
            source,
            options: runner.options,
            stride: stride as i32,
            cells,
            control: runner.control,
            callbacks: runner.callbacks,
            slices: CellSlices::new(cells[0], cells[1]),
            cache: EdgeCache::new(),
            mesh: MeshAccumulator::new(),
            stats: SweepStats::default(),
            emitted: None,
            progress: 0.0,
        }
    }

    fn run(mut self) -> RunOutcome {
        let started = Instant::now();
        let [nx, ny, nz] = self.cells;
        self.control.begin();
        self.report_progress(0.0);
        log::info!(
            "isosurface sweep started: level {}, grid size {}, {nx}x{ny}x{nz} cells, {:?} updates",
            self.options.level,
            self.stride,
            self.options.update
        );

        for iz in 0..nz {
            for iy in 0..ny {
                for ix in 0..nx {
                    if !self.control.checkpoint() {
                        return self.cancelled();
                    }
                    self.process_cell(ix, iy, iz);
                    if self.options.update == UpdateType::Cube {
                        self.emit(false);
                    }
                }
            }
            self.finish_slice(iz);
            if self.control.is_cancel_requested() {
                return self.cancelled();
            }
        }
        self.completed(started)
    }

    fn coord(&self, i: usize) -> i32 {
        i as i32 * self.stride
    }

    fn process_cell(&mut self, ix: usize, iy: usize, iz: usize) {
        let (x, y, z) = (self.coord(ix), self.coord(iy), self.coord(iz));

        let mut shared = [None; CORNER_COUNT];
        if iz > 0 {
            share(&mut shared, self.slices.get(iz - 1, ix, iy), &FROM_BELOW);
        }
        if ix > 0 {
            share(&mut shared, self.slices.get(iz, ix - 1, iy), &FROM_LEFT);
        }
        if iy > 0 {
            share(&mut shared, self.slices.get(iz, ix, iy - 1), &FROM_FRONT);
        }

        let corners = std::array::from_fn(|i| {
            if let Some(corner) = shared[i] {
                self.stats.corners_reused += 1;
                return corner;
            }
            self.stats.corners_computed += 1;
            let [dx, dy, dz] = CORNER_OFFSETS[i];
            CornerVertex::sample(
                self.source,
                x + dx * self.stride,
                y + dy * self.stride,
                z + dz * self.stride,
                self.stride,
            )
        });

        let mut cell = Cell::new(corners);
        self.stats.cells_visited += 1;
        let case = cell.case_index(self.options.level);
        if case_tables::is_uniform(case) {
            self.stats.cells_skipped += 1;
        } else {
            self.resolve_edges(&mut cell, case, x, y, z);
            for triangle in cell.triangles(case) {
                self.mesh.push_triangle(triangle);
            }
        }
        self.slices.set(iz, ix, iy, *cell.corners());
    }

    fn resolve_edges(&mut self, cell: &mut Cell, case: u8, x: i32, y: i32, z: i32) {
        let mask = case_tables::edge_mask(case);
        for edge in (0..EDGE_COUNT).filter(|&e| mask & (1 << e) != 0) {
            let vertex = if let Some(v) = self.cache.find_shared(x, y, z, self.stride, edge) {
                self.stats.edges_reused += 1;
                v
            } else {
                self.stats.edges_interpolated += 1;
                cell.interpolate_edge(edge, self.options.level)
            };
            // Stored under this cell too, so the next neighbor finds it one step back.
            self.cache.insert(EdgeKey::new(x, y, z, edge), vertex);
            cell.set_edge(edge, vertex);
        }
    }

    fn finish_slice(&mut self, iz: usize) {
        let z = self.coord(iz);
        self.cache.evict_finished_slice(z);
        self.report_progress((iz + 1) as f32 / self.cells[2] as f32);
        log::debug!(
            "slice z={z} done: {:.1}%, {} cached edges, {} vertices",
            self.progress * 100.0,
            self.cache.len(),
            self.mesh.num_vertices()
        );
        if self.options.update == UpdateType::Slice {
            self.emit(false);
        }
    }

    /// Hands a snapshot to the consumer if the index buffer grew since the last
    /// one. The end-of-sweep snapshot is also emitted when nothing was before.
    /// Nothing is emitted once cancellation has been requested.
    fn emit(&mut self, end_of_sweep: bool) {
        if !end_of_sweep && self.control.is_cancel_requested() {
            return;
        }
        let len = self.mesh.num_indices();
        let grown = len > self.emitted.unwrap_or(0);
        if !grown && !(end_of_sweep && self.emitted.is_none()) {
            return;
        }
        self.emitted = Some(len);
        self.stats.snapshots_emitted += 1;
        if !end_of_sweep && self.options.pauses_after_update() {
            self.control.request_pause();
        }
        if let Some(on_mesh) = self.callbacks.on_mesh.as_mut() {
            on_mesh(self.mesh.snapshot());
        }
    }

    fn report_progress(&mut self, progress: f32) {
        self.progress = progress;
        self.control.set_progress(progress);
        if let Some(on_progress) = self.callbacks.on_progress.as_mut() {
            on_progress(progress);
        }
    }

    fn cancelled(mut self) -> RunOutcome {
        self.stats.peak_cache_len = self.cache.peak_len();
        log::info!(
            "isosurface sweep cancelled after {} cells, {} triangles emitted",
            self.stats.cells_visited,
            self.emitted.unwrap_or(0) / 3
        );
        self.control.finish(RunState::Cancelled);
        RunOutcome::Cancelled { stats: self.stats }
    }

    fn completed(mut self, started: Instant) -> RunOutcome {
        self.emit(true);
        if self.progress < 1.0 {
            self.report_progress(1.0);
        }
        self.stats.peak_cache_len = self.cache.peak_len();
        let elapsed = started.elapsed();
        let mesh = self.mesh.into_mesh();
        log::info!(
            "isosurface sweep finished in {elapsed:?}: {} triangles, {} vertices, {:?}",
            mesh.num_triangles(),
            mesh.num_vertices(),
            self.stats
        );
        if let Some(on_complete) = self.callbacks.on_complete.take() {
            on_complete(elapsed);
        }
        self.control.finish(RunState::Finished);
        RunOutcome::Completed {
            mesh,
            stats: self.stats,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isosweep_core::DenseVolume;

    fn run(volume: &DenseVolume, options: ExtractionOptions) -> RunOutcome {
        IsosurfaceRunner::new(options).unwrap().run(volume).unwrap()
    }

    #[test]
    fn test_cells_along() {
        assert_eq!(cells_along(2, 1), 1);
        assert_eq!(cells_along(1, 1), 0);
        assert_eq!(cells_along(5, 2), 2);
        assert_eq!(cells_along(4, 2), 1);
        assert_eq!(cells_along(3, 4), 0);
    }

    #[test]
    fn test_each_lattice_point_sampled_once() {
        let volume = DenseVolume::from_fn([4, 3, 5], |x, y, z| (x * y + z) as f32);
        let outcome = run(&volume, ExtractionOptions::new(2.5));
        let stats = outcome.stats();
        assert_eq!(stats.cells_visited, 3 * 2 * 4);
        assert_eq!(stats.corners_computed, 4 * 3 * 5);
        assert_eq!(
            stats.corners_computed + stats.corners_reused,
            8 * stats.cells_visited
        );
    }

    #[test]
    fn test_matches_independent_cells() {
        let volume = DenseVolume::from_fn([4, 4, 4], |x, y, z| ((x * 7 + y * 3 + z) % 5) as f32);
        let level = 2.0;
        let outcome = run(&volume, ExtractionOptions::new(level));
        let mesh = outcome.mesh().unwrap();

        let mut reference = MeshAccumulator::new();
        for z in 0..3 {
            for y in 0..3 {
                for x in 0..3 {
                    let mut cell = Cell::sample(&volume, x, y, z, 1);
                    let case = cell.resolve_edges(level);
                    for triangle in cell.triangles(case) {
                        reference.push_triangle(triangle);
                    }
                }
            }
        }

        // Shared edges may be interpolated from the other end, so compare loosely.
        let reference = reference.into_mesh();
        assert_eq!(mesh.num_triangles(), reference.num_triangles());
        assert!(mesh.num_vertices() <= reference.num_vertices());
        for (a, b) in mesh.triangles().zip(reference.triangles()) {
            for (p, q) in a.iter().zip(b.iter()) {
                assert!(p.distance(*q) < 1e-5, "{p} vs {q}");
            }
        }
    }

    #[test]
    fn test_edge_cache_stays_bounded() {
        // A vertical sheet through 9 of the 25 cells of every slice.
        let volume = DenseVolume::from_fn([6, 6, 12], |x, y, _| if x + y > 5 { 1.0 } else { 0.0 });
        let outcome = run(&volume, ExtractionOptions::new(0.5));
        let stats = outcome.stats();
        assert!(stats.edges_reused > 0);
        assert!(stats.peak_cache_len <= 9 * 12 + 9 * 4);
    }

    #[test]
    fn test_stride_skips_lattice_points() {
        let volume = DenseVolume::from_fn([5, 5, 5], |_, _, z| z as f32);
        let outcome = run(&volume, ExtractionOptions::new(1.5).with_grid_size(2));
        let stats = outcome.stats();
        assert_eq!(stats.cells_visited, 8);
        assert_eq!(stats.corners_computed, 27);
        let mesh = outcome.mesh().unwrap();
        assert_eq!(mesh.num_triangles(), 8);
        assert!(mesh.vertex_positions().all(|p| (p.z - 1.5).abs() < 1e-6));
    }
}
