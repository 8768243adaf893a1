//! Cross-thread control of a sweep: run state, pause/resume, cancellation and
//! progress.
//!
//! The worker only ever blocks inside [`Control::checkpoint`], which it calls
//! between cells. Every state change is broadcast on one condition variable so
//! observers can wait for the worker to reach a given state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Lifecycle of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Configured, not started.
    #[default]
    Idle,
    /// Visiting cells.
    Running,
    /// Suspended between two cells until resumed.
    Paused,
    /// Swept the whole lattice.
    Finished,
    /// Stopped early on request.
    Cancelled,
}

impl RunState {
    /// Returns true once the sweep can no longer make progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

#[derive(Debug, Default)]
struct Flags {
    state: RunState,
    pause_requested: bool,
    cancel_requested: bool,
}

/// State shared between the worker and every [`RunnerHandle`].
#[derive(Debug, Default)]
pub(crate) struct Control {
    flags: Mutex<Flags>,
    changed: Condvar,
    progress: AtomicU32,
}

impl Control {
    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().expect("runner control lock poisoned")
    }

    fn set_state(&self, flags: &mut Flags, state: RunState) {
        flags.state = state;
        self.changed.notify_all();
    }

    /// Enters `Running` with progress reset to zero.
    pub(crate) fn begin(&self) {
        let mut flags = self.lock();
        self.progress.store(0.0_f32.to_bits(), Ordering::Release);
        self.set_state(&mut flags, RunState::Running);
    }

    /// Asks the worker to suspend at its next checkpoint.
    pub(crate) fn request_pause(&self) {
        let mut flags = self.lock();
        if !flags.state.is_terminal() {
            flags.pause_requested = true;
        }
    }

    /// Blocks while a pause is pending. Returns false if the sweep must stop.
    ///
    /// Only [`RunnerHandle::resume`] moves the state out of `Paused`, so a
    /// pause requested again before the worker wakes applies to the next
    /// checkpoint instead of this one.
    pub(crate) fn checkpoint(&self) -> bool {
        let mut flags = self.lock();
        if flags.pause_requested && !flags.cancel_requested {
            self.set_state(&mut flags, RunState::Paused);
            log::trace!("sweep paused");
            flags = self
                .changed
                .wait_while(flags, |f| f.state == RunState::Paused && !f.cancel_requested)
                .expect("runner control lock poisoned");
        }
        !flags.cancel_requested
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.lock().cancel_requested
    }

    pub(crate) fn set_progress(&self, progress: f32) {
        self.progress.store(progress.to_bits(), Ordering::Release);
    }

    /// Enters a terminal state and drops any pending pause.
    pub(crate) fn finish(&self, state: RunState) {
        let mut flags = self.lock();
        flags.pause_requested = false;
        self.set_state(&mut flags, state);
    }
}

/// Thread-safe remote control for one sweep.
///
/// Cloning is cheap; every clone addresses the same sweep. Requests are
/// honored between cells, never in the middle of one.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    control: Arc<Control>,
}

impl RunnerHandle {
    pub(crate) fn new(control: Arc<Control>) -> Self {
        Self { control }
    }

    /// Suspends the sweep before its next cell.
    pub fn pause(&self) {
        self.control.request_pause();
    }

    /// Continues a paused sweep. Does nothing unless the worker is paused, so
    /// a late call never cancels the pause after the next snapshot.
    ///
    /// The state is `Running` again as soon as this returns.
    pub fn resume(&self) {
        let mut flags = self.control.lock();
        if flags.state == RunState::Paused {
            flags.pause_requested = false;
            self.control.set_state(&mut flags, RunState::Running);
            log::trace!("sweep resumed");
        }
    }

    /// Stops the sweep before its next cell, waking it if paused.
    ///
    /// No further snapshot is emitted and the completion callback never runs.
    pub fn cancel(&self) {
        let mut flags = self.control.lock();
        if !flags.state.is_terminal() {
            flags.cancel_requested = true;
        }
        self.control.changed.notify_all();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.control.lock().state
    }

    /// Returns true while the worker is suspended.
    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancel_requested(&self) -> bool {
        self.control.is_cancel_requested()
    }

    /// Fraction of cells visited, in `[0, 1]`, updated once per slice.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.control.progress.load(Ordering::Acquire))
    }

    /// Waits until `done` accepts the state or `timeout` elapses, returning the
    /// last observed state.
    pub fn wait_for(&self, timeout: Duration, mut done: impl FnMut(RunState) -> bool) -> RunState {
        let flags = self.control.lock();
        let (flags, _) = self
            .control
            .changed
            .wait_timeout_while(flags, timeout, |f| !done(f.state))
            .expect("runner control lock poisoned");
        flags.state
    }

    /// Waits until the worker is paused. Returns false on timeout or if the
    /// sweep ended instead.
    pub fn wait_until_paused(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |s| s == RunState::Paused || s.is_terminal()) == RunState::Paused
    }

    /// Waits until the sweep has finished or been cancelled.
    pub fn wait_until_done(&self, timeout: Duration) -> RunState {
        self.wait_for(timeout, RunState::is_terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_checkpoint_passes_without_requests() {
        let control = Control::default();
        control.begin();
        assert!(control.checkpoint());
        assert_eq!(control.lock().state, RunState::Running);
    }

    #[test]
    fn test_pause_blocks_until_resume() {
        let control = Arc::new(Control::default());
        let handle = RunnerHandle::new(control.clone());
        control.begin();
        handle.pause();

        let worker = thread::spawn(move || control.checkpoint());
        assert!(handle.wait_until_paused(Duration::from_secs(5)));
        handle.resume();
        assert!(worker.join().unwrap());
        assert_eq!(handle.state(), RunState::Running);
    }

    #[test]
    fn test_resume_leaves_paused_state_immediately() {
        let control = Arc::new(Control::default());
        let handle = RunnerHandle::new(control.clone());
        control.begin();
        handle.pause();

        let worker = {
            let control = control.clone();
            thread::spawn(move || control.checkpoint())
        };
        assert!(handle.wait_until_paused(Duration::from_secs(5)));
        handle.resume();
        assert!(!handle.is_paused());
        assert_eq!(handle.state(), RunState::Running);

        // A pause requested before the worker wakes is kept for its next checkpoint.
        handle.pause();
        assert!(worker.join().unwrap());
        assert_eq!(handle.state(), RunState::Running);

        // Resuming a running sweep leaves the pending pause in place.
        handle.resume();
        let worker = {
            let control = control.clone();
            thread::spawn(move || control.checkpoint())
        };
        assert!(handle.wait_until_paused(Duration::from_secs(5)));
        handle.resume();
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_cancel_wakes_paused_worker() {
        let control = Arc::new(Control::default());
        let handle = RunnerHandle::new(control.clone());
        control.begin();
        handle.pause();

        let worker = thread::spawn(move || control.checkpoint());
        assert!(handle.wait_until_paused(Duration::from_secs(5)));
        handle.cancel();
        assert!(!worker.join().unwrap());
        assert!(handle.is_cancel_requested());
    }

    #[test]
    fn test_terminal_state_ignores_requests() {
        let control = Arc::new(Control::default());
        let handle = RunnerHandle::new(control.clone());
        control.begin();
        control.set_progress(1.0);
        control.finish(RunState::Finished);

        handle.pause();
        handle.cancel();
        assert_eq!(handle.state(), RunState::Finished);
        assert!(!handle.is_cancel_requested());
        assert_eq!(handle.progress(), 1.0);
        assert_eq!(
            handle.wait_until_done(Duration::from_millis(10)),
            RunState::Finished
        );
    }
}
