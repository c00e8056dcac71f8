//! Schedulable actions.
//!
//! An action is the unit of work a scheduler worker fires when a category
//! comes up. Every trigger reports a boolean outcome: `true` keeps the
//! category registered, `false` asks the scheduler to evict it (rate and
//! action both).
//!
//! Two shapes exist behind one vocabulary:
//!
//! - [`Action::sync`] runs the callback inline on the worker that fired it.
//!   Cheap, but a slow callback stalls that worker's sampling loop, and the
//!   callback must never re-enter the scheduler's registry (it runs while
//!   the worker holds the registry read lock).
//! - [`Action::background`] hands the callback to a dedicated thread and
//!   returns immediately. Use it for long-running work and for anything
//!   that calls back into the scheduler, such as stopping it or running
//!   zombie cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

/// An action registered with a scheduler, triggered once per fire.
pub enum Action {
    /// Runs inline on the triggering worker.
    Sync(SyncAction),
    /// Runs on its own dedicated thread; triggering only signals it.
    Background(AsyncAction),
}

impl Action {
    /// A synchronous action. The callback runs on whichever worker fires
    /// the category, so it must be safe to call from several workers at
    /// once when the scheduler has more than one thread.
    pub fn sync(callback: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Action::Sync(SyncAction::new(callback))
    }

    /// An asynchronous action with a dedicated worker thread. Triggers
    /// signal the thread and return immediately; a `false` from the
    /// callback latches a failure and every later trigger reports it
    /// without running the callback again.
    pub fn background(callback: impl FnMut() -> bool + Send + 'static) -> Self {
        Action::Background(AsyncAction::new(callback))
    }

    /// Make the action ready to trigger. Idempotent; for background actions
    /// this spawns the worker thread.
    pub fn start(&mut self) {
        match self {
            Action::Sync(_) => {}
            Action::Background(action) => action.start(),
        }
    }

    /// Fire once. Returns `false` to request eviction.
    pub fn trigger(&self) -> bool {
        match self {
            Action::Sync(action) => action.trigger(),
            Action::Background(action) => action.trigger(),
        }
    }
}

/// Inline callback action.
///
/// The callback is owned outright: the scheduler's registry lock guarantees
/// an action is never dropped while a trigger is in flight (replacement
/// swaps it out under the write lock, and triggers hold the read lock).
pub struct SyncAction {
    callback: Box<dyn Fn() -> bool + Send + Sync>,
}

impl SyncAction {
    pub fn new(callback: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    pub fn trigger(&self) -> bool {
        (self.callback)()
    }
}

struct AsyncShared {
    /// Set by trigger, cleared by the worker before each run.
    pending: Mutex<bool>,
    signal: Condvar,
    /// Latched when the callback reports failure; the callback never runs
    /// again afterward.
    failed: AtomicBool,
    /// Set on drop to shut the worker down.
    shutdown: AtomicBool,
}

/// Dedicated-thread action.
///
/// Triggers coalesce: signaling an already-pending action does not queue a
/// second run. Dropping the action waits for the thread to reach an exit
/// point, which can mean waiting out an executing callback; callbacks must
/// therefore never block indefinitely.
pub struct AsyncAction {
    shared: Arc<AsyncShared>,
    // Parked here until start() moves it into the worker thread. The mutex
    // is what keeps the action shareable across scheduler workers despite
    // the callback itself being single-threaded state.
    callback: Mutex<Option<Box<dyn FnMut() -> bool + Send>>>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncAction {
    pub fn new(callback: impl FnMut() -> bool + Send + 'static) -> Self {
        Self {
            shared: Arc::new(AsyncShared {
                pending: Mutex::new(false),
                signal: Condvar::new(),
                failed: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
            }),
            callback: Mutex::new(Some(Box::new(callback))),
            worker: None,
        }
    }

    /// Spawn the worker thread. Idempotent.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some(mut callback) = self.callback.lock().take() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("poisson-action".into())
            .spawn(move || loop {
                {
                    let mut pending = shared.pending.lock();
                    while !*pending && !shared.shutdown.load(Ordering::Acquire) {
                        shared.signal.wait(&mut pending);
                    }
                    if shared.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    *pending = false;
                }
                if !callback() {
                    shared.failed.store(true, Ordering::Release);
                    break;
                }
            })
            .expect("failed to spawn action worker thread");
        self.worker = Some(handle);
    }

    /// Signal the worker and return immediately. Reports `false` once the
    /// action has shut down or its callback has failed.
    pub fn trigger(&self) -> bool {
        {
            let mut pending = self.shared.pending.lock();
            if !self.shared.failed.load(Ordering::Acquire) {
                *pending = true;
            }
            self.shared.signal.notify_all();
        }
        !self.shared.shutdown.load(Ordering::Acquire)
            && !self.shared.failed.load(Ordering::Acquire)
    }
}

impl Drop for AsyncAction {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        {
            // Lock around the notify so the worker cannot check shutdown and
            // then sleep through it.
            let _pending = self.shared.pending.lock();
            self.shared.signal.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
