//! Rate-limited concurrent consumption of a shared work stream.
//!
//! [`PoissonQueue`] binds a [`PoissonScheduler`] to per-category
//! [`QueueProcessor`]s: each processor category gets a synchronous drain
//! action that, every time it fires, moves one item from the shared input
//! buffer into that processor's bounded queue. Items are therefore consumed
//! at Poisson-modulated per-category rates while the processors do the
//! actual work on their own threads.
//!
//! A processor whose user function fails becomes a zombie holding its
//! unprocessed items; [`PoissonQueue::zombie_cleanup`] scavenges zombies,
//! unregisters their categories, and returns the residual items to the
//! front of the shared input.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use log::debug;
use parking_lot::Mutex;

use crate::action::Action;
use crate::processor::QueueProcessor;
use crate::scheduler::PoissonScheduler;

type SharedInput<T> = Arc<Mutex<VecDeque<T>>>;

/// A Poisson scheduler feeding per-category bounded processors from one
/// shared input buffer.
///
/// Items must be movable; they are never cloned. Categories follow the
/// scheduler's key requirements.
pub struct PoissonQueue<K, T> {
    // Declared first so workers stop firing before anything they feed is
    // torn down.
    scheduler: PoissonScheduler<K>,
    processors: Mutex<BTreeMap<K, Arc<QueueProcessor<T>>>>,
    input: SharedInput<T>,
}

impl<K, T> PoissonQueue<K, T>
where
    K: Ord + Clone + Send + Sync + Debug + 'static,
    T: Send + 'static,
{
    /// Create a stopped composite over `threads` scheduler workers.
    pub fn new(threads: usize) -> Self {
        Self::with_scheduler(PoissonScheduler::new(threads))
    }

    /// Create from an explicitly configured (stopped) scheduler.
    pub fn with_scheduler(scheduler: PoissonScheduler<K>) -> Self {
        Self {
            scheduler,
            processors: Mutex::new(BTreeMap::new()),
            input: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Start the underlying scheduler.
    pub fn start(&self) {
        self.scheduler.start();
    }

    /// Push one item onto the shared input.
    pub fn queue_item(&self, item: T) {
        self.input.lock().push_back(item);
    }

    /// Push a batch of items onto the shared input.
    pub fn queue_items(&self, items: impl IntoIterator<Item = T>) {
        self.input.lock().extend(items);
    }

    /// Items still waiting in the shared input.
    pub fn pending_items(&self) -> usize {
        self.input.lock().len()
    }

    /// The shared input has no waiting items. Note that items may still be
    /// inside processors: a false here does not mean all work is finished.
    pub fn is_empty(&self) -> bool {
        self.input.lock().is_empty()
    }

    /// Register a plain action (one that does not consume queue items)
    /// at `rate`. Any processor previously registered for the category is
    /// dropped — its in-flight items are lost, which is why
    /// [`PoissonQueue::zombie_cleanup`] exists as the recovery path for
    /// *self*-terminated processors.
    pub fn set_action(&self, category: K, action: Action, rate: f64) {
        self.scheduler.set_action(category.clone(), action, true);
        self.scheduler.set_rate(category.clone(), rate);
        let dropped = self.processors.lock().remove(&category);
        // Destruction joins the processor's worker; keep it off the lock.
        drop(dropped);
    }

    /// Register a processing category: a [`QueueProcessor`] with the given
    /// capacity runs `process` on each item, and a synchronous drain action
    /// fires at `rate`, moving one shared-input item per fire into the
    /// processor's queue.
    pub fn set_processor(
        &self,
        category: K,
        process: impl FnMut(&mut T) -> bool + Send + 'static,
        rate: f64,
        capacity: usize,
    ) {
        let mut processor = QueueProcessor::new(process, capacity);
        processor.start();
        let processor = Arc::new(processor);

        // The drain action must not keep the processor or the input alive:
        // it holds weak references and degrades to a no-op once either side
        // is gone.
        let weak_processor = Arc::downgrade(&processor);
        let weak_input: Weak<Mutex<VecDeque<T>>> = Arc::downgrade(&self.input);
        let action = Action::sync(move || {
            if let (Some(processor), Some(input)) =
                (weak_processor.upgrade(), weak_input.upgrade())
            {
                let mut input = input.lock();
                processor.transfer_next_item(&mut input);
            }
            true
        });

        // Replace the action before the old processor can be dropped, so
        // no fire ever reaches a dead processor through a stale action.
        self.scheduler.set_action(category.clone(), action, true);
        let replaced = {
            let mut processors = self.processors.lock();
            processors.insert(category.clone(), processor)
        };
        drop(replaced);
        self.scheduler.set_rate(category, rate);
    }

    /// Unregister `category` entirely: rate, action, and processor. Items
    /// already inside the dropped processor are lost.
    pub fn remove_action(&self, category: &K) {
        self.scheduler.erase_rate(category);
        self.scheduler.erase_action(category);
        let dropped = self.processors.lock().remove(category);
        drop(dropped);
    }

    /// Scavenge processors that terminated on their own: recover their
    /// residual items, unregister their categories, and prepend the items
    /// to the shared input with FIFO order preserved.
    ///
    /// Always returns `true` so it can itself be registered as an action —
    /// which must be an [`Action::background`], never [`Action::sync`],
    /// because it re-enters the scheduler's registry.
    pub fn zombie_cleanup(&self) -> bool {
        let mut recovered: VecDeque<T> = VecDeque::new();
        let mut reaped: Vec<Arc<QueueProcessor<T>>> = Vec::new();
        {
            let mut processors = self.processors.lock();
            let zombies: Vec<K> = processors
                .iter()
                .filter(|(_, processor)| processor.is_terminated())
                .map(|(category, _)| category.clone())
                .collect();
            for category in zombies {
                if let Some(processor) = processors.remove(&category) {
                    let before = recovered.len();
                    processor.recover_items(&mut recovered);
                    debug!(
                        "zombie cleanup: category {category:?} returned {} item(s)",
                        recovered.len() - before
                    );
                    self.scheduler.erase_rate(&category);
                    self.scheduler.erase_action(&category);
                    reaped.push(processor);
                }
            }
        }
        // Zombie threads have already exited, but the join in their drop
        // still stays off the processors lock.
        drop(reaped);
        if !recovered.is_empty() {
            let mut input = self.input.lock();
            // Prepend back-to-front so the recovered block keeps its order
            // ahead of whatever is already waiting.
            while let Some(item) = recovered.pop_back() {
                input.push_front(item);
            }
        }
        true
    }

    /// The underlying scheduler, for rate/scale/stop control.
    pub fn scheduler(&self) -> &PoissonScheduler<K> {
        &self.scheduler
    }
}
