//! Single-worker queue processor.
//!
//! Wraps a [`BoundedQueue`] with a dedicated thread that drains it through a
//! user function. A `false` from the function is the termination protocol:
//! the failing item goes back to the head of the queue and the processor
//! shuts itself down, becoming a *zombie* that still holds its residual
//! items until someone recovers them (see
//! [`PoissonQueue::zombie_cleanup`](crate::poisson_queue::PoissonQueue::zombie_cleanup)).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::debug;
use parking_lot::Mutex;

use crate::queue::BoundedQueue;

/// A bounded queue drained by one worker thread through a fallible user
/// function.
pub struct QueueProcessor<T> {
    queue: Arc<BoundedQueue<T>>,
    terminated: Arc<AtomicBool>,
    // Parked here until start() moves it into the worker thread; the mutex
    // keeps the processor shareable (drain actions hold it through a Weak).
    callback: Mutex<Option<Box<dyn FnMut(&mut T) -> bool + Send>>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> QueueProcessor<T> {
    /// Create an idle processor. `callback` receives each item by mutable
    /// reference and returns `false` to requeue it and self-terminate.
    pub fn new(callback: impl FnMut(&mut T) -> bool + Send + 'static, capacity: usize) -> Self {
        Self {
            queue: Arc::new(BoundedQueue::new(capacity)),
            terminated: Arc::new(AtomicBool::new(false)),
            callback: Mutex::new(Some(Box::new(callback))),
            worker: None,
        }
    }

    /// Spawn the worker thread. Must be called exactly once, before the
    /// processor has terminated.
    pub fn start(&mut self) {
        assert!(
            self.worker.is_none() && !self.is_terminated(),
            "processor started twice or after termination"
        );
        let queue = Arc::clone(&self.queue);
        let terminated = Arc::clone(&self.terminated);
        let mut callback = self
            .callback
            .lock()
            .take()
            .expect("processor callback already consumed");
        let handle = thread::Builder::new()
            .name("poisson-processor".into())
            .spawn(move || {
                while !terminated.load(Ordering::Acquire) {
                    let Some(mut item) = queue.dequeue(true) else {
                        break;
                    };
                    if callback(&mut item) {
                        queue.done();
                    } else {
                        // Keep the failing item at the head for recovery.
                        queue.requeue(item);
                        debug!("queue processor self-terminating after callback failure");
                        break;
                    }
                }
                // Refuse all new work, including when the callback failure
                // turned this processor into a zombie.
                terminated.store(true, Ordering::Release);
                queue.terminate();
            })
            .expect("failed to spawn processor worker thread");
        self.worker = Some(handle);
    }

    /// Request shutdown. Idempotent; unblocks an in-progress dequeue.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        self.queue.terminate();
    }

    /// True once either an external terminate or a callback failure has
    /// shut the processor (or its queue) down.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire) || self.queue.is_terminated()
    }

    /// Offer an item directly to the inner queue.
    pub fn enqueue(&self, item: T, block: bool) -> Result<(), T> {
        self.queue.enqueue(item, block)
    }

    /// Move the head item of `from` into the inner queue without blocking.
    /// On refusal the item stays at the head of `from`. Returns whether an
    /// item moved.
    pub fn transfer_next_item(&self, from: &mut VecDeque<T>) -> bool {
        if self.is_terminated() {
            return false;
        }
        let Some(item) = from.pop_front() else {
            return false;
        };
        match self.queue.enqueue(item, false) {
            Ok(()) => true,
            Err(item) => {
                from.push_front(item);
                false
            }
        }
    }

    /// Drain residual items into `out` (FIFO order). Only legal once
    /// terminated.
    pub fn recover_items(&self, out: &mut VecDeque<T>) {
        assert!(
            self.is_terminated(),
            "recover_items on a live processor"
        );
        self.queue.recover(out);
    }

    /// The inner queue, for capacity/backlog introspection.
    pub fn queue(&self) -> &BoundedQueue<T> {
        &self.queue
    }
}

impl<T> Drop for QueueProcessor<T> {
    fn drop(&mut self) {
        self.terminated.store(true, Ordering::Release);
        self.queue.terminate();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn wait_for(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        predicate()
    }

    #[test]
    fn processes_items_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut processor = QueueProcessor::new(
            move |item: &mut u32| {
                sink.lock().unwrap().push(*item);
                true
            },
            4,
        );
        processor.start();
        for value in 0..4 {
            processor.enqueue(value, true).unwrap();
        }
        assert!(wait_for(
            || seen.lock().unwrap().len() == 4,
            Duration::from_secs(2)
        ));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        processor.terminate();
    }

    #[test]
    fn failure_requeues_and_terminates() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let mut processor = QueueProcessor::new(
            move |item: &mut u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                *item != 7
            },
            4,
        );
        processor.start();
        processor.enqueue(1, true).unwrap();
        processor.enqueue(7, true).unwrap();

        assert!(wait_for(|| processor.is_terminated(), Duration::from_secs(2)));
        // Item 1 processed, item 7 rejected and requeued.
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        let mut residual = VecDeque::new();
        processor.recover_items(&mut residual);
        assert_eq!(residual, VecDeque::from(vec![7]));
    }

    #[test]
    fn zombie_refuses_new_work() {
        let mut processor = QueueProcessor::new(|_: &mut u32| false, 4);
        processor.start();
        processor.enqueue(1, true).unwrap();
        assert!(wait_for(|| processor.is_terminated(), Duration::from_secs(2)));
        assert_eq!(processor.enqueue(2, false), Err(2));

        let mut from = VecDeque::from(vec![3]);
        assert!(!processor.transfer_next_item(&mut from));
        assert_eq!(from.len(), 1);
    }

    #[test]
    fn transfer_next_item_moves_one() {
        let drained = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&drained);
        let mut processor = QueueProcessor::new(
            move |_: &mut u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            },
            2,
        );
        processor.start();

        let mut from = VecDeque::from(vec![10, 11, 12]);
        assert!(processor.transfer_next_item(&mut from));
        assert_eq!(from.len(), 2);
        assert_eq!(from.front(), Some(&11));
        assert!(wait_for(
            || drained.load(Ordering::SeqCst) == 1,
            Duration::from_secs(2)
        ));
        processor.terminate();
    }

    #[test]
    fn transfer_from_empty_source_is_false() {
        let mut processor = QueueProcessor::new(|_: &mut u32| true, 2);
        processor.start();
        let mut from = VecDeque::new();
        assert!(!processor.transfer_next_item(&mut from));
        processor.terminate();
    }

    #[test]
    fn transfer_respects_capacity() {
        // Block the worker so enqueued items pile up against capacity.
        let gate = Arc::new(AtomicBool::new(false));
        let release = Arc::clone(&gate);
        let mut processor = QueueProcessor::new(
            move |_: &mut u32| {
                while !release.load(Ordering::Acquire) {
                    thread::sleep(Duration::from_millis(1));
                }
                true
            },
            1,
        );
        processor.start();
        processor.enqueue(1, true).unwrap();
        // The single slot is taken (queued or in-flight): transfer refuses
        // and leaves the source untouched.
        assert!(wait_for(|| processor.queue().in_flight() == 1, Duration::from_secs(2)));
        let mut from = VecDeque::from(vec![2]);
        assert!(!processor.transfer_next_item(&mut from));
        assert_eq!(from.front(), Some(&2));
        gate.store(true, Ordering::Release);
        processor.terminate();
    }

    #[test]
    fn drop_joins_the_worker() {
        let mut processor = QueueProcessor::new(|_: &mut u32| true, 2);
        processor.start();
        processor.enqueue(1, false).unwrap();
        drop(processor);
    }

    #[test]
    #[should_panic]
    fn double_start_panics() {
        let mut processor = QueueProcessor::new(|_: &mut u32| true, 2);
        processor.start();
        processor.start();
    }

    #[test]
    fn callback_can_mutate_the_item_before_requeue() {
        let mut processor = QueueProcessor::new(
            |item: &mut u32| {
                *item += 100;
                false
            },
            2,
        );
        processor.start();
        processor.enqueue(5, true).unwrap();
        assert!(wait_for(|| processor.is_terminated(), Duration::from_secs(2)));
        let mut residual = VecDeque::new();
        processor.recover_items(&mut residual);
        // The mutated item came back.
        assert_eq!(residual, VecDeque::from(vec![105]));
    }
}
