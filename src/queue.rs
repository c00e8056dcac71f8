//! Bounded processing queue with in-flight accounting.
//!
//! Capacity covers *outstanding* work, not just queued work: an item handed
//! out by [`BoundedQueue::dequeue`] keeps occupying its slot until the
//! consumer calls [`BoundedQueue::done`] or [`BoundedQueue::requeue`]. That
//! makes the capacity a true bound on how much work a consumer can have in
//! any state, which is what the Poisson-queue composite sizes processors by.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::error::{SchedulerError, SchedulerResult};

struct QueueInner<T> {
    items: VecDeque<T>,
    in_flight: usize,
}

/// A capacity-limited FIFO with in-flight accounting and monotone
/// termination.
///
/// Once terminated, no enqueue or dequeue ever succeeds again; residual
/// items are retrieved with [`BoundedQueue::recover`].
pub struct BoundedQueue<T> {
    capacity: usize,
    inner: Mutex<QueueInner<T>>,
    signal: Condvar,
    // Written under the mutex, readable without it.
    terminated: AtomicBool,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` queued-plus-in-flight
    /// items. Capacity must be at least 1.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded queue requires capacity of at least 1");
        Self {
            capacity,
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                in_flight: 0,
            }),
            signal: Condvar::new(),
            terminated: AtomicBool::new(false),
        }
    }

    /// Checked variant of [`BoundedQueue::new`] for capacities coming from
    /// configuration rather than code.
    pub fn try_new(capacity: usize) -> SchedulerResult<Self> {
        if capacity == 0 {
            return Err(SchedulerError::InvalidCapacity);
        }
        Ok(Self::new(capacity))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    /// Queued plus in-flight items at capacity.
    pub fn is_full(&self) -> bool {
        let inner = self.inner.lock();
        inner.items.len() + inner.in_flight >= self.capacity
    }

    /// Items dequeued but not yet released with `done` or `requeue`.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    /// Append an item. On refusal — queue terminated, or full in
    /// non-blocking mode — the item is handed back.
    pub fn enqueue(&self, item: T, block: bool) -> Result<(), T> {
        let mut inner = self.inner.lock();
        loop {
            if self.terminated.load(Ordering::Acquire) {
                return Err(item);
            }
            if inner.items.len() + inner.in_flight >= self.capacity {
                if !block {
                    return Err(item);
                }
                self.signal.wait(&mut inner);
                continue;
            }
            inner.items.push_back(item);
            self.signal.notify_all();
            return Ok(());
        }
    }

    /// Take the head item, marking it in-flight. `None` when terminated, or
    /// when empty in non-blocking mode.
    pub fn dequeue(&self, block: bool) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if self.terminated.load(Ordering::Acquire) {
                return None;
            }
            match inner.items.pop_front() {
                Some(item) => {
                    inner.in_flight += 1;
                    return Some(item);
                }
                None => {
                    if !block {
                        return None;
                    }
                    self.signal.wait(&mut inner);
                }
            }
        }
    }

    /// Put an in-flight item back at the *head* of the queue, so the next
    /// consumer sees it first. Returns false (dropping the item) when the
    /// queue has terminated.
    ///
    /// Panics without a matching outstanding [`BoundedQueue::dequeue`].
    pub fn requeue(&self, item: T) -> bool {
        let mut inner = self.inner.lock();
        assert!(inner.in_flight > 0, "requeue without a matching dequeue");
        inner.in_flight -= 1;
        if self.terminated.load(Ordering::Acquire)
            || inner.items.len() + inner.in_flight >= self.capacity
        {
            return false;
        }
        inner.items.push_front(item);
        self.signal.notify_all();
        true
    }

    /// Release an in-flight item's slot after successful processing.
    ///
    /// Panics without a matching outstanding [`BoundedQueue::dequeue`].
    pub fn done(&self) {
        let mut inner = self.inner.lock();
        assert!(inner.in_flight > 0, "done without a matching dequeue");
        inner.in_flight -= 1;
        // Wake blocking enqueuers: an in-flight slot just freed up.
        self.signal.notify_all();
    }

    /// Drain residual items, FIFO order preserved, into `out`. Only legal
    /// on a terminated queue.
    pub fn recover(&self, out: &mut VecDeque<T>) {
        assert!(
            self.is_terminated(),
            "recover on a queue that has not terminated"
        );
        let mut inner = self.inner.lock();
        out.extend(inner.items.drain(..));
    }

    /// Shut the queue down and wake all waiters. Idempotent.
    pub fn terminate(&self) {
        let _inner = self.inner.lock();
        self.terminated.store(true, Ordering::Release);
        self.signal.notify_all();
    }
}

impl<T> Drop for BoundedQueue<T> {
    fn drop(&mut self) {
        self.terminate();
    }
}
