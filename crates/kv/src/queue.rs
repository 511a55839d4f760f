//! Bounded work queue feeding the worker pool, guarded by a
//! `std::sync::Mutex` paired with a `Condvar`.
//!
//! `parking_lot` has no condition variable pairing as ergonomic as the
//! standard library's for this wait-for-work-or-shutdown loop, so this
//! module is the one place in the crate that reaches for `std::sync`
//! directly, recovering from mutex poisoning the same way the pool in
//! `nebula-memory` does.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::{KvError, KvResult};

struct Inner<T> {
    items: VecDeque<T>,
    capacity: usize,
    shutdown: bool,
}

/// A bounded FIFO queue of connections awaiting a worker, blocking producers
/// when full and consumers when empty.
///
/// Mirrors the excerpt's `job_queue` ring buffer plus `queue_lock` /
/// `queue_cond` / `shutdown` flag, with `VecDeque` standing in for the
/// hand-rolled head/tail/size ring-buffer bookkeeping.
pub struct WorkQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

fn lock<T>(mutex: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poison) => poison.into_inner(),
    }
}

impl<T> WorkQueue<T> {
    /// Builds an empty queue that holds at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { items: VecDeque::with_capacity(capacity), capacity, shutdown: false }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Pushes `item`, blocking while the queue is full. Returns
    /// `Err(KvError::StoreError)` if the queue has been shut down.
    pub fn push(&self, item: T) -> KvResult<()> {
        let mut guard = lock(&self.inner);
        while guard.items.len() >= guard.capacity && !guard.shutdown {
            guard = match self.not_full.wait(guard) {
                Ok(guard) => guard,
                Err(poison) => poison.into_inner(),
            };
        }
        if guard.shutdown {
            return Err(KvError::StoreError);
        }
        guard.items.push_back(item);
        drop(guard);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pushes `item` without blocking. Returns `Err(KvError::QueueFull)` if
    /// the queue has no free slot, `Err(KvError::StoreError)` if shut down.
    pub fn try_push(&self, item: T) -> KvResult<()> {
        let mut guard = lock(&self.inner);
        if guard.shutdown {
            return Err(KvError::StoreError);
        }
        if guard.items.len() >= guard.capacity {
            return Err(KvError::QueueFull);
        }
        guard.items.push_back(item);
        drop(guard);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until an item is available or the queue shuts down with no
    /// items left, mirroring `worker_thread`'s wait loop.
    pub fn pop(&self) -> Option<T> {
        let mut guard = lock(&self.inner);
        while guard.items.is_empty() && !guard.shutdown {
            guard = match self.not_empty.wait(guard) {
                Ok(guard) => guard,
                Err(poison) => poison.into_inner(),
            };
        }
        let item = guard.items.pop_front();
        let was_full = guard.items.len() + 1 == guard.capacity;
        drop(guard);
        if item.is_some() && was_full {
            self.not_full.notify_one();
        }
        item
    }

    /// Marks the queue as shutting down and wakes every blocked worker and
    /// producer. Items already queued are still drained by `pop` before it
    /// starts returning `None`.
    pub fn shutdown(&self) {
        lock(&self.inner).shutdown = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Current number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.inner).items.len()
    }

    /// Whether the queue currently holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn push_then_pop_is_fifo() {
        let q = WorkQueue::new(4);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
    }

    #[test]
    fn try_push_rejects_when_full() {
        let q = WorkQueue::new(1);
        q.try_push(1).unwrap();
        assert!(matches!(q.try_push(2), Err(KvError::QueueFull)));
    }

    #[test]
    fn shutdown_drains_remaining_items_then_returns_none() {
        let q = WorkQueue::new(4);
        q.push(1).unwrap();
        q.shutdown();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn push_blocks_until_a_slot_frees_then_a_pop_unblocks_it() {
        let q = Arc::new(WorkQueue::new(1));
        q.push(1).unwrap();

        let q2 = Arc::clone(&q);
        let pusher = std::thread::spawn(move || q2.push(2).unwrap());

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(q.pop(), Some(1));
        pusher.join().unwrap();
        assert_eq!(q.pop(), Some(2));
    }

    #[test]
    fn shutdown_wakes_a_blocked_pop() {
        let q = Arc::new(WorkQueue::<i32>::new(4));
        let q2 = Arc::clone(&q);
        let popper = std::thread::spawn(move || q2.pop());

        std::thread::sleep(Duration::from_millis(50));
        q.shutdown();
        assert_eq!(popper.join().unwrap(), None);
    }
}
