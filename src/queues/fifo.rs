//! Unbounded MPMC FIFO.

use super::QueueError;
use crate::node::{Ingress, Task, TaskSource};
use crate::types::Payload;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Unbounded first-in/first-out queue.
///
/// Backs every edge between a parent and one child in pool mode, and the
/// root ingress installed by [`fifo_in`](crate::lowering::fifo_in). All
/// operations are non-blocking; any number of producers and consumers may
/// share one queue.
///
/// Within one queue, values come back in offer order. With several workers
/// polling, *processing* order downstream is not preserved.
///
/// # Examples
///
/// ```rust
/// use ramify::queues::LocalQueue;
///
/// let q = LocalQueue::new();
/// q.offer(1);
/// q.offer_unique(1); // no-op, 1 is already enqueued
/// q.offer_unique(2);
/// assert_eq!(q.len(), 2);
/// assert_eq!(q.poll(), Some(1));
/// assert_eq!(q.poll(), Some(2));
/// assert_eq!(q.poll(), None);
/// ```
pub struct LocalQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T: PartialEq> LocalQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        LocalQueue {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueue a value. Always succeeds.
    pub fn offer(&self, value: T) {
        self.inner.lock().push_back(value);
    }

    /// Enqueue unless an equal value is already waiting. Returns whether the
    /// value was enqueued.
    ///
    /// Equality is value equality; once a duplicate has been polled off, the
    /// same value may be offered again.
    pub fn offer_unique(&self, value: T) -> bool {
        let mut queue = self.inner.lock();
        if queue.contains(&value) {
            return false;
        }
        queue.push_back(value);
        true
    }

    /// Dequeue the oldest value, or `None` when empty.
    pub fn poll(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

impl<T: PartialEq> Default for LocalQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> TaskSource<T> for LocalQueue<T> {
    fn poll_task(&self) -> Option<Task<T>> {
        self.poll().map(Task::new)
    }
}

/// The FIFO ingress contract: offers deduplicate against values still
/// waiting in the queue and never fail.
impl<T: Payload> Ingress<T> for LocalQueue<T> {
    fn offer(&self, value: T) -> Result<(), QueueError> {
        self.offer_unique(value);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        LocalQueue::is_empty(self)
    }

    fn len(&self) -> usize {
        LocalQueue::len(self)
    }
}
