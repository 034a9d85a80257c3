//! Bounded priority queue for ingress ordering.

use super::QueueError;
use crate::node::{DoneCallback, Ingress, Task, TaskSource};
use crate::types::Payload;
use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Scores a value for priority ordering; the smallest score polls first.
pub type PriorityFn<T> = Arc<dyn Fn(&T) -> i64 + Send + Sync + 'static>;

/// A value wrapped for priority ingress.
///
/// The optional callback is invoked on the item *after* the root transform
/// has completed — the worker loop carries it through as
/// [`Task::on_done`](crate::node::Task).
pub struct PriorityItem<T> {
    pub item: T,
    pub callback: Option<DoneCallback<T>>,
}

impl<T> PriorityItem<T> {
    pub fn new(item: T) -> Self {
        PriorityItem {
            item,
            callback: None,
        }
    }

    #[must_use]
    pub fn with_callback(mut self, callback: DoneCallback<T>) -> Self {
        self.callback = Some(callback);
        self
    }
}

struct Entry<T> {
    score: i64,
    seq: u64,
    item: T,
    callback: Option<DoneCallback<T>>,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Insertion sequence breaks score ties, keeping equal-score polls
        // stable in offer order.
        (self.score, self.seq).cmp(&(other.score, other.seq))
    }
}

struct Inner<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    seq: u64,
}

/// Bounded min-heap ordered by a caller-supplied score.
///
/// Offers at capacity are rejected with [`QueueError::Full`] — a full
/// priority ingress refuses work rather than silently dropping it. Like
/// [`LocalQueue`](super::LocalQueue), every operation is non-blocking and
/// MPMC safe.
///
/// # Examples
///
/// ```rust
/// use ramify::queues::{PriorityItem, PriorityQueue};
/// use std::sync::Arc;
///
/// // Larger values first: negate the value as its score.
/// let q = PriorityQueue::new(16, Arc::new(|v: &i64| -v));
/// for v in [3, 1, 2] {
///     q.offer(PriorityItem::new(v)).unwrap();
/// }
/// let drained: Vec<_> = std::iter::from_fn(|| q.poll()).map(|p| p.item).collect();
/// assert_eq!(drained, vec![3, 2, 1]);
/// ```
pub struct PriorityQueue<T> {
    capacity: usize,
    score: PriorityFn<T>,
    inner: Mutex<Inner<T>>,
}

impl<T: PartialEq> PriorityQueue<T> {
    #[must_use]
    pub fn new(capacity: usize, score: PriorityFn<T>) -> Self {
        PriorityQueue {
            capacity,
            score,
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                seq: 0,
            }),
        }
    }

    /// Enqueue an item, scoring it now.
    pub fn offer(&self, item: PriorityItem<T>) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        self.push_locked(&mut inner, item)
    }

    /// Enqueue unless an equal item is already waiting. `Ok(false)` marks a
    /// suppressed duplicate.
    pub fn offer_unique(&self, item: PriorityItem<T>) -> Result<bool, QueueError> {
        let mut inner = self.inner.lock();
        if inner
            .heap
            .iter()
            .any(|Reverse(entry)| entry.item == item.item)
        {
            return Ok(false);
        }
        self.push_locked(&mut inner, item).map(|_| true)
    }

    fn push_locked(&self, inner: &mut Inner<T>, item: PriorityItem<T>) -> Result<(), QueueError> {
        if inner.heap.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        let score = (self.score)(&item.item);
        let seq = inner.seq;
        inner.seq += 1;
        inner.heap.push(Reverse(Entry {
            score,
            seq,
            item: item.item,
            callback: item.callback,
        }));
        Ok(())
    }

    /// Dequeue the smallest-scored item, or `None` when empty.
    pub fn poll(&self) -> Option<PriorityItem<T>> {
        self.inner.lock().heap.pop().map(|Reverse(entry)| {
            let mut item = PriorityItem::new(entry.item);
            item.callback = entry.callback;
            item
        })
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Payload> TaskSource<T> for PriorityQueue<T> {
    fn poll_task(&self) -> Option<Task<T>> {
        self.poll().map(|entry| Task {
            value: entry.item,
            on_done: entry.callback,
        })
    }
}

/// The priority ingress contract: offers are scored, deduplicated against
/// waiting items, and rejected at capacity.
impl<T: Payload> Ingress<T> for PriorityQueue<T> {
    fn offer(&self, value: T) -> Result<(), QueueError> {
        self.offer_unique(PriorityItem::new(value)).map(|_| ())
    }

    fn is_empty(&self) -> bool {
        PriorityQueue::is_empty(self)
    }

    fn len(&self) -> usize {
        PriorityQueue::len(self)
    }
}
