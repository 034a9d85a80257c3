//! Pool-mode wiring: edge queues and the two ingress decorators.

use super::{LowerError, Rewrite};
use crate::config::DEFAULT_PRIORITY_CAPACITY;
use crate::node::{Gate, Ingress, Node, Sink, TaskSource};
use crate::queues::{LocalQueue, PriorityFn, PriorityQueue};
use crate::types::Payload;
use std::sync::Arc;

/// Allocate one unbounded FIFO per child edge, bottom-up.
///
/// Each child's `input` becomes the poll side of its edge queue; the
/// parent's `output` offers every output element to each child whose gate
/// admits it. Values are gated here, at offer time, so a rejected value
/// never occupies a child's queue.
pub fn queue_rewrite<T: Payload>() -> Rewrite<T> {
    Box::new(|mut root| {
        wire_edges(&mut root);
        Ok(root)
    })
}

fn wire_edges<T: Payload>(node: &mut Node<T>) {
    for child in node.children_mut() {
        wire_edges(child);
    }
    if node.children().is_empty() {
        return;
    }

    let mut edges: Vec<(Arc<LocalQueue<T>>, Option<Gate<T>>)> = Vec::new();
    for child in node.children_mut() {
        let queue = Arc::new(LocalQueue::new());
        let source: Arc<dyn TaskSource<T>> = queue.clone();
        child.runtime_mut().input = Some(source);
        edges.push((queue, child.gate().cloned()));
    }

    let output: Sink<T> = Arc::new(move |value: T| {
        for (queue, gate) in &edges {
            if gate.as_ref().map_or(true, |admit| admit(&value)) {
                queue.offer(value.clone());
            }
        }
    });
    node.runtime_mut().output = Some(output);
}

/// Give the root a FIFO ingress: `offer` deduplicates against values still
/// queued and never fails. The public entry point for pool mode.
pub fn fifo_in<T: Payload>() -> Rewrite<T> {
    Box::new(|mut root| {
        let queue = Arc::new(LocalQueue::<T>::new());
        let ingress: Arc<dyn Ingress<T>> = queue.clone();
        let input: Arc<dyn TaskSource<T>> = queue;
        let runtime = root.runtime_mut();
        runtime.ingress = Some(ingress);
        runtime.input = Some(input);
        Ok(root)
    })
}

/// Replace the root ingress with a bounded priority queue (default capacity
/// 200).
///
/// Offers are scored by `prio` (smallest first), deduplicated, and rejected
/// with an error at capacity. Items offered directly as
/// [`PriorityItem`](crate::queues::PriorityItem)s may carry a callback; the
/// worker loop invokes it on the item once the root transform has completed.
pub fn priority_in<T: Payload>(prio: PriorityFn<T>) -> Rewrite<T> {
    priority_in_with(prio, DEFAULT_PRIORITY_CAPACITY)
}

/// [`priority_in`] with an explicit capacity.
pub fn priority_in_with<T: Payload>(prio: PriorityFn<T>, capacity: usize) -> Rewrite<T> {
    Box::new(move |root| {
        if capacity == 0 {
            return Err(LowerError::ZeroCapacity);
        }
        let queue = Arc::new(PriorityQueue::new(capacity, prio));
        priority_in_shared(queue)(root)
    })
}

/// Install a caller-owned priority queue as the root ingress.
///
/// Keeping a handle to the queue lets a caller offer
/// [`PriorityItem`](crate::queues::PriorityItem)s directly — the way to
/// attach completion callbacks, which the plain
/// [`offer`](crate::node::Ingress::offer) path cannot carry.
pub fn priority_in_shared<T: Payload>(queue: Arc<PriorityQueue<T>>) -> Rewrite<T> {
    Box::new(move |mut root| {
        let ingress: Arc<dyn Ingress<T>> = queue.clone();
        let input: Arc<dyn TaskSource<T>> = queue;
        let runtime = root.runtime_mut();
        runtime.ingress = Some(ingress);
        runtime.input = Some(input);
        Ok(root)
    })
}
