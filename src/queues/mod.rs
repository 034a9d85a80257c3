//! Queue primitives backing edges and ingresses.
//!
//! Two semantic containers, both multi-producer/multi-consumer safe and both
//! strictly non-blocking: [`LocalQueue`] (unbounded FIFO, carries edge
//! traffic and FIFO ingress) and [`PriorityQueue`] (bounded min-heap,
//! carries priority ingress). A `poll` that comes back empty is the worker
//! loop's signal to yield; nothing ever blocks on a take.

mod fifo;
mod priority;

pub use fifo::LocalQueue;
pub use priority::{PriorityFn, PriorityItem, PriorityQueue};

use miette::Diagnostic;
use thiserror::Error;

/// Errors surfaced by queue offers.
#[derive(Debug, Error, Diagnostic)]
pub enum QueueError {
    /// A bounded queue refused an offer at capacity. Never raised by the
    /// unbounded FIFO.
    #[error("queue full (capacity {capacity})")]
    #[diagnostic(
        code(ramify::queue::full),
        help("Raise RunConfig::priority_capacity or slow the producer down.")
    )]
    Full { capacity: usize },
}
