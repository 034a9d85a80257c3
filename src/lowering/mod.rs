//! Lowering: deterministic rewrites from a declarative tree to an
//! executable form.
//!
//! A [`Rewrite`] takes the graph and returns it transformed — allocating
//! queues, installing ingresses, starting pools, appending shutdown thunks.
//! [`graph_rewrite`] folds a list of them in order. The two execution modes
//! are just different pipelines:
//!
//! - sync: [`run_sync`] → user rewrites, then compile to one composed
//!   closure on the caller's task;
//! - pool: [`run_pool`] → [`queue_rewrite`] → [`fifo_in`] → user rewrites
//!   (e.g. [`priority_in`], [`schedule_refill`], [`observer_rewrite`]) →
//!   [`add_pool`].

mod ingress;
mod observer;
mod pool;
mod refill;
mod sync;

pub use ingress::{fifo_in, priority_in, priority_in_shared, priority_in_with, queue_rewrite};
pub use observer::{observer_rewrite, Observer};
pub use pool::{add_pool, kill_graph, run_pool, PoolGraph};
pub use refill::schedule_refill;
pub use sync::{comp_rewrite, run_sync};

use crate::graphs::GraphError;
use crate::node::Node;
use crate::types::Payload;
use crate::workers::PoolError;
use miette::Diagnostic;
use thiserror::Error;

/// One lowering pass over an owned graph.
pub type Rewrite<T> = Box<dyn FnOnce(Node<T>) -> Result<Node<T>, LowerError> + Send>;

/// Errors raised while lowering a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum LowerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pool(#[from] PoolError),

    /// `priority_in` was asked for a queue that can hold nothing.
    #[error("priority ingress capacity must be at least 1")]
    #[diagnostic(code(ramify::lower::zero_capacity))]
    ZeroCapacity,
}

/// Fold `rewrites` over `root`, in order.
pub fn graph_rewrite<T: Payload>(
    rewrites: Vec<Rewrite<T>>,
    root: Node<T>,
) -> Result<Node<T>, LowerError> {
    let mut graph = root;
    for rewrite in rewrites {
        graph = rewrite(graph)?;
    }
    Ok(graph)
}
