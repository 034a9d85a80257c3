//! Pool mode: one worker pool per vertex, and graph teardown.

use super::ingress::{fifo_in, queue_rewrite};
use super::{graph_rewrite, LowerError, Rewrite};
use crate::config::RunConfig;
use crate::graphs::GraphError;
use crate::node::{Ingress, Node};
use crate::queues::QueueError;
use crate::types::Payload;
use crate::workers::{work, PoolError, UnitScheduler, WorkUnit, WorkerPool};
use std::sync::Arc;

/// Walk every vertex and start its pool: `threads` workers (default from
/// `config`), each running the generic worker loop against the node's wired
/// unit. The pool's two-phase shutdown is appended to the node's shutdown
/// actions.
///
/// A node whose input is still empty simply yields — that is the steady
/// state until the root receives work or a refill fires.
pub fn add_pool<T: Payload>(config: RunConfig) -> Rewrite<T> {
    Box::new(move |mut root| {
        start_pools(&mut root, &config, true)?;
        Ok(root)
    })
}

fn start_pools<T: Payload>(
    node: &mut Node<T>,
    config: &RunConfig,
    is_root: bool,
) -> Result<(), PoolError> {
    // Edge deliveries are gated by the parent's output sink; only an
    // ingress-fed root checks its own gate in the loop.
    let gate = if is_root && node.runtime().is_some_and(|rt| rt.ingress.is_some()) {
        node.gate().cloned()
    } else {
        None
    };
    let unit = WorkUnit {
        transform: node.transform().clone(),
        input: node.runtime().and_then(|rt| rt.input.clone()),
        output: node.runtime().and_then(|rt| rt.output.clone()),
        exec: node.exec(),
        gate,
    };
    let scheduler: UnitScheduler<T> = Arc::new(move || unit.clone());

    let size = node.threads().unwrap_or(config.default_threads);
    let pool = WorkerPool::queue_work(node.id().to_string(), size, work(scheduler, config.idle))?
        .with_shutdown_timeouts(config.drain_timeout, config.force_timeout);
    node.push_shutdown(Arc::new(pool));

    for child in node.children_mut() {
        start_pools(child, config, false)?;
    }
    Ok(())
}

/// Lower `graph` into a running pool-backed form.
///
/// The pipeline is `queue_rewrite` → `fifo_in` → `rewrites` → `add_pool`;
/// user rewrites may replace the ingress
/// ([`priority_in`](super::priority_in)) or hang schedulers off the root
/// ([`schedule_refill`](super::schedule_refill)) before the pools start.
pub fn run_pool<T: Payload>(
    graph: Node<T>,
    rewrites: Vec<Rewrite<T>>,
    config: RunConfig,
) -> Result<PoolGraph<T>, LowerError> {
    let mut passes: Vec<Rewrite<T>> = vec![queue_rewrite(), fifo_in()];
    passes.extend(rewrites);
    passes.push(add_pool(config));
    let root = graph_rewrite(passes, graph)?;

    let Some(ingress) = root.runtime().and_then(|rt| rt.ingress.clone()) else {
        return Err(LowerError::Graph(GraphError::MissingIngress));
    };
    Ok(PoolGraph { root, ingress })
}

/// A lowered, running graph.
///
/// Offer source values with [`offer`](Self::offer); tear everything down
/// with [`kill`](Self::kill). The graph structure is immutable from here on.
pub struct PoolGraph<T: Payload> {
    root: Node<T>,
    ingress: Arc<dyn Ingress<T>>,
}

impl<T: Payload> PoolGraph<T> {
    /// Offer a source value at the root ingress.
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`] from a bounded (priority) ingress at capacity.
    pub fn offer(&self, value: T) -> Result<(), QueueError> {
        self.ingress.offer(value)
    }

    /// Values waiting at the ingress.
    pub fn pending(&self) -> usize {
        self.ingress.len()
    }

    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    pub fn into_root(self) -> Node<T> {
        self.root
    }

    /// Run every node's shutdown actions. See [`kill_graph`].
    pub async fn kill(&self) {
        kill_graph(&self.root).await;
    }
}

/// Visit every vertex pre-order and run its shutdown actions, logging and
/// swallowing per-action errors.
///
/// Safe on a graph that was never started (no actions, nothing happens) and
/// on one already killed (every action is idempotent).
pub async fn kill_graph<T: Payload>(root: &Node<T>) {
    for node in root.filter_nodes(|_| true) {
        for action in node.shutdown_actions() {
            if let Err(error) = action.shutdown().await {
                tracing::warn!(node = %node.id(), %error, "shutdown action failed");
            }
        }
    }
}
