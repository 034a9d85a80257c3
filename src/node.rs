//! The graph vertex and the function-valued seams that wire one together.
//!
//! A [`Node`] is a unit of work: a [`Transform`] plus its children. The
//! declarative fields (`id`, `gate`, `multimap`, `threads`, `exec`) are set
//! during construction; the [`NodeRuntime`] sub-struct (`ingress`, `input`,
//! `output`) stays empty until a lowering pass populates it. Keeping the two
//! phases in separate structs means a freshly built graph carries no
//! queues, no pools, and nothing to shut down.
//!
//! Every callable a node carries is a single-method seam:
//!
//! | seam            | role                                              |
//! |-----------------|---------------------------------------------------|
//! | [`Transform`]   | one value in, a finite sequence of values out     |
//! | [`Gate`]        | predicate on an incoming value; `false` skips     |
//! | [`Sink`]        | accepts one output value (edge delivery)          |
//! | [`TaskSource`]  | non-blocking poll side of a queue                 |
//! | [`Ingress`]     | public offer side of the root queue               |
//! | [`Shutdown`]    | one idempotent termination action                 |
//!
//! # Examples
//!
//! A custom transform:
//!
//! ```rust
//! use ramify::node::{Node, Transform, TransformError};
//! use async_trait::async_trait;
//!
//! struct Tokenize;
//!
//! #[async_trait]
//! impl Transform<String> for Tokenize {
//!     async fn apply(&self, input: String) -> Result<Vec<String>, TransformError> {
//!         Ok(input.split_whitespace().map(str::to_owned).collect())
//!     }
//! }
//!
//! let node = Node::new(Tokenize).with_id("tokenize").with_multimap(true);
//! assert_eq!(node.id().as_str(), "tokenize");
//! ```

use crate::queues::QueueError;
use crate::types::{next_node_seq, short_type_name, NodeId, Payload};
use crate::workers::ExecStrategy;
use async_trait::async_trait;
use miette::Diagnostic;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Predicate on an incoming value; `false` skips the node entirely.
pub type Gate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;

/// Accepts one output value. In pool mode a node's `output` sink offers into
/// each admitted child's edge queue.
pub type Sink<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Invoked on the underlying item after the node's transform completes.
/// Carried by priority-ingress tasks; see
/// [`PriorityItem`](crate::queues::PriorityItem).
pub type DoneCallback<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Errors raised by a [`Transform`].
///
/// These are *business* errors: the worker loop logs and swallows them, the
/// failed input simply produces no output, and siblings are unaffected.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformError {
    /// General transform failure.
    #[error("transform failed: {reason}")]
    #[diagnostic(code(ramify::node::transform_failed))]
    Failed { reason: String },

    /// Expected data was absent from the input value.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(ramify::node::missing_input),
        help("Check that the parent node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(code(ramify::node::validation))]
    Validation(String),

    /// A publisher node failed to write to its topic store.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] crate::pubsub::StoreError),
}

/// The unit of computation carried by a node.
///
/// `apply` returns the values to forward downstream; a single-output
/// transform returns one element. Nodes built through
/// [`GraphBuilder::multimap`](crate::graphs::GraphBuilder::multimap) return a
/// whole sequence, and each element is delivered to every child
/// independently.
///
/// `drive` is the contract behind [`ExecStrategy::Drive`]: the transform is
/// handed the downstream sink and decides itself how often — zero, many, or
/// deferred times — to call it. The default implementation applies and then
/// emits each output once, so only transforms that need the sink override it.
#[async_trait]
pub trait Transform<T: Payload>: Send + Sync {
    /// Apply this transform, returning the values to forward downstream.
    async fn apply(&self, input: T) -> Result<Vec<T>, TransformError>;

    /// Drive the downstream sink directly.
    async fn drive(
        &self,
        input: T,
        out: &(dyn Fn(T) + Send + Sync),
    ) -> Result<(), TransformError> {
        for value in self.apply(input).await? {
            out(value);
        }
        Ok(())
    }
}

/// Pass the input through unchanged. The usual root of a fan-out tree.
pub struct Identity;

#[async_trait]
impl<T: Payload> Transform<T> for Identity {
    async fn apply(&self, input: T) -> Result<Vec<T>, TransformError> {
        Ok(vec![input])
    }
}

pub(crate) struct MapFn<F> {
    f: F,
}

#[async_trait]
impl<T, F> Transform<T> for MapFn<F>
where
    T: Payload,
    F: Fn(T) -> T + Send + Sync,
{
    async fn apply(&self, input: T) -> Result<Vec<T>, TransformError> {
        Ok(vec![(self.f)(input)])
    }
}

pub(crate) struct FlatMapFn<F> {
    f: F,
}

#[async_trait]
impl<T, F> Transform<T> for FlatMapFn<F>
where
    T: Payload,
    F: Fn(T) -> Vec<T> + Send + Sync,
{
    async fn apply(&self, input: T) -> Result<Vec<T>, TransformError> {
        Ok((self.f)(input))
    }
}

/// One unit of input handed to a worker: the value plus an optional
/// completion callback (priority ingress only).
pub struct Task<T> {
    pub value: T,
    pub on_done: Option<DoneCallback<T>>,
}

impl<T> Task<T> {
    pub fn new(value: T) -> Self {
        Task {
            value,
            on_done: None,
        }
    }
}

/// Non-blocking poll side of a queue. `None` tells the worker loop to yield.
pub trait TaskSource<T>: Send + Sync {
    fn poll_task(&self) -> Option<Task<T>>;
}

/// Public offer side of a root queue.
///
/// `offer` only fails on a bounded ingress at capacity; unbounded FIFO
/// ingresses always accept.
pub trait Ingress<T>: Send + Sync {
    fn offer(&self, value: T) -> Result<(), QueueError>;

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;
}

/// Errors surfaced by a [`Shutdown`] action.
#[derive(Debug, Error, Diagnostic)]
pub enum ShutdownError {
    /// Workers survived both the drain window and forced cancellation.
    #[error("pool {name} did not terminate")]
    #[diagnostic(
        code(ramify::shutdown::did_not_terminate),
        help("A transform is likely ignoring cancellation; it will leak until the process exits.")
    )]
    DidNotTerminate { name: String },
}

/// One idempotent termination action.
///
/// Lowering passes append these to the nodes they touch (a pool's two-phase
/// shutdown, a refill scheduler's stop). They must be safe to invoke after
/// partial construction and safe to invoke twice;
/// [`kill_graph`](crate::lowering::kill_graph) logs and swallows whatever
/// they return.
#[async_trait]
pub trait Shutdown: Send + Sync {
    async fn shutdown(&self) -> Result<(), ShutdownError>;
}

/// Runtime wiring populated by lowering passes; absent on a freshly built
/// graph.
pub struct NodeRuntime<T: Payload> {
    /// Public offer point. Root only.
    pub ingress: Option<Arc<dyn Ingress<T>>>,
    /// Poll side this node's workers consume. Every node but the root gets
    /// one from `queue_rewrite`; the root's comes with its ingress.
    pub input: Option<Arc<dyn TaskSource<T>>>,
    /// Delivery into the children's edge queues. Non-leaf nodes only.
    pub output: Option<Sink<T>>,
}

impl<T: Payload> Default for NodeRuntime<T> {
    fn default() -> Self {
        NodeRuntime {
            ingress: None,
            input: None,
            output: None,
        }
    }
}

/// A vertex: a transform plus its children.
///
/// Constructed directly for custom [`Transform`] impls, or through the
/// closure shorthands [`Node::map`] and [`Node::flat_map`]. Most users build
/// whole trees with [`GraphBuilder`](crate::graphs::GraphBuilder) instead.
pub struct Node<T: Payload> {
    id: NodeId,
    transform: Arc<dyn Transform<T>>,
    children: Vec<Node<T>>,
    multimap: bool,
    gate: Option<Gate<T>>,
    threads: Option<usize>,
    exec: ExecStrategy,
    shutdown: Vec<Arc<dyn Shutdown>>,
    runtime: Option<NodeRuntime<T>>,
}

impl<T: Payload> Node<T> {
    /// Wrap a custom transform. The id defaults to the transform's type name
    /// plus an insertion counter.
    pub fn new<F>(transform: F) -> Self
    where
        F: Transform<T> + 'static,
    {
        let label = short_type_name(std::any::type_name::<F>()).to_lowercase();
        Self::from_arc(
            NodeId::derived(&label, next_node_seq()),
            Arc::new(transform),
        )
    }

    /// Wrap an already shared transform under an explicit id.
    pub fn from_arc(id: NodeId, transform: Arc<dyn Transform<T>>) -> Self {
        Node {
            id,
            transform,
            children: Vec::new(),
            multimap: false,
            gate: None,
            threads: None,
            exec: ExecStrategy::Apply,
            shutdown: Vec::new(),
            runtime: None,
        }
    }

    /// A node around a plain `T -> T` closure.
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self::from_arc(
            NodeId::derived("map", next_node_seq()),
            Arc::new(MapFn { f }),
        )
    }

    /// A multimap node around a `T -> Vec<T>` closure; each returned element
    /// is forwarded to every child independently.
    pub fn flat_map<F>(f: F) -> Self
    where
        F: Fn(T) -> Vec<T> + Send + Sync + 'static,
    {
        Self::from_arc(
            NodeId::derived("multimap", next_node_seq()),
            Arc::new(FlatMapFn { f }),
        )
        .with_multimap(true)
    }

    /// A pass-through node.
    pub fn identity() -> Self {
        Self::from_arc(NodeId::derived("identity", next_node_seq()), Arc::new(Identity))
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_gate<F>(mut self, gate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.gate = Some(Arc::new(gate));
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    #[must_use]
    pub fn with_multimap(mut self, multimap: bool) -> Self {
        self.multimap = multimap;
        self
    }

    #[must_use]
    pub fn with_exec(mut self, exec: ExecStrategy) -> Self {
        self.exec = exec;
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn transform(&self) -> &Arc<dyn Transform<T>> {
        &self.transform
    }

    /// Swap the transform in place. The seam used by
    /// [`observer_rewrite`](crate::lowering::observer_rewrite).
    pub fn set_transform(&mut self, transform: Arc<dyn Transform<T>>) {
        self.transform = transform;
    }

    pub fn children(&self) -> &[Node<T>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node<T>> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: Node<T>) {
        self.children.push(child);
    }

    pub fn multimap(&self) -> bool {
        self.multimap
    }

    pub fn gate(&self) -> Option<&Gate<T>> {
        self.gate.as_ref()
    }

    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.threads = Some(threads);
    }

    pub fn set_gate(&mut self, gate: Gate<T>) {
        self.gate = Some(gate);
    }

    pub fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub fn exec(&self) -> ExecStrategy {
        self.exec
    }

    pub fn set_exec(&mut self, exec: ExecStrategy) {
        self.exec = exec;
    }

    pub fn shutdown_actions(&self) -> &[Arc<dyn Shutdown>] {
        &self.shutdown
    }

    pub fn push_shutdown(&mut self, action: Arc<dyn Shutdown>) {
        self.shutdown.push(action);
    }

    pub fn runtime(&self) -> Option<&NodeRuntime<T>> {
        self.runtime.as_ref()
    }

    /// Runtime wiring, created empty on first access. Lowering passes use
    /// this to install queues and sinks.
    pub fn runtime_mut(&mut self) -> &mut NodeRuntime<T> {
        self.runtime.get_or_insert_with(NodeRuntime::default)
    }
}

impl<T: Payload> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("multimap", &self.multimap)
            .field("gated", &self.gate.is_some())
            .field("threads", &self.threads)
            .field("exec", &self.exec)
            .field("children", &self.children.len())
            .field("shutdown_actions", &self.shutdown.len())
            .field("lowered", &self.runtime.is_some())
            .finish()
    }
}
