//! Graph construction: the cursor, the fluent builder, and whole-tree
//! traversal utilities.
//!
//! Everything here runs in the build phase — single-threaded, pure, no
//! queues, no pools. The output of [`GraphBuilder::build`] is a plain
//! [`Node`](crate::node::Node) tree ready for a lowering pass
//! (see [`crate::lowering`]).

mod builder;
mod cursor;
#[cfg(feature = "dot")]
mod dot;
mod iteration;

pub use builder::{graph, GraphBuilder};
pub use cursor::Cursor;

use crate::types::NodeId;
use miette::Diagnostic;
use thiserror::Error;

/// Construction-time errors. These are hard preconditions: unlike runtime
/// business errors, they are never swallowed.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The builder was asked to produce a graph without any node.
    #[error("graph is empty")]
    #[diagnostic(code(ramify::graph::empty))]
    Empty,

    /// Two nodes in one graph share an id.
    #[error("duplicate node id: {id}")]
    #[diagnostic(
        code(ramify::graph::duplicate_id),
        help("Override one of the ids with with_id.")
    )]
    DuplicateId { id: NodeId },

    /// A lookup by id found nothing.
    #[error("no node with id {id}")]
    #[diagnostic(code(ramify::graph::node_not_found))]
    NodeNotFound { id: NodeId },

    /// `subscribe` was handed a subscriber that already carries a transform.
    #[error("subscriber {id} must not carry a transform")]
    #[diagnostic(
        code(ramify::graph::subscriber_has_transform),
        help("A subscriber only forwards into the root ingress; its transform slot must be empty.")
    )]
    SubscriberHasTransform { id: NodeId },

    /// `publish` was configured without a topic.
    #[error("publish config is missing a topic")]
    #[diagnostic(code(ramify::graph::missing_topic))]
    MissingTopic,

    /// The operation needs a lowered root with an ingress.
    #[error("graph has no ingress; lower it with fifo_in or priority_in first")]
    #[diagnostic(code(ramify::graph::missing_ingress))]
    MissingIngress,

    /// The topic store refused the publisher's topic at build time.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] crate::pubsub::StoreError),
}
