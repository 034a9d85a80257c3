//! Core identity and payload types shared across the crate.
//!
//! - [`NodeId`]: stable identity of a vertex within one graph
//! - [`Payload`]: the bounds a value must satisfy to flow through a graph
//!
//! Everything else in the crate is generic over a single payload type: one
//! graph carries one `T` from its root ingress down to its leaves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Values that can flow through a graph.
///
/// The `PartialEq` bound backs `offer_unique` deduplication on both queue
/// kinds; items should be value-like — deduplicating by identity of interior
/// mutability is not supported.
///
/// The trait is blanket-implemented; there is nothing to implement by hand.
pub trait Payload: Clone + PartialEq + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Stable identity of a node within one graph.
///
/// Defaults to a derivation from the transform's type plus an insertion
/// counter (Rust offers no way to hash the *contents* of a function value),
/// and can be overridden wherever a node is constructed. Ids must be unique
/// within a graph; [`GraphBuilder::build`](crate::graphs::GraphBuilder::build)
/// enforces this.
///
/// # Examples
///
/// ```rust
/// use ramify::types::NodeId;
///
/// let id = NodeId::new("enrich");
/// assert_eq!(id.as_str(), "enrich");
/// assert_eq!(id.to_string(), "enrich");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from an explicit name.
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// The id as a borrowed string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a default id for an anonymous node.
    pub(crate) fn derived(label: &str, seq: u64) -> Self {
        NodeId(format!("{label}-{seq}"))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

static NODE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Next value of the process-wide node insertion counter.
pub(crate) fn next_node_seq() -> u64 {
    NODE_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Shorten a `std::any::type_name` to its last path segment, generics
/// stripped. Used for derived node ids.
pub(crate) fn short_type_name(full: &'static str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
