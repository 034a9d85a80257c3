//! Fluent construction of node trees.

use super::cursor::Cursor;
use super::GraphError;
use crate::node::Node;
use crate::types::{NodeId, Payload};
use crate::workers::ExecStrategy;
use rustc_hash::FxHashSet;

/// Start an empty graph.
pub fn graph<T: Payload>() -> GraphBuilder<T> {
    GraphBuilder::new()
}

/// Builder for node trees with a fluent API.
///
/// The builder wraps a [`Cursor`]; every append documents where it leaves
/// the cursor:
///
/// - [`each`](Self::each) / [`multimap`](Self::multimap) /
///   [`each_node`](Self::each_node) append a child and **move onto it** —
///   chained calls build a path.
/// - [`subgraph`](Self::subgraph) appends a finished sub-tree and **stays on
///   the parent** — chained calls build siblings.
/// - Modifiers ([`with_id`](Self::with_id), [`when`](Self::when),
///   [`threads`](Self::threads), [`drive`](Self::drive)) edit the node the
///   cursor is on.
///
/// The first append on an empty builder creates the root.
///
/// # Examples
///
/// A root fanning out to a gated doubler and a collector:
///
/// ```rust
/// use ramify::graphs::graph;
///
/// let root = graph::<i64>()
///     .each(|x| x)
///     .with_id("root")
///     .subgraph(|g| {
///         g.each(|x| x * 2)
///             .with_id("double")
///             .when(|x| x % 2 == 1)
///     })
///     .subgraph(|g| g.each(|x| x).with_id("audit"))
///     .build()
///     .unwrap();
///
/// assert_eq!(root.children().len(), 2);
/// ```
pub struct GraphBuilder<T: Payload> {
    cursor: Option<Cursor<T>>,
}

impl<T: Payload> Default for GraphBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> GraphBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        GraphBuilder { cursor: None }
    }

    fn attach(mut self, node: Node<T>) -> Self {
        match self.cursor.as_mut() {
            None => self.cursor = Some(Cursor::new(node)),
            Some(cursor) => cursor.insert_child(node),
        }
        self
    }

    fn edit_current(mut self, what: &str, f: impl FnOnce(&mut Node<T>)) -> Self {
        match self.cursor.as_mut() {
            None => tracing::warn!(modifier = what, "modifier on an empty graph ignored"),
            Some(cursor) => cursor.edit(f),
        }
        self
    }

    /// Append a child that receives the parent's output. Moves onto it.
    #[must_use]
    pub fn each<F>(self, f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.attach(Node::map(f))
    }

    /// Append a multimap child: `f` returns a sequence whose elements are
    /// forwarded individually. Moves onto it.
    #[must_use]
    pub fn multimap<F>(self, f: F) -> Self
    where
        F: Fn(T) -> Vec<T> + Send + Sync + 'static,
    {
        self.attach(Node::flat_map(f))
    }

    /// Append a prebuilt node (custom [`Transform`](crate::node::Transform)
    /// impls). Moves onto it.
    #[must_use]
    pub fn each_node(self, node: Node<T>) -> Self {
        self.attach(node)
    }

    /// Append a sub-tree built from an empty builder. Stays on the parent,
    /// so repeated calls create siblings. An empty sub-build is ignored with
    /// a warning.
    #[must_use]
    pub fn subgraph(mut self, build: impl FnOnce(GraphBuilder<T>) -> GraphBuilder<T>) -> Self {
        let sub = build(GraphBuilder::new());
        let Some(sub_cursor) = sub.cursor else {
            tracing::warn!("ignoring empty subgraph");
            return self;
        };
        let subtree = sub_cursor.into_root();
        match self.cursor.as_mut() {
            None => self.cursor = Some(Cursor::new(subtree)),
            Some(cursor) => cursor.append_child(subtree),
        }
        self
    }

    /// Move the cursor to the parent. No-op at the root.
    #[must_use]
    pub fn up(mut self) -> Self {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.up();
        }
        self
    }

    /// Override the current node's id.
    #[must_use]
    pub fn with_id(self, id: impl Into<NodeId>) -> Self {
        let id = id.into();
        self.edit_current("with_id", move |node| node.set_id(id))
    }

    /// Gate the current node: inputs failing the predicate skip it entirely.
    #[must_use]
    pub fn when<F>(self, pred: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.edit_current("when", move |node| node.set_gate(std::sync::Arc::new(pred)))
    }

    /// Pool size for the current node in pool mode.
    #[must_use]
    pub fn threads(self, threads: usize) -> Self {
        self.edit_current("threads", move |node| node.set_threads(threads))
    }

    /// Let the current node's transform drive the downstream sink itself.
    #[must_use]
    pub fn drive(self) -> Self {
        self.edit_current("drive", |node| node.set_exec(ExecStrategy::Drive))
    }

    /// Finish construction.
    ///
    /// # Errors
    ///
    /// [`GraphError::Empty`] on a builder with no nodes;
    /// [`GraphError::DuplicateId`] when two nodes share an id.
    pub fn build(self) -> Result<Node<T>, GraphError> {
        let Some(cursor) = self.cursor else {
            return Err(GraphError::Empty);
        };
        let root = cursor.into_root();

        let mut seen = FxHashSet::default();
        let mut duplicate = None;
        root.visit(&mut |node| {
            if !seen.insert(node.id().clone()) && duplicate.is_none() {
                duplicate = Some(node.id().clone());
            }
        });
        if let Some(id) = duplicate {
            return Err(GraphError::DuplicateId { id });
        }
        Ok(root)
    }
}
