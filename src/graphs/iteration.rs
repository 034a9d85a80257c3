//! Whole-tree traversal utilities on [`Node`].
//!
//! All walks are pre-order; lookups return the first match.

use super::GraphError;
use crate::node::Node;
use crate::types::{NodeId, Payload};

impl<T: Payload> Node<T> {
    /// Visit every node pre-order.
    pub fn visit<F: FnMut(&Node<T>)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Apply `f` to every node pre-order.
    pub fn update_nodes<F: FnMut(&mut Node<T>)>(&mut self, f: &mut F) {
        f(self);
        for child in self.children_mut() {
            child.update_nodes(f);
        }
    }

    /// First node with the given id.
    pub fn find(&self, id: &NodeId) -> Option<&Node<T>> {
        if self.id() == id {
            return Some(self);
        }
        for child in self.children() {
            if let Some(found) = child.find(id) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable lookup by id.
    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node<T>> {
        if self.id() == id {
            return Some(self);
        }
        for child in self.children_mut() {
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        None
    }

    /// Apply `f` to the first node matching `id`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NodeNotFound`] when no node matches.
    pub fn update_node<F: FnOnce(&mut Node<T>)>(
        &mut self,
        id: &NodeId,
        f: F,
    ) -> Result<(), GraphError> {
        match self.find_mut(id) {
            Some(node) => {
                f(node);
                Ok(())
            }
            None => Err(GraphError::NodeNotFound { id: id.clone() }),
        }
    }

    /// Insert `child` under the first node matching `parent`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NodeNotFound`] when no node matches.
    pub fn append_child(&mut self, parent: &NodeId, child: Node<T>) -> Result<(), GraphError> {
        match self.find_mut(parent) {
            Some(node) => {
                node.push_child(child);
                Ok(())
            }
            None => Err(GraphError::NodeNotFound { id: parent.clone() }),
        }
    }

    /// Collect the nodes admitted by `pred`, pre-order.
    pub fn filter_nodes<P: Fn(&Node<T>) -> bool>(&self, pred: P) -> Vec<&Node<T>> {
        let mut out = Vec::new();
        self.collect_filtered(&pred, &mut out);
        out
    }

    fn collect_filtered<'a, P: Fn(&Node<T>) -> bool>(
        &'a self,
        pred: &P,
        out: &mut Vec<&'a Node<T>>,
    ) {
        if pred(self) {
            out.push(self);
        }
        for child in self.children() {
            child.collect_filtered(pred, out);
        }
    }

    /// Number of nodes in the tree.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Node::count).sum::<usize>()
    }

    /// Every id, pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.visit(&mut |node| ids.push(node.id().clone()));
        ids
    }
}
