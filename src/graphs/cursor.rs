//! A zipper over an owned node tree.
//!
//! The cursor is an explicit `(tree, path)` pair: it owns the whole tree and
//! tracks the current position as a list of child indexes from the root.
//! Builder operations navigate and edit through it during construction; it
//! never survives into a lowered graph.

use crate::node::Node;
use crate::types::Payload;

/// Navigable view over an owned tree.
///
/// # Examples
///
/// ```rust
/// use ramify::graphs::Cursor;
/// use ramify::node::Node;
///
/// let mut cursor = Cursor::new(Node::<i64>::identity().with_id("root"));
/// cursor.insert_child(Node::map(|x: i64| x * 2).with_id("double"));
/// assert_eq!(cursor.node().id().as_str(), "double");
///
/// assert!(cursor.up());
/// assert_eq!(cursor.node().id().as_str(), "root");
/// ```
pub struct Cursor<T: Payload> {
    root: Node<T>,
    path: Vec<usize>,
}

impl<T: Payload> Cursor<T> {
    /// A cursor positioned on `root`.
    pub fn new(root: Node<T>) -> Self {
        Cursor {
            root,
            path: Vec::new(),
        }
    }

    fn resolve_at<'a>(root: &'a Node<T>, path: &[usize]) -> &'a Node<T> {
        let mut node = root;
        for &index in path {
            node = &node.children()[index];
        }
        node
    }

    /// The node under the cursor.
    pub fn node(&self) -> &Node<T> {
        Self::resolve_at(&self.root, &self.path)
    }

    /// Mutable access to the node under the cursor.
    pub fn node_mut(&mut self) -> &mut Node<T> {
        let mut node = &mut self.root;
        for &index in &self.path {
            node = &mut node.children_mut()[index];
        }
        node
    }

    /// Apply an edit to the node under the cursor.
    pub fn edit(&mut self, f: impl FnOnce(&mut Node<T>)) {
        f(self.node_mut());
    }

    /// The tree's root, wherever the cursor points.
    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    /// Consume the cursor, yielding the tree.
    pub fn into_root(self) -> Node<T> {
        self.root
    }

    pub fn at_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Move to the parent. `false` (and no move) at the root.
    pub fn up(&mut self) -> bool {
        self.path.pop().is_some()
    }

    /// Move to the first child. `false` (and no move) on a leaf.
    pub fn down(&mut self) -> bool {
        self.down_to(0)
    }

    /// Move to the child at `index`. `false` (and no move) when out of
    /// range.
    pub fn down_to(&mut self, index: usize) -> bool {
        if index < self.node().children().len() {
            self.path.push(index);
            true
        } else {
            false
        }
    }

    /// Move to the leftmost sibling. No-op at the root.
    pub fn leftmost(&mut self) {
        if let Some(last) = self.path.last_mut() {
            *last = 0;
        }
    }

    /// Move to the pre-order successor. `false` (and no move) past the last
    /// node.
    pub fn next(&mut self) -> bool {
        if self.down() {
            return true;
        }
        let mut path = self.path.clone();
        while let Some(index) = path.pop() {
            let siblings = Self::resolve_at(&self.root, &path).children().len();
            if index + 1 < siblings {
                path.push(index + 1);
                self.path = path;
                return true;
            }
        }
        false
    }

    /// Append `child` under the cursor and move onto it.
    pub fn insert_child(&mut self, child: Node<T>) {
        let node = self.node_mut();
        node.push_child(child);
        let index = node.children().len() - 1;
        self.path.push(index);
    }

    /// Append `child` under the cursor without moving.
    pub fn append_child(&mut self, child: Node<T>) {
        self.node_mut().push_child(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(id: &str) -> Node<i64> {
        Node::identity().with_id(id)
    }

    fn sample() -> Cursor<i64> {
        // root ── a ── a1
        //      └─ b
        let mut cursor = Cursor::new(labelled("root"));
        cursor.insert_child(labelled("a"));
        cursor.insert_child(labelled("a1"));
        cursor.up();
        cursor.up();
        cursor.append_child(labelled("b"));
        cursor
    }

    #[test]
    fn insertion_moves_appending_stays() {
        let cursor = sample();
        assert!(cursor.at_root());
        let ids: Vec<_> = cursor
            .root()
            .children()
            .iter()
            .map(|c| c.id().as_str().to_owned())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn pre_order_walk_covers_every_node() {
        let mut cursor = sample();
        let mut seen = vec![cursor.node().id().as_str().to_owned()];
        while cursor.next() {
            seen.push(cursor.node().id().as_str().to_owned());
        }
        assert_eq!(seen, vec!["root", "a", "a1", "b"]);
        // Exhausted: cursor stays put.
        assert!(!cursor.next());
        assert_eq!(cursor.node().id().as_str(), "b");
    }

    #[test]
    fn leftmost_resets_the_sibling_index() {
        let mut cursor = sample();
        assert!(cursor.down_to(1));
        assert_eq!(cursor.node().id().as_str(), "b");
        cursor.leftmost();
        assert_eq!(cursor.node().id().as_str(), "a");
    }

    #[test]
    fn edit_reaches_the_current_node() {
        let mut cursor = sample();
        cursor.down();
        cursor.edit(|node| node.set_threads(7));
        assert_eq!(cursor.node().threads(), Some(7));
        assert_eq!(cursor.root().threads(), None);
    }

    #[test]
    fn navigation_refuses_out_of_range_moves() {
        let mut cursor = Cursor::new(labelled("only"));
        assert!(!cursor.up());
        assert!(!cursor.down());
        assert!(!cursor.down_to(3));
        assert!(cursor.at_root());
    }
}
