//! Optional petgraph compatibility layer.
//!
//! Converts a node tree into a `petgraph::DiGraph` for algorithmic analysis
//! or DOT visualization. Only available with the `dot` feature:
//!
//! ```toml
//! [dependencies]
//! ramify = { version = "0.1", features = ["dot"] }
//! ```

use crate::node::Node;
use crate::types::Payload;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

impl<T: Payload> Node<T> {
    /// Convert the tree into a directed petgraph, node weights carrying ids.
    pub fn to_petgraph(&self) -> DiGraph<String, ()> {
        let mut graph = DiGraph::new();
        add_subtree(self, &mut graph);
        graph
    }

    /// Render the tree in DOT format.
    ///
    /// ```rust
    /// use ramify::graphs::graph;
    ///
    /// let root = graph::<i64>()
    ///     .each(|x| x)
    ///     .with_id("root")
    ///     .each(|x| x * 2)
    ///     .with_id("double")
    ///     .build()
    ///     .unwrap();
    /// let dot = root.to_dot();
    /// assert!(dot.contains("root"));
    /// assert!(dot.contains("->"));
    /// ```
    pub fn to_dot(&self) -> String {
        let graph = self.to_petgraph();
        format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

fn add_subtree<T: Payload>(node: &Node<T>, graph: &mut DiGraph<String, ()>) -> NodeIndex {
    let index = graph.add_node(node.id().to_string());
    for child in node.children() {
        let child_index = add_subtree(child, graph);
        graph.add_edge(index, child_index, ());
    }
    index
}

#[cfg(test)]
mod tests {
    use crate::graphs::graph;

    #[test]
    fn petgraph_export_matches_tree_shape() {
        let root = graph::<i64>()
            .each(|x| x)
            .subgraph(|g| g.each(|x| x + 1))
            .subgraph(|g| g.each(|x| x + 2).each(|x| x + 3))
            .build()
            .unwrap();

        let exported = root.to_petgraph();
        assert_eq!(exported.node_count(), 4);
        assert_eq!(exported.edge_count(), 3);
        assert!(!petgraph::algo::is_cyclic_directed(&exported));
    }
}
