//! Sync mode: compile the tree into one composed closure.

use super::{graph_rewrite, LowerError, Rewrite};
use crate::node::Node;
use crate::types::Payload;
use crate::workers::ExecStrategy;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;

/// Compile the tree into its composed form.
///
/// The returned closure applies the node's gate and transform, then feeds
/// every output element depth-first to every child, recursively, all on the
/// caller's task. It resolves to the root transform's outputs (`None` when
/// the input was gated away or the transform failed). No queues, no pools.
pub fn comp_rewrite<'a, T: Payload>(root: &'a Node<T>) -> impl Fn(T) -> BoxFuture<'a, Option<Vec<T>>> + 'a {
    move |input| mono(root, input)
}

fn mono<'a, T: Payload>(node: &'a Node<T>, input: T) -> BoxFuture<'a, Option<Vec<T>>> {
    Box::pin(async move {
        if let Some(gate) = node.gate() {
            if !(gate)(&input) {
                return None;
            }
        }

        let outputs = match node.exec() {
            ExecStrategy::Apply => match node.transform().apply(input).await {
                Ok(outputs) => outputs,
                Err(error) => {
                    tracing::warn!(node = %node.id(), %error, "transform failed");
                    return None;
                }
            },
            ExecStrategy::Drive => {
                // No live sink exists in sync mode; collect the emissions
                // and forward them below.
                let collected = Arc::new(Mutex::new(Vec::new()));
                let target = collected.clone();
                let sink = move |value: T| target.lock().push(value);
                if let Err(error) = node.transform().drive(input, &sink).await {
                    tracing::warn!(node = %node.id(), %error, "transform failed");
                    return None;
                }
                let taken = std::mem::take(&mut *collected.lock());
                taken
            }
        };

        for value in &outputs {
            for child in node.children() {
                mono(child, value.clone()).await;
            }
        }
        Some(outputs)
    })
}

/// Fold `rewrites` over the graph, compile, and apply the composed closure
/// to each input on the caller's task. Returns the rewritten graph.
pub async fn run_sync<T: Payload>(
    graph: Node<T>,
    data: impl IntoIterator<Item = T>,
    rewrites: Vec<Rewrite<T>>,
) -> Result<Node<T>, LowerError> {
    let root = graph_rewrite(rewrites, graph)?;
    {
        let mono = comp_rewrite(&root);
        for input in data {
            mono(input).await;
        }
    }
    Ok(root)
}
