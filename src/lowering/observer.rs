//! Uniform instrumentation over every vertex.

use super::Rewrite;
use crate::node::{Node, Transform};
use crate::types::Payload;
use std::sync::Arc;

/// Receives each vertex and returns its replacement transform. The vertex is
/// handed over whole so the observer can key on id, multimap, thread count —
/// and, typically, wrap the transform it finds there.
pub type Observer<T> = Arc<dyn Fn(&Node<T>) -> Arc<dyn Transform<T>> + Send + Sync>;

/// Replace every vertex's transform with `observe(vertex)`.
///
/// The seam for uniform timing, tracing, or metric wrappers: an observer
/// that clones the vertex's transform into a wrapping transform instruments
/// the whole graph in one pass.
///
/// # Examples
///
/// ```rust
/// use ramify::lowering::{graph_rewrite, observer_rewrite, Observer};
/// use ramify::graphs::graph;
/// use ramify::node::{Transform, TransformError};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct Traced {
///     id: String,
///     inner: Arc<dyn Transform<i64>>,
/// }
///
/// #[async_trait]
/// impl Transform<i64> for Traced {
///     async fn apply(&self, input: i64) -> Result<Vec<i64>, TransformError> {
///         tracing::info!(node = %self.id, "applying");
///         self.inner.apply(input).await
///     }
/// }
///
/// let observer: Observer<i64> = Arc::new(|vertex| {
///     Arc::new(Traced {
///         id: vertex.id().to_string(),
///         inner: vertex.transform().clone(),
///     })
/// });
///
/// let built = graph::<i64>().each(|x| x * 2).build().unwrap();
/// let traced = graph_rewrite(vec![observer_rewrite(observer)], built).unwrap();
/// # let _ = traced;
/// ```
pub fn observer_rewrite<T: Payload>(observe: Observer<T>) -> Rewrite<T> {
    Box::new(move |mut root| {
        root.update_nodes(&mut |node| {
            let wrapped = observe(node);
            node.set_transform(wrapped);
        });
        Ok(root)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::graph;
    use crate::lowering::graph_rewrite;
    use crate::node::TransformError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Counting {
        hits: Arc<Mutex<Vec<String>>>,
        id: String,
        inner: Arc<dyn Transform<i64>>,
    }

    #[async_trait]
    impl Transform<i64> for Counting {
        async fn apply(&self, input: i64) -> Result<Vec<i64>, TransformError> {
            self.hits.lock().push(self.id.clone());
            self.inner.apply(input).await
        }
    }

    #[tokio::test]
    async fn wraps_every_vertex() {
        let built = graph::<i64>()
            .each(|x| x)
            .with_id("root")
            .each(|x| x + 1)
            .with_id("child")
            .build()
            .unwrap();

        let hits = Arc::new(Mutex::new(Vec::new()));
        let observer: Observer<i64> = {
            let hits = hits.clone();
            Arc::new(move |vertex| {
                Arc::new(Counting {
                    hits: hits.clone(),
                    id: vertex.id().to_string(),
                    inner: vertex.transform().clone(),
                })
            })
        };

        let root = graph_rewrite(vec![observer_rewrite(observer)], built).unwrap();
        let outputs = crate::lowering::comp_rewrite(&root)(1).await;
        assert_eq!(outputs, Some(vec![1]));
        assert_eq!(*hits.lock(), vec!["root".to_string(), "child".to_string()]);
    }
}
