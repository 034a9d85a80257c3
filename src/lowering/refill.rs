//! Scheduled refill of an idle ingress.

use super::{LowerError, Rewrite};
use crate::graphs::GraphError;
use crate::types::Payload;
use crate::workers::schedule_work;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Start a scheduler that tops up the root ingress from `refill` every
/// `freq` — but only when the ingress is empty at tick time; a non-empty
/// queue skips the tick entirely.
///
/// Each returned item is offered individually; a rejected offer (bounded
/// ingress at capacity) is logged and swallowed, and the remaining items are
/// still offered. The scheduler's stop is appended to the root's shutdown
/// actions.
///
/// Requires an ingress, so it belongs after
/// [`fifo_in`](super::fifo_in)/[`priority_in`](super::priority_in) in the
/// rewrite order; [`run_pool`](super::run_pool) already sequences user
/// rewrites that way.
pub fn schedule_refill<T, F, Fut>(refill: F, freq: Duration) -> Rewrite<T>
where
    T: Payload,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<T>> + Send + 'static,
{
    Box::new(move |mut root| {
        let Some(ingress) = root.runtime().and_then(|rt| rt.ingress.clone()) else {
            return Err(LowerError::Graph(GraphError::MissingIngress));
        };
        let refill = Arc::new(refill);

        let job = move || {
            let ingress = ingress.clone();
            let refill = refill.clone();
            async move {
                if !ingress.is_empty() {
                    return Ok(());
                }
                for item in refill().await {
                    if let Err(error) = ingress.offer(item) {
                        tracing::warn!(%error, "refill offer rejected");
                    }
                }
                Ok(())
            }
        };

        let worker = schedule_work(format!("refill:{}", root.id()), job, freq);
        root.push_shutdown(Arc::new(worker));
        Ok(root)
    })
}
