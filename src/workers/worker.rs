//! The generic worker loop and its execution strategies.

use crate::node::{Gate, Sink, Task, TaskSource, Transform, TransformError};
use crate::types::Payload;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// How a node's outputs reach the downstream sink.
///
/// - `Apply`: the loop applies the transform and feeds each returned value to
///   the sink. The transform never sees the sink.
/// - `Drive`: the loop hands the sink to [`Transform::drive`]; the transform
///   decides how often to call it — zero, many, or deferred emissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecStrategy {
    #[default]
    Apply,
    Drive,
}

impl ExecStrategy {
    /// Execute one task under this strategy. Invokes the task's completion
    /// callback after the transform finishes, regardless of strategy.
    pub async fn run<T: Payload>(
        self,
        transform: &Arc<dyn Transform<T>>,
        task: Task<T>,
        output: Option<&Sink<T>>,
    ) -> Result<(), TransformError> {
        let Task { value, on_done } = task;
        let retained = on_done.as_ref().map(|_| value.clone());

        match self {
            ExecStrategy::Apply => {
                let outputs = transform.apply(value).await?;
                // Acknowledge completion before the results move downstream.
                if let (Some(done), Some(original)) = (on_done, retained) {
                    done(&original);
                }
                if let Some(out) = output {
                    for produced in outputs {
                        (out)(produced);
                    }
                }
            }
            ExecStrategy::Drive => {
                match output {
                    Some(out) => {
                        let forward = out.clone();
                        let sink = move |produced: T| (forward)(produced);
                        transform.drive(value, &sink).await?;
                    }
                    None => {
                        transform.drive(value, &|_produced: T| {}).await?;
                    }
                }
                if let (Some(done), Some(original)) = (on_done, retained) {
                    done(&original);
                }
            }
        }
        Ok(())
    }
}

/// The bundle a worker asks its scheduler for on every iteration.
#[derive(Clone)]
pub struct WorkUnit<T: Payload> {
    pub transform: Arc<dyn Transform<T>>,
    pub input: Option<Arc<dyn TaskSource<T>>>,
    pub output: Option<Sink<T>>,
    pub exec: ExecStrategy,
    /// Checked by the loop for values that arrive through an ingress rather
    /// than a parent sink (the root). Edge deliveries are gated at offer
    /// time by the parent's output.
    pub gate: Option<Gate<T>>,
}

/// Hands the loop its current work unit. The indirection keeps the loop
/// ignorant of where the bundle comes from; for pool-lowered graphs it is a
/// constant per node.
pub type UnitScheduler<T> = Arc<dyn Fn() -> WorkUnit<T> + Send + Sync + 'static>;

/// Build the per-iteration body of a worker.
///
/// Each call asks the scheduler for the current unit and polls its input: a
/// waiting task is executed under the unit's strategy, an empty poll (or a
/// node with no input wired yet) sleeps for `idle`. Nodes with nothing to do
/// simply yield — this is the steady state until the root receives work or a
/// refill fires.
pub fn work<T: Payload>(
    scheduler: UnitScheduler<T>,
    idle: Duration,
) -> impl Fn() -> BoxFuture<'static, Result<(), TransformError>> + Send + Sync + Clone + 'static {
    move || {
        let scheduler = scheduler.clone();
        Box::pin(async move {
            let unit = scheduler();
            let Some(input) = unit.input.clone() else {
                tokio::time::sleep(idle).await;
                return Ok(());
            };
            let Some(task) = input.poll_task() else {
                tokio::time::sleep(idle).await;
                return Ok(());
            };
            if let Some(gate) = &unit.gate {
                if !(gate)(&task.value) {
                    return Ok(());
                }
            }
            unit.exec
                .run(&unit.transform, task, unit.output.as_ref())
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::queues::LocalQueue;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn capture<T: Payload>() -> (Sink<T>, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let writer = seen.clone();
        let sink: Sink<T> = Arc::new(move |value| writer.lock().push(value));
        (sink, seen)
    }

    #[tokio::test]
    async fn apply_feeds_each_output_to_the_sink() {
        let node = Node::flat_map(|x: i64| vec![x, x * 10]);
        let (sink, seen) = capture();
        ExecStrategy::Apply
            .run(node.transform(), Task::new(4), Some(&sink))
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec![4, 40]);
    }

    struct Emitter;

    #[async_trait]
    impl Transform<i64> for Emitter {
        async fn apply(&self, _input: i64) -> Result<Vec<i64>, TransformError> {
            Err(TransformError::Failed {
                reason: "apply is not the contract for this node".into(),
            })
        }

        async fn drive(
            &self,
            input: i64,
            out: &(dyn Fn(i64) + Send + Sync),
        ) -> Result<(), TransformError> {
            // Emits twice and suppresses zero; the loop never sees outputs.
            if input != 0 {
                out(input);
                out(input + 1);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn drive_hands_the_sink_to_the_transform() {
        let transform: Arc<dyn Transform<i64>> = Arc::new(Emitter);
        let (sink, seen) = capture();
        ExecStrategy::Drive
            .run(&transform, Task::new(7), Some(&sink))
            .await
            .unwrap();
        ExecStrategy::Drive
            .run(&transform, Task::new(0), Some(&sink))
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec![7, 8]);
    }

    #[tokio::test]
    async fn completion_callback_fires_after_the_transform() {
        let node = Node::map(|x: i64| x + 1);
        let (sink, seen) = capture();
        let order = Arc::new(Mutex::new(Vec::new()));
        let tracker = order.clone();
        let task = Task {
            value: 9,
            on_done: Some(Arc::new(move |item: &i64| {
                tracker.lock().push(*item);
            })),
        };
        ExecStrategy::Apply
            .run(node.transform(), task, Some(&sink))
            .await
            .unwrap();
        assert_eq!(*order.lock(), vec![9]);
        assert_eq!(*seen.lock(), vec![10]);
    }

    #[tokio::test]
    async fn empty_poll_yields_without_executing() {
        let queue: Arc<dyn TaskSource<i64>> = Arc::new(LocalQueue::new());
        let node = Node::map(|x: i64| x);
        let (sink, seen) = capture();
        let unit = WorkUnit {
            transform: node.transform().clone(),
            input: Some(queue),
            output: Some(sink),
            exec: ExecStrategy::Apply,
            gate: None,
        };
        let scheduler: UnitScheduler<i64> = Arc::new(move || unit.clone());
        let body = work(scheduler, Duration::from_millis(1));
        body().await.unwrap();
        assert!(seen.lock().is_empty());
    }
}
