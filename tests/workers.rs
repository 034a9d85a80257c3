//! The worker engine driven standalone, without the graph layer.

mod common;
use common::{collect_n, init_tracing};

use ramify::node::{Node, Sink, TaskSource};
use ramify::queues::LocalQueue;
use ramify::workers::{
    map_work, reduce_work, seq_work, work, ExecStrategy, UnitScheduler, WorkUnit, WorkerPool,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_pool_of_workers_drains_a_shared_queue() {
    init_tracing();
    let queue = Arc::new(LocalQueue::new());
    let (tx, rx) = flume::unbounded();

    let node = Node::map(|x: i64| x * 2);
    let sink: Sink<i64> = Arc::new(move |value| {
        let _ = tx.send(value);
    });
    let source: Arc<dyn TaskSource<i64>> = queue.clone();
    let unit = WorkUnit {
        transform: node.transform().clone(),
        input: Some(source),
        output: Some(sink),
        exec: ExecStrategy::Apply,
        gate: None,
    };
    let scheduler: UnitScheduler<i64> = Arc::new(move || unit.clone());

    let pool = WorkerPool::queue_work("drain", 3, work(scheduler, Duration::from_millis(5)))
        .unwrap()
        .with_shutdown_timeouts(Duration::from_millis(300), Duration::from_millis(700));

    for n in 0..50 {
        queue.offer(n);
    }

    let mut seen = collect_n(&rx, 50, Duration::from_secs(2)).await;
    pool.two_phase_shutdown().await.unwrap();

    seen.sort_unstable();
    let expected: Vec<_> = (0..50).map(|n| n * 2).collect();
    assert_eq!(seen, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_ops_share_a_pool_without_owning_it() {
    init_tracing();
    let pool = WorkerPool::queue_work("batch", 4, || async {
        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok::<(), std::convert::Infallible>(())
    })
    .unwrap();

    let squares = map_work(&pool, |n: i64| async move { n * n }, vec![1, 2, 3, 4]).await;
    assert_eq!(squares, vec![1, 4, 9, 16]);

    let tasks: Vec<std::pin::Pin<Box<dyn std::future::Future<Output = &'static str> + Send>>> =
        vec![Box::pin(async { "a" }), Box::pin(async { "b" }), Box::pin(async { "c" })];
    let ordered = seq_work(&pool, tasks).await;
    assert_eq!(ordered, vec!["a", "b", "c"]);

    let sum = reduce_work(
        &pool,
        |n: i64| async move { n },
        |acc: &mut i64, n| *acc += n,
        0,
        (1..=10).collect(),
    )
    .await;
    assert_eq!(sum, 55);

    // The ops borrowed the pool's parallelism; it is still ours to stop.
    assert!(!pool.is_shut_down());
    pool.two_phase_shutdown().await.unwrap();
}
