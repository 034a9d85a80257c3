//! Batch convenience ops over a bounded worker budget.
//!
//! These are not used by the graph executor; they round out the engine for
//! callers who want claypoole-style parallel collection work against the
//! same parallelism they gave their pools.
//!
//! Every op accepts either a plain count — transient workers, torn down when
//! the call returns — or a borrowed [`WorkerPool`], whose configured
//! parallelism is reused. A borrowed pool stays owned by the caller: the ops
//! never shut it down.

use super::WorkerPool;
use futures_util::{future, stream, StreamExt};
use parking_lot::Mutex;
use std::future::Future;

/// The worker budget for a batch op.
#[derive(Clone, Copy)]
pub enum Workers<'a> {
    /// Use up to `n` transient workers.
    Count(usize),
    /// Borrow an existing pool's parallelism. No shutdown occurs.
    Pool(&'a WorkerPool),
}

impl Workers<'_> {
    fn parallelism(&self) -> usize {
        match self {
            Workers::Count(n) => (*n).max(1),
            Workers::Pool(pool) => pool.size(),
        }
    }
}

impl From<usize> for Workers<'static> {
    fn from(n: usize) -> Self {
        Workers::Count(n)
    }
}

impl<'a> From<&'a WorkerPool> for Workers<'a> {
    fn from(pool: &'a WorkerPool) -> Self {
        Workers::Pool(pool)
    }
}

/// Submit every task and wait for all results, in input order.
pub async fn seq_work<'a, W, Fut>(workers: W, tasks: Vec<Fut>) -> Vec<Fut::Output>
where
    W: Into<Workers<'a>>,
    Fut: Future,
{
    let parallelism = workers.into().parallelism();
    stream::iter(tasks).buffered(parallelism).collect().await
}

/// Apply `f` to every item concurrently; results come back in input order.
pub async fn map_work<'a, W, T, U, F, Fut>(workers: W, f: F, items: Vec<T>) -> Vec<U>
where
    W: Into<Workers<'a>>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = U>,
{
    let parallelism = workers.into().parallelism();
    stream::iter(items.into_iter().map(|item| f(item)))
        .buffered(parallelism)
        .collect()
        .await
}

/// Keep the items the predicate admits, in input order.
pub async fn filter_work<'a, W, T, F, Fut>(workers: W, pred: F, items: Vec<T>) -> Vec<T>
where
    W: Into<Workers<'a>>,
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = bool>,
{
    let parallelism = workers.into().parallelism();
    stream::iter(items.into_iter().map(|item| {
        let check = pred(item.clone());
        async move { (check.await, item) }
    }))
    .buffered(parallelism)
    .filter_map(|(keep, item)| future::ready(keep.then_some(item)))
    .collect()
    .await
}

/// Fire `f` for every item and wait until all completions have been counted.
/// Returns the completion count.
pub async fn do_work<'a, W, T, F, Fut>(workers: W, f: F, items: Vec<T>) -> usize
where
    W: Into<Workers<'a>>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let parallelism = workers.into().parallelism();
    stream::iter(items.into_iter().map(|item| f(item)))
        .buffer_unordered(parallelism)
        .fold(0usize, |done, ()| future::ready(done + 1))
        .await
}

/// Run `f` over every item concurrently and fold each result into a shared
/// accumulator as it completes. Completion order is not defined; `fold` runs
/// under a lock and should be cheap and order-insensitive.
pub async fn reduce_work<'a, W, T, U, A, F, Fut, R>(
    workers: W,
    f: F,
    fold: R,
    init: A,
    items: Vec<T>,
) -> A
where
    W: Into<Workers<'a>>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = U>,
    R: Fn(&mut A, U),
{
    let parallelism = workers.into().parallelism();
    let acc = Mutex::new(init);
    stream::iter(items.into_iter().map(|item| f(item)))
        .buffer_unordered(parallelism)
        .for_each(|value| {
            fold(&mut acc.lock(), value);
            future::ready(())
        })
        .await;
    acc.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn map_work_preserves_input_order() {
        let doubled = map_work(
            4usize,
            |n: u64| async move {
                // Later items finish first; order must still hold.
                tokio::time::sleep(Duration::from_millis(20u64.saturating_sub(n * 5))).await;
                n * 2
            },
            vec![1, 2, 3, 4],
        )
        .await;
        assert_eq!(doubled, vec![2, 4, 6, 8]);
    }

    #[tokio::test]
    async fn filter_work_keeps_admitted_items() {
        let odds = filter_work(2usize, |n: i64| async move { n % 2 == 1 }, vec![1, 2, 3, 4, 5]).await;
        assert_eq!(odds, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn do_work_counts_completions() {
        let done = do_work(3usize, |_n: i64| async move {}, vec![10, 20, 30]).await;
        assert_eq!(done, 3);
    }

    #[tokio::test]
    async fn reduce_work_accumulates_every_result() {
        let total = reduce_work(
            4usize,
            |n: i64| async move { n * n },
            |acc: &mut i64, sq| *acc += sq,
            0,
            vec![1, 2, 3, 4],
        )
        .await;
        assert_eq!(total, 30);
    }

    #[tokio::test]
    async fn borrowed_pools_survive_the_op() {
        let pool = WorkerPool::queue_work("shared", 3, || async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok::<(), std::convert::Infallible>(())
        })
        .unwrap();

        let tasks: Vec<std::pin::Pin<Box<dyn Future<Output = i32> + Send>>> =
            vec![Box::pin(async { 1 }), Box::pin(async { 2 })];
        let results = seq_work(&pool, tasks).await;
        assert_eq!(results, vec![1, 2]);
        assert!(!pool.is_shut_down());
        pool.two_phase_shutdown().await.unwrap();
    }
}
