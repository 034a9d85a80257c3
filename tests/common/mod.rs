#![allow(dead_code)]

use ramify::config::RunConfig;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a test-writer subscriber so swallowed-error warnings show up in
/// failing test output. Safe to call from every test; later calls are
/// no-ops.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init()
        .ok();
}

/// Tight timings so pool-mode tests finish in milliseconds: single-threaded
/// pools, a short idle sleep, and small shutdown windows.
pub fn test_config() -> RunConfig {
    RunConfig::default()
        .with_default_threads(1)
        .with_idle(Duration::from_millis(5))
        .with_shutdown_timeouts(Duration::from_millis(300), Duration::from_millis(700))
}

/// A pass-through transform that reports every value it sees on a channel.
/// Attach as a leaf to observe what reaches it.
pub fn observed<T>() -> (
    impl Fn(T) -> T + Send + Sync + Clone + 'static,
    flume::Receiver<T>,
)
where
    T: Clone + Send + Sync + 'static,
{
    let (tx, rx) = flume::unbounded();
    (
        move |value: T| {
            let _ = tx.send(value.clone());
            value
        },
        rx,
    )
}

/// Collect up to `n` observations, giving up after `limit`.
pub async fn collect_n<T>(rx: &flume::Receiver<T>, n: usize, limit: Duration) -> Vec<T> {
    let mut out = Vec::new();
    let deadline = tokio::time::Instant::now() + limit;
    while out.len() < n {
        let now = tokio::time::Instant::now();
        if now >= deadline {
            break;
        }
        match tokio::time::timeout(deadline - now, rx.recv_async()).await {
            Ok(Ok(value)) => out.push(value),
            _ => break,
        }
    }
    out
}

/// Collect everything observed within `window`.
pub async fn drain_for<T>(rx: &flume::Receiver<T>, window: Duration) -> Vec<T> {
    let mut out = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    loop {
        let now = tokio::time::Instant::now();
        if now >= deadline {
            break;
        }
        match tokio::time::timeout(deadline - now, rx.recv_async()).await {
            Ok(Ok(value)) => out.push(value),
            _ => break,
        }
    }
    out
}
