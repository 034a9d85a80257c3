//! Fixed-size worker pools with two-phase shutdown.

use crate::config::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_FORCE_TIMEOUT};
use crate::node::{Shutdown, ShutdownError};
use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Errors raised when starting a pool.
#[derive(Debug, Error, Diagnostic)]
pub enum PoolError {
    /// A pool of zero workers would accept work and never run it.
    #[error("pool {name} started with zero workers")]
    #[diagnostic(
        code(ramify::pool::zero_workers),
        help("Pass a worker count of at least 1, or leave the node's threads unset.")
    )]
    ZeroWorkers { name: String },
}

/// A fixed-size set of looping workers.
///
/// [`queue_work`](Self::queue_work) spawns `size` tasks, each running the
/// given body repeatedly until the pool shuts down. A body error is logged
/// and swallowed — a worker never dies on a business error.
///
/// Shutdown is two-phase: cancel politely and let in-flight iterations drain
/// (up to `drain_timeout`), then abort and wait again (`force_timeout`). A
/// pool that survives both windows is reported, logged, and abandoned.
#[derive(Debug)]
pub struct WorkerPool {
    name: String,
    size: usize,
    quit: CancellationToken,
    workers: Mutex<Option<JoinSet<()>>>,
    drain_timeout: Duration,
    force_timeout: Duration,
}

impl WorkerPool {
    /// Spawn `size` workers, each executing `work_fn` in a loop.
    ///
    /// # Errors
    ///
    /// [`PoolError::ZeroWorkers`] when `size` is zero.
    pub fn queue_work<F, Fut, E>(
        name: impl Into<String>,
        size: usize,
        work_fn: F,
    ) -> Result<Self, PoolError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let name = name.into();
        if size == 0 {
            return Err(PoolError::ZeroWorkers { name });
        }

        let quit = CancellationToken::new();
        let mut workers = JoinSet::new();
        for worker in 0..size {
            let work = work_fn.clone();
            let quit = quit.clone();
            let pool = name.clone();
            workers.spawn(async move {
                tracing::debug!(%pool, worker, "worker started");
                loop {
                    if quit.is_cancelled() {
                        break;
                    }
                    if let Err(error) = work().await {
                        tracing::warn!(%pool, worker, %error, "work iteration failed");
                    }
                }
                tracing::debug!(%pool, worker, "worker stopped");
            });
        }

        Ok(WorkerPool {
            name,
            size,
            quit,
            workers: Mutex::new(Some(workers)),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            force_timeout: DEFAULT_FORCE_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_shutdown_timeouts(mut self, drain: Duration, force: Duration) -> Self {
        self.drain_timeout = drain;
        self.force_timeout = force;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shut_down(&self) -> bool {
        self.workers.lock().is_none()
    }

    /// Politely drain, then force. Idempotent; repeated calls return `Ok`
    /// without touching anything.
    ///
    /// Phase 1 stops the workers from picking up further tasks and waits up
    /// to `drain_timeout` for in-flight iterations to finish (the longest
    /// possible innocent delay is one idle sleep). Phase 2 aborts whatever
    /// is left and waits `force_timeout`; a transform that never reaches an
    /// await point cannot be stopped and is reported instead.
    ///
    /// Cancelling the shutdown itself still cancels the workers: the set of
    /// handles has been moved into the returned future, and dropping it
    /// aborts every remaining task.
    pub async fn two_phase_shutdown(&self) -> Result<(), ShutdownError> {
        self.quit.cancel();
        let Some(mut workers) = self.workers.lock().take() else {
            return Ok(());
        };

        if tokio::time::timeout(self.drain_timeout, drain(&mut workers))
            .await
            .is_ok()
        {
            tracing::debug!(pool = %self.name, "drained");
            return Ok(());
        }

        tracing::debug!(pool = %self.name, "drain window elapsed, cancelling in-flight work");
        workers.abort_all();
        if tokio::time::timeout(self.force_timeout, drain(&mut workers))
            .await
            .is_ok()
        {
            return Ok(());
        }

        tracing::error!(pool = %self.name, "did not terminate");
        Err(ShutdownError::DidNotTerminate {
            name: self.name.clone(),
        })
    }
}

async fn drain(workers: &mut JoinSet<()>) {
    while workers.join_next().await.is_some() {}
}

#[async_trait]
impl Shutdown for WorkerPool {
    async fn shutdown(&self) -> Result<(), ShutdownError> {
        self.two_phase_shutdown().await
    }
}
