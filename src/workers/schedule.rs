//! Fixed-rate scheduled jobs on dedicated tasks.

use crate::node::{Shutdown, ShutdownError};
use crate::queues::QueueError;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use miette::Diagnostic;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Errors a scheduled job may report. The scheduler logs and swallows them;
/// the next tick fires regardless.
#[derive(Debug, Error, Diagnostic)]
pub enum ScheduleError {
    #[error("scheduled job failed: {message}")]
    #[diagnostic(code(ramify::schedule::job))]
    Job { message: String },
}

impl From<QueueError> for ScheduleError {
    fn from(err: QueueError) -> Self {
        ScheduleError::Job {
            message: err.to_string(),
        }
    }
}

/// A boxed periodic job, for [`schedule_all`]'s heterogeneous job lists.
pub type Job = Arc<dyn Fn() -> BoxFuture<'static, Result<(), ScheduleError>> + Send + Sync>;

/// Handle over one or more periodic jobs sharing a cancellation token.
///
/// Dropping the handle does not stop the jobs; call
/// [`shutdown`](Shutdown::shutdown), or let
/// [`kill_graph`](crate::lowering::kill_graph) do it — lowering passes
/// register scheduled workers as shutdown actions on the nodes they serve.
pub struct ScheduledWorker {
    name: String,
    quit: CancellationToken,
    tasks: Mutex<Option<JoinSet<()>>>,
}

impl ScheduledWorker {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Run `job` every `period` at a fixed rate, starting one period from now.
/// Job errors are logged and swallowed.
pub fn schedule_work<F, Fut>(name: impl Into<String>, job: F, period: Duration) -> ScheduledWorker
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ScheduleError>> + Send + 'static,
{
    let job: Job = Arc::new(move || Box::pin(job()));
    schedule_all(name, vec![(job, period)])
}

/// Run several `(job, period)` pairs under a single handle.
pub fn schedule_all(name: impl Into<String>, jobs: Vec<(Job, Duration)>) -> ScheduledWorker {
    let name = name.into();
    let quit = CancellationToken::new();
    let mut tasks = JoinSet::new();

    for (index, (job, period)) in jobs.into_iter().enumerate() {
        let quit = quit.clone();
        let scheduler = name.clone();
        tasks.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = quit.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(error) = job().await {
                            tracing::warn!(%scheduler, job = index, %error, "scheduled job failed");
                        }
                    }
                }
            }
        });
    }

    ScheduledWorker {
        name,
        quit,
        tasks: Mutex::new(Some(tasks)),
    }
}

#[async_trait]
impl Shutdown for ScheduledWorker {
    async fn shutdown(&self) -> Result<(), ShutdownError> {
        self.quit.cancel();
        let Some(mut tasks) = self.tasks.lock().take() else {
            return Ok(());
        };
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        tracing::debug!(scheduler = %self.name, "stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fires_repeatedly_at_the_given_rate() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let worker = schedule_work(
            "ticker",
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            Duration::from_millis(20),
        );

        tokio::time::sleep(Duration::from_millis(130)).await;
        worker.shutdown().await.unwrap();
        let seen = ticks.load(Ordering::SeqCst);
        assert!((3..=8).contains(&seen), "saw {seen} ticks");

        // No further ticks after shutdown.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn job_errors_do_not_stop_the_schedule() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let worker = schedule_work(
            "flaky",
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ScheduleError::Job {
                        message: "synthetic".into(),
                    })
                }
            },
            Duration::from_millis(15),
        );

        tokio::time::sleep(Duration::from_millis(80)).await;
        worker.shutdown().await.unwrap();
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn schedule_all_groups_jobs_under_one_handle() {
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));
        let fast_job: Job = {
            let fast = fast.clone();
            Arc::new(move || {
                let fast = fast.clone();
                Box::pin(async move {
                    fast.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
        };
        let slow_job: Job = {
            let slow = slow.clone();
            Arc::new(move || {
                let slow = slow.clone();
                Box::pin(async move {
                    slow.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
        };

        let worker = schedule_all(
            "pair",
            vec![
                (fast_job, Duration::from_millis(10)),
                (slow_job, Duration::from_millis(40)),
            ],
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        worker.shutdown().await.unwrap();

        assert!(fast.load(Ordering::SeqCst) > slow.load(Ordering::SeqCst));
        assert!(slow.load(Ordering::SeqCst) >= 1);
    }
}
