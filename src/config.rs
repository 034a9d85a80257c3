//! Runtime configuration for lowering and execution.
//!
//! [`RunConfig`] gathers the knobs the pool-mode lowering passes consult:
//! per-node pool sizes, the worker idle sleep, the two shutdown windows, and
//! the priority-ingress bound. Defaults match the documented contract (5 s
//! idle, 60 s + 60 s shutdown, capacity 200) and can be tightened in tests.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Worker sleep after an empty poll.
pub const DEFAULT_IDLE: Duration = Duration::from_secs(5);

/// Phase-one shutdown window: let in-flight work drain.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Phase-two shutdown window: wait after cancelling in-flight work.
pub const DEFAULT_FORCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound of the priority ingress queue.
pub const DEFAULT_PRIORITY_CAPACITY: usize = 200;

/// Configuration consumed by [`add_pool`](crate::lowering::add_pool) and
/// friends.
///
/// # Examples
///
/// ```rust
/// use ramify::config::RunConfig;
/// use std::time::Duration;
///
/// // Tight timings for a test run.
/// let config = RunConfig::default()
///     .with_default_threads(1)
///     .with_idle(Duration::from_millis(10));
/// assert_eq!(config.default_threads, 1);
/// ```
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Pool size for nodes that do not set `threads`. Defaults to the host
    /// CPU count, overridable through `RAMIFY_DEFAULT_THREADS`.
    pub default_threads: usize,
    /// How long a worker sleeps when its input poll comes back empty.
    pub idle: Duration,
    /// Phase-one shutdown window.
    pub drain_timeout: Duration,
    /// Phase-two shutdown window.
    pub force_timeout: Duration,
    /// Capacity of a priority ingress installed by
    /// [`priority_in`](crate::lowering::priority_in).
    pub priority_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RunConfig {
    /// A config with an explicit pool-size override. `None` resolves the
    /// default from `RAMIFY_DEFAULT_THREADS`, falling back to the host CPU
    /// count.
    pub fn new(default_threads: Option<usize>) -> Self {
        Self {
            default_threads: resolve_default_threads(default_threads),
            idle: DEFAULT_IDLE,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            force_timeout: DEFAULT_FORCE_TIMEOUT,
            priority_capacity: DEFAULT_PRIORITY_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_default_threads(mut self, threads: usize) -> Self {
        self.default_threads = threads;
        self
    }

    #[must_use]
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeouts(mut self, drain: Duration, force: Duration) -> Self {
        self.drain_timeout = drain;
        self.force_timeout = force;
        self
    }

    #[must_use]
    pub fn with_priority_capacity(mut self, capacity: usize) -> Self {
        self.priority_capacity = capacity;
        self
    }
}

fn resolve_default_threads(provided: Option<usize>) -> usize {
    if let Some(threads) = provided {
        return threads;
    }
    dotenvy::dotenv().ok();
    std::env::var("RAMIFY_DEFAULT_THREADS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .filter(|&threads| threads > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
}
