//! The worker engine: fixed-size pools, the generic worker loop, scheduled
//! periodic jobs, two-phase shutdown, and batch convenience ops.
//!
//! Pool mode drives every node with the same loop
//! ([`work`]): fetch the current [`WorkUnit`] from the scheduler, poll the
//! input, execute or yield. Pools never block on a take, so shutdown only
//! ever has to interrupt a sleep, not a blocked receive.

mod ops;
mod pool;
mod schedule;
mod worker;

pub use ops::{do_work, filter_work, map_work, reduce_work, seq_work, Workers};
pub use pool::{PoolError, WorkerPool};
pub use schedule::{schedule_all, schedule_work, Job, ScheduleError, ScheduledWorker};
pub use worker::{work, ExecStrategy, UnitScheduler, WorkUnit};
