//! ```text
//! GraphBuilder ─┬─► run_sync ── comp_rewrite ─► mono(x) on the caller's task
//!               │
//!               └─► run_pool ─┬─ queue_rewrite ──► one FIFO per child edge
//!                             ├─ fifo_in / priority_in ──► root ingress (offer)
//!                             ├─ schedule_refill / observer_rewrite (optional)
//!                             └─ add_pool ──► WorkerPool per node
//!                                             │
//!                                             └─► kill_graph (two-phase)
//! ```
//!
//! Ramify is a library for building and executing in-process dataflow trees
//! of concurrent workers. A graph is assembled declaratively through a
//! cursor-backed builder, then lowered into one of two executable forms: a
//! single composed closure (sync mode) or a set of pool-backed nodes joined
//! by queues (pool mode), with priority ingress, scheduled refill, pub/sub
//! fan-out, and orderly two-phase shutdown layered on as rewrites.

pub mod config;
pub mod graphs;
pub mod lowering;
pub mod node;
pub mod pubsub;
pub mod queues;
pub mod types;
pub mod workers;
