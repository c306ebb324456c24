//! Uniform task scheduling with a bounded worker-agent pool.
//!
//! This crate offers one two-operation contract, [`Schedule::schedule`] and
//! [`Schedule::delay`], across four execution contexts:
//!
//! - **Immediate**: synchronously, on the calling thread
//! - **Micro**: on the next runtime poll
//! - **Timeout**: through the runtime's timer, after already-spawned work
//! - **Pool**: on an idle worker agent from a capacity-bounded pool
//!
//! Every call returns a [`CancellationToken`]. Cancelling suppresses work
//! that has not yet run and discards the result of work that has; it never
//! interrupts an agent mid-task.
//!
//! The pool is the interesting part: job ids recycled through a free-list
//! allocator, idle agents reused before new ones are created, a FIFO backlog
//! once the agent cap is reached, and id-correlated completion messages so
//! out-of-order agent replies always reach the right callback.
//!
//! ```no_run
//! use taskpool::{Scheduler, Task, scheduler::Schedule};
//!
//! # async fn demo() {
//! let scheduler = Scheduler::new();
//!
//! let token = scheduler.pool.schedule(
//!     Task::new(|| { /* heavy work, off the control thread */ })
//!         .on_complete(|outcome| println!("pool job {outcome}")),
//! );
//! token.cancel(); // discard the result if it has not been delivered yet
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod scheduler;
pub mod slot;
pub mod task;

pub use config::PoolConfig;
pub use error::JobError;
pub use pool::{PoolDispatcher, PoolStats};
pub use scheduler::{
    ImmediateScheduler, MicroScheduler, PoolScheduler, Schedule, Scheduler, TimeoutScheduler,
};
pub use task::{JobOutcome, Task};

// The cancellation handle handed back by every scheduling call.
pub use tokio_util::sync::CancellationToken;
