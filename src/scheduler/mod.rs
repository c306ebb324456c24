//! The uniform two-operation scheduling contract and its strategy family.
//!
//! Every strategy answers `schedule` and `delay` with a
//! [`CancellationToken`]; an empty task is answered with an already-cancelled
//! token and never runs. `delay` follows one policy everywhere: the timer
//! runs first, and the strategy's deferral primitive fires only after it
//! elapses, so cancelling during the timer means nothing was ever deferred.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::task::{JobOutcome, Task};

pub mod immediate;
pub mod micro;
pub mod pool;
pub mod timeout;

pub use immediate::ImmediateScheduler;
pub use micro::MicroScheduler;
pub use pool::PoolScheduler;
pub use timeout::TimeoutScheduler;

/// The uniform scheduling contract.
pub trait Schedule {
    /// Defer `task` through this strategy's execution context. The returned
    /// token suppresses the task (or, for the pool, its completion callback)
    /// when cancelled before the corresponding stage runs.
    fn schedule(&self, task: Task) -> CancellationToken;

    /// Like [`Schedule::schedule`], after `amount` has elapsed. Cancelling
    /// while the timer is pending stops the task from ever being deferred.
    fn delay(&self, task: Task, amount: Duration) -> CancellationToken;
}

/// One instance of every strategy, selectable by field.
///
/// ```no_run
/// # use taskpool::{Scheduler, Task, scheduler::Schedule};
/// # async fn demo() {
/// let scheduler = Scheduler::new();
/// scheduler.pool.schedule(Task::new(|| println!("on an agent")));
/// scheduler.immediate.schedule(Task::new(|| println!("right here")));
/// # }
/// ```
pub struct Scheduler {
    pub immediate: ImmediateScheduler,
    pub micro: MicroScheduler,
    pub timeout: TimeoutScheduler,
    pub pool: PoolScheduler,
}

impl Scheduler {
    /// Build the family with a default-sized pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            immediate: ImmediateScheduler,
            micro: MicroScheduler,
            timeout: TimeoutScheduler,
            pool: PoolScheduler::new(config),
        }
    }
}

/// Run a task's thunk in place, honoring the token before and after.
///
/// Cancellation observed before the thunk runs suppresses it entirely;
/// observed after, it discards the outcome instead of reporting it.
pub(crate) fn run_task(task: Task, token: &CancellationToken) {
    if token.is_cancelled() {
        return;
    }

    let (work, on_complete) = task.into_parts();
    let Some(work) = work else {
        return;
    };

    let outcome = match work() {
        Ok(()) => JobOutcome::Completed,
        Err(err) => JobOutcome::Failed(err),
    };

    if token.is_cancelled() {
        return;
    }
    match on_complete {
        Some(on_complete) => on_complete(outcome),
        None => {
            if let JobOutcome::Failed(err) = outcome {
                tracing::warn!(error = %err, "unobserved task failed");
            }
        }
    }
}

/// Shared `delay` shape: validate, arm the timer, then hand the task to the
/// strategy's own deferral primitive once the timer elapses.
pub(crate) fn delay_with<F>(task: Task, amount: Duration, defer: F) -> CancellationToken
where
    F: FnOnce(Task, CancellationToken) + Send + 'static,
{
    let token = CancellationToken::new();
    if !task.is_runnable() {
        token.cancel();
        return token;
    }

    let cancelled = token.clone();
    let handoff = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancelled.cancelled() => {
                tracing::trace!("delayed task cancelled before its timer elapsed");
            }
            _ = tokio::time::sleep(amount) => defer(task, handoff),
        }
    });

    token
}
