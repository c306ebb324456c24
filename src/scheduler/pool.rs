use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::pool::PoolDispatcher;
use crate::scheduler::{delay_with, Schedule};
use crate::task::Task;

/// Defers tasks onto an idle agent from the worker pool.
///
/// Execution order across pool tasks is not guaranteed: agents finish at
/// their own pace, so completion callbacks may fire out of submission order.
/// Cancelling a token after its job reached an agent cannot interrupt the
/// agent; it discards the result instead.
pub struct PoolScheduler {
    dispatcher: PoolDispatcher,
}

impl PoolScheduler {
    /// Start a pool of this scheduler's own. Must be called from within a
    /// tokio runtime.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            dispatcher: PoolDispatcher::new(config),
        }
    }

    /// The underlying dispatcher, for direct submission or stats.
    pub fn dispatcher(&self) -> &PoolDispatcher {
        &self.dispatcher
    }
}

impl Schedule for PoolScheduler {
    fn schedule(&self, task: Task) -> CancellationToken {
        self.dispatcher.submit(task)
    }

    fn delay(&self, task: Task, amount: Duration) -> CancellationToken {
        let dispatcher = self.dispatcher.clone();
        delay_with(task, amount, move |task, token| {
            dispatcher.submit_with_token(task, token);
        })
    }
}
