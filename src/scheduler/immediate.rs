use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scheduler::{delay_with, run_task, Schedule};
use crate::task::Task;

/// Runs tasks synchronously on the calling thread.
///
/// `schedule` executes the task before returning, so the token is only
/// useful to observe; delayed tasks remain cancellable until the timer
/// elapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Schedule for ImmediateScheduler {
    fn schedule(&self, task: Task) -> CancellationToken {
        let token = CancellationToken::new();
        if !task.is_runnable() {
            token.cancel();
            return token;
        }
        run_task(task, &token);
        token
    }

    fn delay(&self, task: Task, amount: Duration) -> CancellationToken {
        delay_with(task, amount, |task, token| run_task(task, &token))
    }
}
