use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scheduler::{delay_with, run_task, Schedule};
use crate::task::Task;

/// Defers tasks to the next runtime poll, the microtask analog.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroScheduler;

impl Schedule for MicroScheduler {
    fn schedule(&self, task: Task) -> CancellationToken {
        let token = CancellationToken::new();
        if !task.is_runnable() {
            token.cancel();
            return token;
        }

        let run = token.clone();
        tokio::spawn(async move { run_task(task, &run) });
        token
    }

    fn delay(&self, task: Task, amount: Duration) -> CancellationToken {
        delay_with(task, amount, |task, token| {
            tokio::spawn(async move { run_task(task, &token) });
        })
    }
}
