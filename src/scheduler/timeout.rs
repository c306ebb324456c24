use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scheduler::{delay_with, run_task, Schedule};
use crate::task::Task;

/// Defers tasks through a zero-duration timer, the macrotask analog.
///
/// A zero sleep goes through the runtime's timer wheel, so these tasks run
/// after already-spawned work, the way `setTimeout(fn, 0)` trails microtasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Schedule for TimeoutScheduler {
    fn schedule(&self, task: Task) -> CancellationToken {
        let token = CancellationToken::new();
        if !task.is_runnable() {
            token.cancel();
            return token;
        }

        let run = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::ZERO).await;
            run_task(task, &run);
        });
        token
    }

    fn delay(&self, task: Task, amount: Duration) -> CancellationToken {
        delay_with(task, amount, |task, token| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::ZERO).await;
                run_task(task, &token);
            });
        })
    }
}
