use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::JobError;
use crate::task::{JobOutcome, Thunk};

/// Work handed to an agent: the thunk plus the id to echo back.
pub struct AgentRequest {
    pub job_id: usize,
    pub work: Thunk,
}

/// Completion message emitted by an agent.
///
/// Carries ids only, never the callback: the dispatcher looks the job up by
/// id because replies from different agents arrive in arbitrary order.
#[derive(Debug)]
pub struct AgentReply {
    pub agent_id: usize,
    pub job_id: usize,
    pub outcome: JobOutcome,
}

/// Dispatcher-side handle to one agent thread.
///
/// Agents are created lazily up to the pool cap and reused for the lifetime
/// of the pool; spinning up a thread is the expensive part being amortized.
/// Dropping the handle closes the request channel and lets the thread exit.
#[derive(Debug)]
pub struct AgentHandle {
    pub id: usize,
    requests: mpsc::Sender<AgentRequest>,
}

impl AgentHandle {
    /// Hand a job to this agent. Returns `false` if the agent thread is gone,
    /// which only happens while the pool itself is tearing down.
    pub fn dispatch(&self, request: AgentRequest) -> bool {
        self.requests.send(request).is_ok()
    }
}

/// Spawn one agent thread.
///
/// The agent blocks on its private request channel, runs each thunk, and
/// reports the outcome on the shared completion channel. Panics are caught
/// inside the thread and reported as a failed outcome; nothing unwinds
/// across the channel.
pub fn spawn_agent(id: usize, completions: UnboundedSender<AgentReply>) -> AgentHandle {
    let (tx, rx) = mpsc::channel::<AgentRequest>();

    let builder = thread::Builder::new().name(format!("taskpool-agent-{id}"));
    builder
        .spawn(move || {
            tracing::debug!(agent_id = id, "agent started");

            while let Ok(request) = rx.recv() {
                let job_id = request.job_id;
                let outcome = run_caught(request.work);

                tracing::trace!(agent_id = id, job_id, outcome = %outcome, "job finished");

                if completions
                    .send(AgentReply {
                        agent_id: id,
                        job_id,
                        outcome,
                    })
                    .is_err()
                {
                    break;
                }
            }

            tracing::debug!(agent_id = id, "agent stopped");
        })
        .expect("failed to spawn agent thread");

    AgentHandle { id, requests: tx }
}

fn run_caught(work: Thunk) -> JobOutcome {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(())) => JobOutcome::Completed,
        Ok(Err(err)) => JobOutcome::Failed(err),
        Err(payload) => JobOutcome::Failed(JobError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
