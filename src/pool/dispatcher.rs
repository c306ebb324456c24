use std::collections::VecDeque;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::pool::agent::{spawn_agent, AgentHandle, AgentReply, AgentRequest};
use crate::slot::SlotAllocator;
use crate::task::{CompletionCallback, JobOutcome, Task, Thunk};

/// One live job, owned by the control loop from submit until completion or
/// cancellation. `work` is taken when the job is handed to an agent; the
/// callback and token stay behind so the completion message can be resolved.
struct JobEntry {
    work: Option<Thunk>,
    on_complete: Option<CompletionCallback>,
    token: CancellationToken,
}

enum Command {
    Submit {
        work: Thunk,
        on_complete: Option<CompletionCallback>,
        token: CancellationToken,
    },
    Stats {
        reply: oneshot::Sender<PoolStats>,
    },
}

/// Point-in-time view of the pool, answered by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Agents created so far (never shrinks while the pool is alive).
    pub agents: usize,
    /// Agents currently idle.
    pub idle: usize,
    /// Job ids waiting for an agent.
    pub queued: usize,
}

/// Cloneable submission handle to a running pool.
///
/// `submit` never blocks: commands travel over an unbounded channel to a
/// single control-loop task that owns all bookkeeping (slot table, job queue,
/// idle set), so no locking is involved anywhere. Jobs beyond the agent cap
/// queue without bound; sustained submission above agent throughput grows the
/// queue indefinitely.
///
/// When the last handle is dropped the loop finishes in-flight work, then
/// stops and lets its agent threads exit.
#[derive(Debug, Clone)]
pub struct PoolDispatcher {
    commands: mpsc::UnboundedSender<Command>,
}

impl PoolDispatcher {
    /// Start a pool with its own control loop and eagerly created agents.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: PoolConfig) -> Self {
        let config = config.normalized();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        let state = PoolState {
            config,
            slots: SlotAllocator::new(),
            jobs: Vec::new(),
            queue: VecDeque::new(),
            agents: Vec::new(),
            idle: VecDeque::new(),
            completions: reply_tx,
        };

        tokio::spawn(state.run(cmd_rx, reply_rx));

        Self { commands: cmd_tx }
    }

    /// Submit a task for execution on an agent.
    ///
    /// Returns a token that suppresses the completion callback when cancelled.
    /// Cancelling before the job reaches an agent also prevents the thunk
    /// from running; cancelling afterwards cannot interrupt the agent, only
    /// discard the result. An empty task yields an already-cancelled token.
    pub fn submit(&self, task: Task) -> CancellationToken {
        let token = CancellationToken::new();
        self.submit_with_token(task, token.clone());
        token
    }

    /// Submit under a caller-provided token; used by the delayed path so the
    /// timer and the pool share one cancellation handle.
    pub(crate) fn submit_with_token(&self, task: Task, token: CancellationToken) {
        let (work, on_complete) = task.into_parts();

        let Some(work) = work else {
            token.cancel();
            return;
        };

        let command = Command::Submit {
            work,
            on_complete,
            token: token.clone(),
        };
        if self.commands.send(command).is_err() {
            tracing::warn!("pool dispatcher stopped; submission dropped");
            token.cancel();
        }
    }

    /// Snapshot the pool's bookkeeping. `None` if the pool has stopped.
    pub async fn stats(&self) -> Option<PoolStats> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Stats { reply: tx }).ok()?;
        rx.await.ok()
    }
}

/// Bookkeeping owned by the control loop. Agents never touch this state;
/// they only emit completion messages, which the loop processes one at a
/// time, so every access is serialized by construction.
struct PoolState {
    config: PoolConfig,
    slots: SlotAllocator,
    jobs: Vec<Option<JobEntry>>,
    queue: VecDeque<usize>,
    agents: Vec<AgentHandle>,
    idle: VecDeque<usize>,
    completions: mpsc::UnboundedSender<AgentReply>,
}

impl PoolState {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut replies: mpsc::UnboundedReceiver<AgentReply>,
    ) {
        for _ in 0..self.config.initial_agents {
            let agent_id = self.create_agent();
            self.idle.push_back(agent_id);
        }
        tracing::debug!(
            agents = self.agents.len(),
            max = self.config.max_agents,
            "pool dispatcher started"
        );

        let mut closed = false;
        loop {
            if closed && self.busy() == 0 && self.queue.is_empty() {
                break;
            }

            tokio::select! {
                Some(reply) = replies.recv() => self.handle_completion(reply),
                command = commands.recv(), if !closed => match command {
                    Some(Command::Submit { work, on_complete, token }) => {
                        self.handle_submit(work, on_complete, token);
                    }
                    Some(Command::Stats { reply }) => {
                        let _ = reply.send(self.stats());
                    }
                    None => closed = true,
                },
            }
        }

        tracing::debug!("pool dispatcher stopped");
    }

    fn handle_submit(
        &mut self,
        work: Thunk,
        on_complete: Option<CompletionCallback>,
        token: CancellationToken,
    ) {
        if token.is_cancelled() {
            tracing::trace!("submission cancelled before processing");
            return;
        }

        let job_id = self.slots.allocate();
        if job_id >= self.jobs.len() {
            self.jobs.resize_with(job_id + 1, || None);
        }
        self.jobs[job_id] = Some(JobEntry {
            work: Some(work),
            on_complete,
            token,
        });
        self.queue.push_back(job_id);
        tracing::debug!(job_id, "job submitted");

        if let Some(agent_id) = self.idle.pop_front() {
            self.drain_queue_into(agent_id);
        } else if self.agents.len() < self.config.max_agents {
            let agent_id = self.create_agent();
            self.drain_queue_into(agent_id);
        } else {
            tracing::trace!(
                job_id,
                queued = self.queue.len(),
                "all agents busy at cap; job queued"
            );
        }
    }

    fn handle_completion(&mut self, reply: AgentReply) {
        let AgentReply {
            agent_id,
            job_id,
            outcome,
        } = reply;

        // The entry-present + token check here is the single source of truth
        // for the cancel/completion race.
        if let Some(entry) = self.jobs.get_mut(job_id).and_then(Option::take) {
            if entry.token.is_cancelled() {
                tracing::debug!(job_id, "result discarded for cancelled job");
            } else {
                match entry.on_complete {
                    Some(on_complete) => on_complete(outcome),
                    None => {
                        if let JobOutcome::Failed(err) = outcome {
                            tracing::warn!(job_id, error = %err, "unobserved job failed");
                        }
                    }
                }
            }
            self.slots.deallocate(job_id);
        }

        self.drain_queue_into(agent_id);
    }

    /// Feed the next dispatchable queued job to `agent_id`, skipping entries
    /// cancelled (or cleared) while they waited; park the agent as idle when
    /// the queue holds nothing dispatchable.
    fn drain_queue_into(&mut self, agent_id: usize) {
        while let Some(job_id) = self.queue.pop_front() {
            let Some(work) = self.take_dispatchable_work(job_id) else {
                continue;
            };

            if self.agents[agent_id].dispatch(AgentRequest { job_id, work }) {
                tracing::trace!(job_id, agent_id, "job dispatched");
            } else {
                // Only reachable while the pool is tearing down.
                tracing::warn!(job_id, agent_id, "agent unavailable; job dropped");
                self.jobs[job_id] = None;
                self.slots.deallocate(job_id);
            }
            return;
        }

        self.idle.push_back(agent_id);
    }

    /// Pull the thunk out of a queued job, clearing and reclaiming the slot
    /// instead when the job was cancelled while it waited. A stale callback
    /// is never dispatched.
    fn take_dispatchable_work(&mut self, job_id: usize) -> Option<Thunk> {
        let slot = self.jobs.get_mut(job_id)?;
        let entry = slot.as_mut()?;

        if entry.token.is_cancelled() {
            *slot = None;
            self.slots.deallocate(job_id);
            tracing::debug!(job_id, "queued job cancelled; skipped");
            return None;
        }

        let work = entry.work.take();
        if work.is_none() {
            *slot = None;
            self.slots.deallocate(job_id);
        }
        work
    }

    fn create_agent(&mut self) -> usize {
        let agent_id = self.agents.len();
        self.agents.push(spawn_agent(agent_id, self.completions.clone()));
        tracing::debug!(agent_id, total = self.agents.len(), "agent created");
        agent_id
    }

    fn busy(&self) -> usize {
        self.agents.len() - self.idle.len()
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            agents: self.agents.len(),
            idle: self.idle.len(),
            queued: self.queue.len(),
        }
    }
}
