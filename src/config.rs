/// Hard cap on the number of agents a pool may ever create.
pub const MAX_AGENTS: usize = 256;

/// Agents pre-created at startup when hardware parallelism is unknown.
pub const FALLBACK_AGENTS: usize = 4;

/// Configuration for the worker-agent pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Agents created eagerly when the pool starts.
    pub initial_agents: usize,
    /// Maximum agents the pool may grow to. Beyond this, jobs queue.
    pub max_agents: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let initial = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_AGENTS);

        Self {
            initial_agents: initial.min(MAX_AGENTS),
            max_agents: MAX_AGENTS,
        }
    }
}

impl PoolConfig {
    pub fn new(initial_agents: usize, max_agents: usize) -> Self {
        Self {
            initial_agents,
            max_agents,
        }
    }

    pub fn with_max_agents(mut self, max_agents: usize) -> Self {
        self.max_agents = max_agents;
        self
    }

    pub fn with_initial_agents(mut self, initial_agents: usize) -> Self {
        self.initial_agents = initial_agents;
        self
    }

    /// Clamp the configuration into a usable shape: at least one agent
    /// allowed, and never more pre-created agents than the cap.
    pub(crate) fn normalized(mut self) -> Self {
        self.max_agents = self.max_agents.max(1);
        self.initial_agents = self.initial_agents.min(self.max_agents);
        self
    }
}
