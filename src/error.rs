use thiserror::Error;

/// Failure reported by an agent for a single job.
///
/// Agents never unwind across the completion channel: a panicking thunk is
/// caught inside the agent thread and reported as [`JobError::Panicked`].
#[derive(Error, Debug)]
pub enum JobError {
    #[error("job failed: {0}")]
    Failed(String),

    #[error("job panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, JobError>;
