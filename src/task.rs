use crate::error::JobError;

/// The unit of work an agent executes.
pub type Thunk = Box<dyn FnOnce() -> Result<(), JobError> + Send + 'static>;

/// Completion observer invoked on the control loop, at most once.
pub type CompletionCallback = Box<dyn FnOnce(JobOutcome) + Send + 'static>;

/// How a dispatched job ended. A cancelled job produces no outcome at all:
/// its completion callback is simply never invoked.
#[derive(Debug)]
pub enum JobOutcome {
    Completed,
    Failed(JobError),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobOutcome::Completed => write!(f, "completed"),
            JobOutcome::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// A schedulable unit of work.
///
/// A task built from a closure always carries work. [`Task::empty`] is the
/// non-invocable sentinel: every strategy answers it with an already-cancelled
/// token and performs no submission.
pub struct Task {
    work: Option<Thunk>,
    on_complete: Option<CompletionCallback>,
}

impl Task {
    /// A task from an infallible closure.
    pub fn new(work: impl FnOnce() + Send + 'static) -> Self {
        Self::fallible(move || {
            work();
            Ok(())
        })
    }

    /// A task whose closure may report failure.
    pub fn fallible(work: impl FnOnce() -> Result<(), JobError> + Send + 'static) -> Self {
        Self {
            work: Some(Box::new(work)),
            on_complete: None,
        }
    }

    /// A task with no work attached. Scheduling it is rejected synchronously.
    pub fn empty() -> Self {
        Self {
            work: None,
            on_complete: None,
        }
    }

    /// Attach a completion observer. It fires at most once, on the control
    /// loop, with the job's outcome; it never fires for a cancelled job.
    pub fn on_complete(mut self, callback: impl FnOnce(JobOutcome) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn is_runnable(&self) -> bool {
        self.work.is_some()
    }

    pub(crate) fn into_parts(self) -> (Option<Thunk>, Option<CompletionCallback>) {
        (self.work, self.on_complete)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("runnable", &self.work.is_some())
            .field("observed", &self.on_complete.is_some())
            .finish()
    }
}
