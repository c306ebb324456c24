//! Worker-agent pool: the one scheduling strategy with real bookkeeping.
//!
//! - [`agent`]: independent worker threads exchanging id-correlated
//!   request/completion messages with the dispatcher.
//! - [`dispatcher`]: the control loop owning the slot table, job queue and
//!   idle set, plus the cloneable [`PoolDispatcher`] submission handle.
//!
//! # Dispatch flow
//!
//! 1. `submit` allocates a job id, records the entry, queues the id
//! 2. An idle agent is reused if one exists; a new agent is created while the
//!    pool is under its cap; otherwise the id waits in the FIFO queue
//! 3. The agent runs the thunk out of band and reports completion by id
//! 4. The dispatcher invokes the stored callback (unless cancelled), reclaims
//!    the id, and drains the queue into the now-free agent
//!
//! Completion order across agents is arbitrary; correlation is by id only.

pub mod agent;
pub mod dispatcher;

pub use dispatcher::{PoolDispatcher, PoolStats};
