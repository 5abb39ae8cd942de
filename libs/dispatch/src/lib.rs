//! Greedy earliest-release task allocation.
//!
//! This library assigns a fixed pool of interchangeable workers to a stream
//! of time-stamped tasks. Tasks are processed in arrival order; each task is
//! served by the worker that has been idle longest, or left unassigned when
//! every worker is occupied. Key concepts:
//!
//! - **Idle pool**: FIFO sequence of workers with no current task.
//! - **Busy set**: min-ordered set of occupied workers, keyed by the tick at
//!   which each becomes free again (ties broken by worker id).
//! - **Release sweep**: before each task is considered, every worker whose
//!   release tick has passed is returned to the idle pool in release order.
//!
//! # Invariants
//!
//! - Decisions are deterministic given the same inputs
//! - A worker is in exactly one of the idle pool or the busy set
//! - Exactly one outcome is produced per task, in input order
//! - Past assignments are never revisited

mod engine;
mod error;
mod pool;
mod task;

pub use engine::allocate;
pub use error::DispatchError;
pub use pool::{BusySet, IdlePool};
pub use task::{Outcome, Task, WorkerId};
