//! Allocation error types.

use thiserror::Error;

/// Errors that reject an allocation run.
///
/// Only malformed input is an error. Zero workers, zero tasks, or a fleet
/// that stays occupied for the whole run are all valid inputs that yield
/// `Unassigned` outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A task carried a negative handling duration.
    ///
    /// The index refers to the task's position in the input sequence. The
    /// whole run is rejected; no partial outcome list is produced.
    #[error("task {index} has negative duration {duration}")]
    NegativeDuration { index: usize, duration: i64 },
}
