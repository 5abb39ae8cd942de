//! Task and outcome types exchanged with adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unit of work with an arrival time and a handling duration.
///
/// Times are integer ticks on a caller-defined clock. Arrival ticks need
/// not be unique or sorted; the engine establishes arrival order itself.
/// Durations must be non-negative, which is validated at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Tick at which the task becomes known.
    pub arrival_at: i64,

    /// Ticks the assigned worker stays occupied.
    pub duration: i64,
}

impl Task {
    /// Tick at which a worker picking this task up becomes free again.
    pub fn release_at(&self) -> i64 {
        self.arrival_at + self.duration
    }
}

/// A worker identifier, dense in `1..=worker_count` for a given run.
///
/// Typed so worker ids cannot be mixed up with task indices. Adapters that
/// track workers under their own identifiers map them onto these dense ids
/// before a run and back afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorkerId(u32);

impl WorkerId {
    /// Creates a worker id from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-task decision produced by [`allocate`](crate::allocate).
///
/// Exactly one outcome is produced per input task, and it is never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "worker")]
pub enum Outcome {
    /// The task is served by the given worker.
    Assigned(WorkerId),

    /// Every worker was occupied at the task's arrival.
    Unassigned,
}

impl Outcome {
    /// Returns the serving worker, if the task was assigned.
    pub fn worker(&self) -> Option<WorkerId> {
        match self {
            Self::Assigned(worker) => Some(*worker),
            Self::Unassigned => None,
        }
    }

    /// Returns true if the task found a worker.
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_json_carries_status_and_worker() {
        let json = serde_json::to_value(Outcome::Assigned(WorkerId::new(2))).unwrap();
        assert_eq!(json, serde_json::json!({"status": "assigned", "worker": 2}));

        let json = serde_json::to_value(Outcome::Unassigned).unwrap();
        assert_eq!(json, serde_json::json!({"status": "unassigned"}));
    }

    #[test]
    fn release_tick_is_arrival_plus_duration() {
        let task = Task {
            arrival_at: 3,
            duration: 4,
        };
        assert_eq!(task.release_at(), 7);
    }
}
