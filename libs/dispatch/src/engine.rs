//! The allocation loop.

use tracing::debug;

use crate::error::DispatchError;
use crate::pool::{BusySet, IdlePool};
use crate::task::{Outcome, Task, WorkerId};

/// Assigns workers to tasks in arrival order.
///
/// Tasks are processed in ascending arrival order, stable with respect to
/// input order among equal arrivals. Before each task is considered, every
/// occupied worker whose release tick is at or before the task's arrival is
/// swept back into the idle pool in release order; the task then draws the
/// longest-idle worker, or stays unassigned when the pool is empty.
///
/// A worker finishing a zero-duration task is only re-admitted during a
/// later task's sweep, so it can serve a second task at the same arrival
/// tick but never the task that is currently being decided.
///
/// Returns one [`Outcome`] per input task, in input order. The run is
/// rejected wholesale if any task carries a negative duration.
pub fn allocate(tasks: &[Task], worker_count: u32) -> Result<Vec<Outcome>, DispatchError> {
    if let Some((index, task)) = tasks.iter().enumerate().find(|(_, t)| t.duration < 0) {
        return Err(DispatchError::NegativeDuration {
            index,
            duration: task.duration,
        });
    }

    // Stable sort over input indices keeps equal arrivals in input order.
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by_key(|&index| tasks[index].arrival_at);

    let mut idle = IdlePool::seed(worker_count);
    let mut busy = BusySet::new();
    let mut outcomes = vec![Outcome::Unassigned; tasks.len()];

    for &index in &order {
        let task = &tasks[index];

        while let Some(worker) = busy.release_due(task.arrival_at) {
            debug!(worker = %worker, now = task.arrival_at, "worker released");
            idle.admit(worker);
        }

        match idle.draw() {
            Some(worker) => {
                let release_at = task.release_at();
                busy.occupy(worker, release_at);
                debug!(task = index, worker = %worker, release_at, "task assigned");
                outcomes[index] = Outcome::Assigned(worker);
            }
            None => {
                debug!(task = index, arrival_at = task.arrival_at, "no idle worker");
            }
        }
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn tasks(specs: &[(i64, i64)]) -> Vec<Task> {
        specs
            .iter()
            .map(|&(arrival_at, duration)| Task {
                arrival_at,
                duration,
            })
            .collect()
    }

    fn assigned(id: u32) -> Outcome {
        Outcome::Assigned(WorkerId::new(id))
    }

    #[rstest]
    #[case::both_workers_taken(2, &[(0, 5), (1, 3), (2, 2)], &[Some(1), Some(2), None])]
    #[case::released_exactly_on_arrival(1, &[(0, 2), (2, 3)], &[Some(1), Some(1)])]
    #[case::still_busy_on_arrival(1, &[(0, 2), (1, 1)], &[Some(1), None])]
    #[case::lowest_id_first_on_equal_arrivals(2, &[(0, 10), (0, 10), (5, 1)], &[Some(1), Some(2), None])]
    #[case::zero_duration_frees_for_the_same_tick(1, &[(5, 0), (5, 0)], &[Some(1), Some(1)])]
    fn greedy_matching(
        #[case] workers: u32,
        #[case] specs: &[(i64, i64)],
        #[case] expected: &[Option<u32>],
    ) {
        let outcomes = allocate(&tasks(specs), workers).unwrap();
        let expected: Vec<Outcome> = expected
            .iter()
            .map(|worker| match worker {
                Some(id) => assigned(*id),
                None => Outcome::Unassigned,
            })
            .collect();
        assert_eq!(outcomes, expected);
    }

    #[test]
    fn outcomes_follow_input_order_not_arrival_order() {
        // Same schedule as the two-worker case above, supplied out of
        // arrival order.
        let outcomes = allocate(&tasks(&[(2, 2), (0, 5), (1, 3)]), 2).unwrap();
        assert_eq!(outcomes, vec![Outcome::Unassigned, assigned(1), assigned(2)]);
    }

    #[test]
    fn released_workers_requeue_behind_never_assigned_ones() {
        // Worker 1 frees at tick 1 while workers 2 and 3 are still waiting;
        // the tick-2 tasks must drain 2 and 3 before 1 comes around again.
        let outcomes = allocate(&tasks(&[(0, 1), (2, 5), (2, 5), (2, 5)]), 3).unwrap();
        assert_eq!(
            outcomes,
            vec![assigned(1), assigned(2), assigned(3), assigned(1)]
        );
    }

    #[test]
    fn no_workers_leaves_every_task_unassigned() {
        let outcomes = allocate(&tasks(&[(0, 1), (3, 2), (9, 0)]), 0).unwrap();
        assert!(outcomes.iter().all(|o| *o == Outcome::Unassigned));
    }

    #[test]
    fn empty_task_list_yields_empty_outcomes() {
        assert_eq!(allocate(&[], 4).unwrap(), Vec::new());
    }

    #[test]
    fn negative_duration_rejects_the_whole_run() {
        let err = allocate(&tasks(&[(0, 1), (1, -2)]), 3).unwrap_err();
        assert_eq!(
            err,
            DispatchError::NegativeDuration {
                index: 1,
                duration: -2
            }
        );
    }

    fn any_tasks() -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec(
            (0i64..100, 0i64..20).prop_map(|(arrival_at, duration)| Task {
                arrival_at,
                duration,
            }),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn identical_inputs_yield_identical_outcomes(
            tasks in any_tasks(),
            workers in 0u32..6,
        ) {
            prop_assert_eq!(
                allocate(&tasks, workers).unwrap(),
                allocate(&tasks, workers).unwrap()
            );
        }

        #[test]
        fn one_outcome_per_task(tasks in any_tasks(), workers in 0u32..6) {
            prop_assert_eq!(allocate(&tasks, workers).unwrap().len(), tasks.len());
        }

        #[test]
        fn concurrent_load_never_exceeds_the_fleet(
            tasks in any_tasks(),
            workers in 0u32..6,
        ) {
            let outcomes = allocate(&tasks, workers).unwrap();

            // +1 at assignment, -1 at release; releases sort ahead of
            // assignments on the same tick, matching sweep-then-assign.
            let mut events: Vec<(i64, i32)> = Vec::new();
            for (task, outcome) in tasks.iter().zip(&outcomes) {
                if outcome.is_assigned() {
                    events.push((task.arrival_at, 1));
                    events.push((task.release_at(), -1));
                }
            }
            events.sort_unstable();

            let mut held = 0i64;
            for (_, delta) in events {
                held += i64::from(delta);
                prop_assert!(held <= i64::from(workers));
            }
        }

        #[test]
        fn no_worker_serves_overlapping_tasks(
            tasks in any_tasks(),
            workers in 1u32..6,
        ) {
            let outcomes = allocate(&tasks, workers).unwrap();

            let mut by_worker: BTreeMap<WorkerId, Vec<(i64, i64)>> = BTreeMap::new();
            for (task, outcome) in tasks.iter().zip(&outcomes) {
                if let Outcome::Assigned(worker) = outcome {
                    by_worker
                        .entry(*worker)
                        .or_default()
                        .push((task.arrival_at, task.release_at()));
                }
            }

            for intervals in by_worker.values_mut() {
                intervals.sort_unstable();
                for pair in intervals.windows(2) {
                    prop_assert!(pair[1].0 >= pair[0].1);
                }
            }
        }
    }
}
