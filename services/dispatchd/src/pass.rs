//! The dispatch pass.
//!
//! A pass loads the workers currently marked free and the tasks still
//! pending, feeds them through the allocation engine, and records each
//! task's outcome in the store:
//! - assigned tasks get their worker id, and the worker turns busy with the
//!   tick it frees up again
//! - unserved tasks are marked as such and never retried
//!
//! Persistent worker ids are translated to the dense ids the engine expects
//! and back. Outcomes are applied one per task, in order; a failed write is
//! logged and counted but never aborts the rest of the pass.

use chrono::Utc;
use fleet_dispatch::{allocate, Outcome, Task, WorkerId};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

/// Result type for dispatch pass operations.
pub type PassResult<T> = Result<T, PassError>;

/// Errors that can occur during a dispatch pass.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("allocation rejected: {0}")]
    Allocation(#[from] fleet_dispatch::DispatchError),

    #[error("free worker count {0} exceeds the supported fleet size")]
    FleetTooLarge(usize),

    #[error("allocation produced unknown worker id {0}")]
    UnknownWorker(WorkerId),
}

#[derive(Debug)]
struct FreeWorkerRow {
    worker_id: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for FreeWorkerRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            worker_id: row.try_get("worker_id")?,
        })
    }
}

#[derive(Debug)]
struct PendingTaskRow {
    task_id: i64,
    arrival_at: i64,
    duration: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for PendingTaskRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            task_id: row.try_get("task_id")?,
            arrival_at: row.try_get("arrival_at")?,
            duration: row.try_get("duration")?,
        })
    }
}

/// Counters reported by a single pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassStats {
    pub tasks_processed: u64,
    pub tasks_assigned: u64,
    pub tasks_unserved: u64,
    pub writes_failed: u64,
}

/// Maps the engine's dense worker ids onto persistent store ids.
///
/// The engine numbers the fleet `1..=M`; position `i` in the roster holds
/// the persistent id behind dense id `i + 1`.
#[derive(Debug)]
struct FleetRoster {
    persistent: Vec<i64>,
}

impl FleetRoster {
    /// Build a roster from free-worker ids, already ordered ascending.
    fn new(ids: Vec<i64>) -> PassResult<Self> {
        if u32::try_from(ids.len()).is_err() {
            return Err(PassError::FleetTooLarge(ids.len()));
        }
        Ok(Self { persistent: ids })
    }

    fn worker_count(&self) -> u32 {
        self.persistent.len() as u32
    }

    /// Persistent id behind a dense engine id.
    fn persistent_id(&self, worker: WorkerId) -> PassResult<i64> {
        (worker.get() as usize)
            .checked_sub(1)
            .and_then(|index| self.persistent.get(index))
            .copied()
            .ok_or(PassError::UnknownWorker(worker))
    }
}

/// A single-shot dispatch over the store.
pub struct DispatchPass {
    pool: PgPool,
}

impl DispatchPass {
    /// Create a new dispatch pass runner.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run one dispatch pass over the pending tasks.
    #[instrument(skip(self))]
    pub async fn run_pass(&self) -> PassResult<PassStats> {
        let mut stats = PassStats::default();

        let task_rows = self.load_pending_tasks().await?;
        if task_rows.is_empty() {
            debug!("No pending tasks");
            return Ok(stats);
        }

        let roster = FleetRoster::new(self.load_free_worker_ids().await?)?;
        debug!(
            pending_tasks = task_rows.len(),
            free_workers = roster.worker_count(),
            "Loaded dispatch inputs"
        );

        let outcomes = allocate(&engine_tasks(&task_rows), roster.worker_count())?;

        for (row, outcome) in task_rows.iter().zip(&outcomes) {
            stats.tasks_processed += 1;
            match (self.apply_outcome(row, outcome, &roster).await, outcome) {
                (Ok(()), Outcome::Assigned(_)) => stats.tasks_assigned += 1,
                (Ok(()), Outcome::Unassigned) => stats.tasks_unserved += 1,
                (Err(e), _) => {
                    warn!(
                        task_id = row.task_id,
                        error = %e,
                        "Failed to record task outcome"
                    );
                    stats.writes_failed += 1;
                }
            }
        }

        info!(
            tasks_processed = stats.tasks_processed,
            tasks_assigned = stats.tasks_assigned,
            tasks_unserved = stats.tasks_unserved,
            writes_failed = stats.writes_failed,
            "Dispatch pass complete"
        );

        Ok(stats)
    }

    /// Load ids of workers currently marked free, lowest id first.
    async fn load_free_worker_ids(&self) -> PassResult<Vec<i64>> {
        let rows = sqlx::query_as::<_, FreeWorkerRow>(
            r#"
            SELECT worker_id
            FROM workers
            WHERE status = 'free'
            ORDER BY worker_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.worker_id).collect())
    }

    /// Load pending tasks ordered by arrival, ties by insertion order.
    async fn load_pending_tasks(&self) -> PassResult<Vec<PendingTaskRow>> {
        Ok(sqlx::query_as::<_, PendingTaskRow>(
            r#"
            SELECT task_id, arrival_at, duration
            FROM tasks
            WHERE status = 'pending'
            ORDER BY arrival_at, task_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn apply_outcome(
        &self,
        row: &PendingTaskRow,
        outcome: &Outcome,
        roster: &FleetRoster,
    ) -> PassResult<()> {
        match outcome {
            Outcome::Assigned(worker) => {
                let worker_id = roster.persistent_id(*worker)?;
                self.record_assignment(row, worker_id).await
            }
            Outcome::Unassigned => self.record_unserved(row.task_id).await,
        }
    }

    /// Mark the task assigned and its worker busy until the task completes.
    async fn record_assignment(&self, row: &PendingTaskRow, worker_id: i64) -> PassResult<()> {
        let free_at = row.arrival_at + row.duration;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE tasks
            SET worker_id = $1, status = 'assigned', decided_at = $2
            WHERE task_id = $3
            "#,
        )
        .bind(worker_id)
        .bind(Utc::now())
        .bind(row.task_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE workers
            SET status = 'busy', free_at = $1
            WHERE worker_id = $2
            "#,
        )
        .bind(free_at)
        .bind(worker_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Mark the task as having found no free worker.
    async fn record_unserved(&self, task_id: i64) -> PassResult<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'unserved', decided_at = $1
            WHERE task_id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Translate pending rows into engine tasks, preserving row order.
fn engine_tasks(rows: &[PendingTaskRow]) -> Vec<Task> {
    rows.iter()
        .map(|row| Task {
            arrival_at: row.arrival_at,
            duration: row.duration,
        })
        .collect()
}
