//! Dispatch background worker.
//!
//! Runs the dispatch pass on a periodic interval until shutdown.

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info, instrument};

use crate::pass::{DispatchPass, PassResult};

/// Periodic driver for the dispatch pass.
pub struct DispatchWorker {
    pass: DispatchPass,
    interval: Duration,
}

impl DispatchWorker {
    /// Create a new dispatch worker.
    pub fn new(pool: PgPool, interval: Duration) -> Self {
        Self {
            pass: DispatchPass::new(pool),
            interval,
        }
    }

    /// Run the dispatch worker until shutdown is signaled.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting dispatch worker"
        );

        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately; consume it so the first
        // pass lands one interval after startup.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Dispatch pass failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Dispatch worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run a single dispatch pass.
    async fn run_once(&self) -> PassResult<()> {
        let stats = self.pass.run_pass().await?;

        if stats.tasks_processed > 0 {
            info!(
                tasks_assigned = stats.tasks_assigned,
                tasks_unserved = stats.tasks_unserved,
                "Dispatch pass recorded outcomes"
            );
        }

        Ok(())
    }
}
