//! Allocation run command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fleet_dispatch::{allocate, Outcome, Task};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::input::read_tasks;
use crate::output::{print_output, OutputFormat};

/// Run an allocation over a task file.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Number of workers in the fleet.
    #[arg(long, short = 'w')]
    workers: u32,

    /// Path to a JSON task list (`-` reads stdin).
    file: PathBuf,
}

/// One output row per task, in input order.
#[derive(Debug, Clone, Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Task")]
    task: usize,

    #[tabled(rename = "Arrival")]
    arrival_at: i64,

    #[tabled(rename = "Duration")]
    duration: i64,

    #[tabled(rename = "Worker")]
    worker: String,

    #[tabled(rename = "Status")]
    status: String,
}

impl RunCommand {
    pub fn run(self, format: OutputFormat) -> Result<()> {
        let tasks = read_tasks(&self.file)?;
        let outcomes = allocate(&tasks, self.workers).map_err(CliError::from)?;

        let rows: Vec<OutcomeRow> = tasks
            .iter()
            .zip(&outcomes)
            .enumerate()
            .map(|(index, (task, outcome))| outcome_row(index, task, outcome))
            .collect();

        print_output(&rows, format);
        Ok(())
    }
}

fn outcome_row(index: usize, task: &Task, outcome: &Outcome) -> OutcomeRow {
    let (worker, status) = match outcome {
        Outcome::Assigned(worker) => (worker.to_string(), "assigned".to_string()),
        Outcome::Unassigned => ("-".to_string(), "unassigned".to_string()),
    };

    OutcomeRow {
        task: index + 1,
        arrival_at: task.arrival_at,
        duration: task.duration,
        worker,
        status,
    }
}
