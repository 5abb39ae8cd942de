//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read task list from {path}")]
    TaskFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed task list in {path}: {source}")]
    TaskFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] fleet_dispatch::DispatchError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::TaskFileParse { .. } => {
                eprintln!(
                    "\n{}",
                    r#"Hint: expected a JSON list like [{"arrival_at": 0, "duration": 5}]."#
                        .yellow()
                );
            }
            CliError::Dispatch(_) => {
                eprintln!("\n{}", "Hint: task durations must be non-negative.".yellow());
            }
            _ => {}
        }
    }
}
