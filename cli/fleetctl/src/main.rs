//! fleetctl (fleet) - CLI for fleet-dispatch allocation runs.
//!
//! Reads a task list from a file or stdin, runs the allocation engine, and
//! prints one outcome per task.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod input;
mod output;

use commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Run the command
    if let Err(e) = cli.run() {
        // Print error in a user-friendly way
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
