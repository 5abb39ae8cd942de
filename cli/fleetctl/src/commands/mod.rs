//! CLI commands.

mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// fleet-dispatch CLI - Assign a worker fleet to time-stamped tasks.
#[derive(Debug, Parser)]
#[command(name = "fleet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run an allocation over a task file.
    Run(run::RunCommand),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let format = OutputFormat::parse(&self.format);

        match self.command {
            Commands::Run(cmd) => cmd.run(format),
        }
    }
}
