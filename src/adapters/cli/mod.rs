//! CLI Adapter
//!
//! Command-line interface for the wallet sweeper.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{seed_ledger, CliApp, Command, OutputFormat, StatusCmd, SweepCmd};

use anyhow::Result;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
