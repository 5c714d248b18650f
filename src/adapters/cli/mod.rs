//! CLI Adapter
//!
//! Command-line interface for the GEX engine.
//! Uses clap derive macros for argument parsing.

mod commands;
mod output;

pub use commands::{AnalyzeCmd, CliApp, Command, HistoryCmd, OutputFormat, ProfileCmd};
pub use output::{fmt_dollars, render_history, render_profile};

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
