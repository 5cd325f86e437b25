//! Fellwatch CLI - Command-line interface
//!
//! Runs the observation/logging analysis and shows the effective
//! configuration.

mod cli;
mod commands;
mod errors;
mod output;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            errors::from_error(&error).display();
            ExitCode::FAILURE
        }
    }
}
