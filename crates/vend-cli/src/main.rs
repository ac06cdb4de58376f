//! vend CLI
//!
//! Resolves Go modules and publishes them, with every transitive
//! dependency, to a repository in GOPROXY layout.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every module was handled successfully.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    if let Err(e) = vend_tools::logging::init(cli.verbose) {
        eprintln!("{}: failed to initialize logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Commands::Publish(args) => {
            let report = commands::run_publish(cli.config.as_deref(), args)?;
            Ok(report.is_success())
        }
    }
}
