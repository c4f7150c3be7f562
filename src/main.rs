// src/main.rs

use anyhow::Result;
use clap::Parser;

use dot::cli::{Cli, Commands};
use dot::commands;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Manage { packages, dry_run } => {
            commands::manage(&cli.options, &packages, dry_run)
        }
        Commands::Unmanage { packages, dry_run } => {
            commands::unmanage(&cli.options, &packages, dry_run)
        }
        Commands::Remanage { packages, dry_run } => {
            commands::remanage(&cli.options, &packages, dry_run)
        }
        Commands::Adopt {
            package,
            files,
            dry_run,
        } => commands::adopt(&cli.options, &package, &files, dry_run),
        Commands::Plan { packages, format } => {
            commands::plan_command(&cli.options, &packages, format)
        }
        Commands::Status => commands::status(&cli.options),
    }
}
