mod agents;
mod cli;
mod config;
mod error;
mod lint;
mod manifest;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use config::ChoresConfig;
use std::process;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        unsafe {
            std::env::set_var(agents::cargo_execution::VERBOSE_ENV, "1");
        }
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> error::Result<()> {
    let load_config = || ChoresConfig::load(&cli.path, cli.config.as_deref());

    match cli.command {
        Commands::Lint { pass, dry_run } => {
            workflow::execute_lint(&cli.path, &load_config()?, pass.as_deref(), dry_run)
        }
        Commands::Upgrade { dry_run } => {
            workflow::execute_upgrade(&cli.path, &load_config()?, dry_run)
        }
        Commands::Flags { level, input, json } => {
            workflow::execute_flags(level, input.as_deref(), json)
        }
        Commands::Passes => workflow::execute_passes(&load_config()?),
    }
}
