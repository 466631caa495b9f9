use crate::lint::LintLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chores",
    about = "Project chores for Rust crates - clippy passes from rule lists and dependency upgrades",
    version,
    author
)]
pub struct Cli {
    /// Path to the project directory (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    pub path: PathBuf,

    /// Configuration file (defaults to chores.toml in the project directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Echo every command and manifest edit
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run cargo clippy for each configured lint pass
    Lint {
        /// Run only the named pass
        #[arg(long, value_name = "NAME")]
        pass: Option<String>,

        /// Print the clippy command lines without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Upgrade every dependency while keeping the pinned one fixed
    Upgrade {
        /// Print the steps without running commands or editing the manifest
        #[arg(long)]
        dry_run: bool,
    },

    /// Turn a rule list into clippy flags
    Flags {
        /// Level applied to every rule in the list
        #[arg(short, long, value_enum, default_value_t = LintLevel::Allow)]
        level: LintLevel,

        /// Rule list file; `-` or nothing reads stdin
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Print a JSON array instead of one flag per line
        #[arg(long)]
        json: bool,
    },

    /// Show configured lint passes and their command lines
    Passes,
}
