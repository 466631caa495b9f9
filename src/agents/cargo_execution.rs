use crate::error::{ChoresError, Result};
use colored::Colorize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable set by `--verbose`.
pub const VERBOSE_ENV: &str = "CHORES_VERBOSE";

pub fn is_verbose() -> bool {
    std::env::var_os(VERBOSE_ENV).is_some_and(|v| v == "1")
}

/// Arguments of a single `cargo` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoCommand {
    pub args: Vec<String>,
}

impl CargoCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CargoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cargo {}", self.args.join(" "))
    }
}

/// Runs cargo subcommands. Swappable so workflows can be driven without cargo.
pub trait CommandRunner {
    /// Run with the terminal attached; a non-zero exit is `CommandFailed`.
    fn run(&mut self, command: &CargoCommand) -> Result<()>;

    /// Run and return stdout; stderr stays on the terminal.
    fn capture(&mut self, command: &CargoCommand) -> Result<String>;
}

/// CargoExecutionAgent runs cargo inside the project directory.
pub struct CargoExecutionAgent {
    cargo: OsString,
    project_path: PathBuf,
}

impl CargoExecutionAgent {
    /// Uses `$CARGO` when set (we were started by cargo), `cargo` otherwise.
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        let cargo = std::env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo"));
        Self::with_cargo(cargo, project_path)
    }

    pub fn with_cargo<P: AsRef<Path>>(cargo: impl Into<OsString>, project_path: P) -> Self {
        Self {
            cargo: cargo.into(),
            project_path: project_path.as_ref().to_path_buf(),
        }
    }

    fn command(&self, command: &CargoCommand) -> Command {
        if is_verbose() {
            println!("   {} {}", "$".dimmed(), command.to_string().dimmed());
        }

        let mut process = Command::new(&self.cargo);
        process.current_dir(&self.project_path).args(&command.args);
        process
    }

    fn spawn_error(command: &CargoCommand, e: std::io::Error) -> ChoresError {
        ChoresError::CommandSpawn(format!("`{}`: {}", command, e))
    }

    fn check_status(command: &CargoCommand, status: std::process::ExitStatus) -> Result<()> {
        if status.success() {
            return Ok(());
        }

        Err(ChoresError::CommandFailed {
            command: command.to_string(),
            // Killed by a signal: no code to forward.
            code: status.code().unwrap_or(1),
        })
    }
}

impl CommandRunner for CargoExecutionAgent {
    fn run(&mut self, command: &CargoCommand) -> Result<()> {
        let status = self
            .command(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Self::spawn_error(command, e))?;

        Self::check_status(command, status)
    }

    fn capture(&mut self, command: &CargoCommand) -> Result<String> {
        let output = self
            .command(command)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| Self::spawn_error(command, e))?;

        Self::check_status(command, output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Whether `cargo install --list` output mentions `crate_name`.
///
/// Crate lines look like `cargo-edit v0.12.2:`; binaries follow indented.
pub fn is_crate_installed(install_list: &str, crate_name: &str) -> bool {
    install_list
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == crate_name)
}
