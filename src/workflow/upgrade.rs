use crate::agents::ProjectScannerAgent;
use crate::agents::cargo_execution::{
    CargoCommand, CargoExecutionAgent, CommandRunner, is_crate_installed, is_verbose,
};
use crate::config::{ChoresConfig, UpgradeSettings};
use crate::error::Result;
use crate::manifest::{Bump, DependencyChange, DependencySnapshot, ManifestBuffer, key_assignment_pattern};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use jiff::{Timestamp, Zoned};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// The fixed upgrade sequence. Order matters and is never changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStep {
    EnsureHelper,
    Unpin,
    UpdateLock,
    Upgrade,
    Repin,
    RefreshLock,
    Clean,
}

impl UpgradeStep {
    pub const SEQUENCE: [UpgradeStep; 7] = [
        UpgradeStep::EnsureHelper,
        UpgradeStep::Unpin,
        UpgradeStep::UpdateLock,
        UpgradeStep::Upgrade,
        UpgradeStep::Repin,
        UpgradeStep::RefreshLock,
        UpgradeStep::Clean,
    ];

    /// The cargo command this step runs, if it is not a manifest edit.
    pub fn command(self, settings: &UpgradeSettings) -> Option<CargoCommand> {
        match self {
            UpgradeStep::EnsureHelper => Some(CargoCommand::new(["install", "--list"])),
            UpgradeStep::UpdateLock | UpgradeStep::RefreshLock => {
                Some(CargoCommand::new(["update"]))
            }
            UpgradeStep::Upgrade => Some(CargoCommand::new(
                std::iter::once(settings.helper_subcommand.clone())
                    .chain(settings.upgrade_args.iter().cloned()),
            )),
            UpgradeStep::Clean => Some(CargoCommand::new(["clean"])),
            UpgradeStep::Unpin | UpgradeStep::Repin => None,
        }
    }
}

impl fmt::Display for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpgradeStep::EnsureHelper => "Ensuring upgrade helper is installed",
            UpgradeStep::Unpin => "Removing pinned dependency",
            UpgradeStep::UpdateLock => "Updating lock file",
            UpgradeStep::Upgrade => "Upgrading dependencies",
            UpgradeStep::Repin => "Restoring pinned dependency",
            UpgradeStep::RefreshLock => "Refreshing lock file",
            UpgradeStep::Clean => "Cleaning build artifacts",
        };
        f.write_str(label)
    }
}

/// What the upgrade did to the manifest
#[derive(Debug, Clone, Default)]
pub struct UpgradeReport {
    pub helper_installed: bool,
    pub unpinned_lines: usize,
    pub changes: Vec<DependencyChange>,
}

/// Execute the upgrade workflow
pub fn execute_upgrade<P: AsRef<Path>>(
    project_path: P,
    config: &ChoresConfig,
    dry_run: bool,
) -> Result<()> {
    let project_path = project_path.as_ref();
    let settings = &config.upgrade;
    println!("{}", "Starting dependency upgrade...".cyan().bold());

    let scanner = ProjectScannerAgent::new(project_path);
    let project_info = scanner.validate(&settings.manifest)?;
    println!(
        "{}",
        format!("✓ Using {}", project_info.manifest_path.display()).green()
    );
    if !project_info.has_lockfile {
        println!("{}", "   No Cargo.lock yet, cargo update will create one".dimmed());
    }

    let mut agent = CargoExecutionAgent::new(&project_info.project_path);
    let report = run_upgrade(&mut agent, &project_info.manifest_path, settings, dry_run)?;

    if dry_run {
        println!("\n{}", "Dry run: nothing was executed or written".yellow());
        return Ok(());
    }

    print_upgrade_report(&report);

    println!(
        "\n{}",
        format!(
            "✨ Upgrade completed at {}",
            Zoned::now().strftime("%Y-%m-%d %H:%M:%S")
        )
        .green()
        .bold()
    );
    Ok(())
}

/// Runs the sequence against `manifest_path`, stopping at the first failure.
///
/// A manifest edit already saved stays on disk when a later step fails.
pub(crate) fn run_upgrade<R: CommandRunner>(
    runner: &mut R,
    manifest_path: &Path,
    settings: &UpgradeSettings,
    dry_run: bool,
) -> Result<UpgradeReport> {
    let pinned = key_assignment_pattern(&settings.pinned_key)?;
    let mut report = UpgradeReport::default();

    let original = ManifestBuffer::load(manifest_path)?;
    let before = DependencySnapshot::from_buffer(&original)?;

    for (index, step) in UpgradeStep::SEQUENCE.iter().enumerate() {
        println!("\n{}", format!("{}. {}...", index + 1, step).yellow());

        if dry_run {
            println!("   {}", describe_step(*step, settings, &pinned, &original).dimmed());
            continue;
        }

        let started = Timestamp::now();
        match step {
            UpgradeStep::EnsureHelper => {
                report.helper_installed = ensure_helper(runner, settings)?;
            }
            UpgradeStep::Unpin => {
                let mut buffer = ManifestBuffer::load(manifest_path)?;
                report.unpinned_lines = buffer.remove_matching(&pinned);
                if report.unpinned_lines > 0 {
                    buffer.save()?;
                }
                if is_verbose() {
                    println!(
                        "   {}",
                        format!("removed {} line(s) matching {}", report.unpinned_lines, pinned)
                            .dimmed()
                    );
                }
            }
            UpgradeStep::Repin => {
                // `cargo upgrade` rewrote the manifest, so start from disk again.
                let mut buffer = ManifestBuffer::load(manifest_path)?;
                buffer.append_line(&settings.pinned_line);
                buffer.save()?;
                buffer.parse()?;
            }
            other => {
                if let Some(command) = other.command(settings) {
                    runner.run(&command)?;
                }
            }
        }

        let elapsed = Timestamp::now().duration_since(started);
        println!(
            "{}",
            format!("✓ Done ({:.1}s)", elapsed.as_secs_f64()).green()
        );
    }

    if !dry_run {
        let after = DependencySnapshot::from_buffer(&ManifestBuffer::load(manifest_path)?)?;
        report.changes = before.diff(&after);
    }

    Ok(report)
}

/// What a step would do, as printed by a dry run.
fn describe_step(
    step: UpgradeStep,
    settings: &UpgradeSettings,
    pinned: &Regex,
    manifest: &ManifestBuffer,
) -> String {
    match step {
        UpgradeStep::EnsureHelper => format!(
            "cargo install --list, then cargo install {} if it is missing",
            settings.helper_crate
        ),
        UpgradeStep::Unpin => format!(
            "remove {} line(s) matching {}",
            manifest.count_matching(pinned),
            pinned
        ),
        UpgradeStep::Repin => format!("append {}", settings.pinned_line),
        other => other
            .command(settings)
            .map(|command| command.to_string())
            .unwrap_or_default(),
    }
}

/// Installs the helper crate when `cargo install --list` does not show it.
/// Returns whether an install happened.
fn ensure_helper<R: CommandRunner>(runner: &mut R, settings: &UpgradeSettings) -> Result<bool> {
    let spinner = ProgressBar::new_spinner();
    if is_verbose() {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    }
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(format!("Looking for {}", settings.helper_crate));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let listed = runner.capture(&CargoCommand::new(["install", "--list"]));
    spinner.finish_and_clear();

    if is_crate_installed(&listed?, &settings.helper_crate) {
        println!("   {} is already installed", settings.helper_crate.bright_cyan());
        return Ok(false);
    }

    println!("   Installing {}", settings.helper_crate.bright_cyan());
    runner.run(&CargoCommand::new(["install", settings.helper_crate.as_str()]))?;
    Ok(true)
}

fn print_upgrade_report(report: &UpgradeReport) {
    println!("\n{}", "Upgrade Summary:".cyan().bold());

    if report.helper_installed {
        println!("  {}", "Upgrade helper was installed".dimmed());
    }
    if report.unpinned_lines == 0 {
        println!(
            "  {}",
            "Pinned dependency was not present before the upgrade".yellow()
        );
    }

    if report.changes.is_empty() {
        println!("  {}", "No dependency requirements changed".yellow());
        return;
    }

    println!(
        "{}",
        format!("  {} requirement(s) changed", report.changes.len()).green()
    );
    for change in &report.changes {
        match change {
            DependencyChange::Changed {
                name,
                old,
                new,
                bump,
            } => {
                let bump = match bump {
                    Bump::Major => bump.to_string().red(),
                    Bump::Minor => bump.to_string().yellow(),
                    Bump::Patch | Bump::Other => bump.to_string().dimmed(),
                };
                println!(
                    "  • {} {} → {} ({})",
                    name.white().bold(),
                    old.red(),
                    new.green(),
                    bump
                );
            }
            DependencyChange::Added { name, new } => {
                println!("  + {} {}", name.white().bold(), new.green());
            }
            DependencyChange::Removed { name, old } => {
                println!("  - {} {}", name.white().bold(), old.red());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::cargo_execution::tests::RecordingRunner;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"[package]
name = "demo"
version = "0.1.0"

[dependencies]
log = "0.4"
legacy_time = { package = "time", version = "0.1.40" }
"#;

    fn manifest_in(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("Cargo.toml");
        fs::write(&path, MANIFEST).unwrap();
        path
    }

    fn installed_runner() -> RecordingRunner {
        let mut runner = RecordingRunner::default();
        runner.outputs.insert(
            "cargo install --list".into(),
            "cargo-edit v0.12.2:\n    cargo-upgrade\n".into(),
        );
        runner
    }

    #[test]
    fn runs_the_fixed_sequence() {
        let dir = tempdir().unwrap();
        let path = manifest_in(dir.path());
        let mut runner = installed_runner();

        let report = run_upgrade(&mut runner, &path, &UpgradeSettings::default(), false).unwrap();

        assert_eq!(
            runner.commands,
            vec![
                "cargo install --list",
                "cargo update",
                "cargo upgrade --pinned --incompatible",
                "cargo update",
                "cargo clean",
            ]
        );
        assert!(!report.helper_installed);
        assert_eq!(report.unpinned_lines, 1);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with(
            "legacy_time = { package = \"time\", version = \"0.1.42\" }\n"
        ));
        assert_eq!(content.matches("legacy_time").count(), 1);
        assert_eq!(
            report.changes,
            vec![DependencyChange::Changed {
                name: "legacy_time".into(),
                old: "0.1.40".into(),
                new: "0.1.42".into(),
                bump: Bump::Patch,
            }]
        );
    }

    #[test]
    fn installs_missing_helper() {
        let dir = tempdir().unwrap();
        let path = manifest_in(dir.path());
        let mut runner = RecordingRunner::default();

        let report = run_upgrade(&mut runner, &path, &UpgradeSettings::default(), false).unwrap();

        assert!(report.helper_installed);
        assert_eq!(runner.commands[1], "cargo install cargo-edit");
    }

    #[test]
    fn failure_aborts_and_leaves_partial_edit() {
        let dir = tempdir().unwrap();
        let path = manifest_in(dir.path());
        let mut runner = installed_runner();
        runner
            .failures
            .insert("cargo upgrade --pinned --incompatible".into(), 2);

        let err = run_upgrade(&mut runner, &path, &UpgradeSettings::default(), false).unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert_eq!(runner.commands.last().unwrap(), "cargo upgrade --pinned --incompatible");
        assert!(!runner.commands.contains(&"cargo clean".to_string()));
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("legacy_time"));
    }

    #[test]
    fn rerunning_keeps_a_single_pinned_line() {
        let dir = tempdir().unwrap();
        let path = manifest_in(dir.path());
        let settings = UpgradeSettings::default();

        run_upgrade(&mut installed_runner(), &path, &settings, false).unwrap();
        let report = run_upgrade(&mut installed_runner(), &path, &settings, false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("legacy_time =").count(), 1);
        assert!(report.changes.is_empty());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let path = manifest_in(dir.path());
        let mut runner = installed_runner();

        let report = run_upgrade(&mut runner, &path, &UpgradeSettings::default(), true).unwrap();

        assert!(runner.commands.is_empty());
        assert!(report.changes.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST);
    }

    #[test]
    fn dry_run_describes_the_real_edits() {
        let settings = UpgradeSettings::default();
        let pinned = key_assignment_pattern(&settings.pinned_key).unwrap();
        let manifest = ManifestBuffer::new("Cargo.toml", MANIFEST);

        assert_eq!(
            describe_step(UpgradeStep::Unpin, &settings, &pinned, &manifest),
            r"remove 1 line(s) matching ^legacy_time\s*="
        );
        assert_eq!(
            describe_step(UpgradeStep::Repin, &settings, &pinned, &manifest),
            format!("append {}", settings.pinned_line)
        );
        assert_eq!(
            describe_step(UpgradeStep::Upgrade, &settings, &pinned, &manifest),
            "cargo upgrade --pinned --incompatible"
        );
    }

    #[test]
    fn step_commands_follow_settings() {
        let settings = UpgradeSettings {
            helper_subcommand: "upgrade".into(),
            upgrade_args: vec!["--incompatible".into(), "allow".into()],
            ..UpgradeSettings::default()
        };
        assert_eq!(
            UpgradeStep::Upgrade.command(&settings).unwrap().to_string(),
            "cargo upgrade --incompatible allow"
        );
        assert!(UpgradeStep::Repin.command(&settings).is_none());
    }
}
