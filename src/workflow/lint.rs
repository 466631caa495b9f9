use crate::agents::cargo_execution::{CargoCommand, CargoExecutionAgent, CommandRunner};
use crate::agents::ProjectScannerAgent;
use crate::config::{ChoresConfig, LintSettings};
use crate::error::Result;
use crate::lint::{ClippyInvocation, LintLevel, build_flags};
use colored::Colorize;
use std::io::Read;
use std::path::Path;

/// Run clippy over every enabled pass (or the one named by `pass`)
pub fn execute_lint<P: AsRef<Path>>(
    project_path: P,
    config: &ChoresConfig,
    pass: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let project_path = project_path.as_ref();
    println!("{}", "Running clippy...".cyan().bold());

    println!("\n{}", "1. Validating project structure...".yellow());
    let scanner = ProjectScannerAgent::new(project_path);
    let project_info = scanner.validate(&config.upgrade.manifest)?;
    println!("{}", "✓ Project structure is valid".green());

    println!("\n{}", "2. Preparing lint passes...".yellow());
    let invocations = select_invocations(&config.lint, pass)?;
    if invocations.is_empty() {
        println!("{}", "⚠ No lint passes are enabled".red());
        return Ok(());
    }
    for invocation in &invocations {
        println!("   • {}", invocation.pass.bright_cyan());
    }

    println!("\n{}", "3. Linting...".yellow());
    let mut agent = CargoExecutionAgent::new(&project_info.project_path);
    run_lint_passes(&mut agent, &invocations, dry_run)?;

    println!("\n{}", "✨ Lint passed!".green().bold());
    Ok(())
}

pub(crate) fn select_invocations(
    settings: &LintSettings,
    pass: Option<&str>,
) -> Result<Vec<ClippyInvocation>> {
    match pass {
        Some(name) => {
            let pass = settings.find_pass(name)?;
            Ok(vec![ClippyInvocation::for_pass(settings, pass)])
        }
        None => Ok(ClippyInvocation::for_enabled_passes(settings)),
    }
}

/// Runs passes in order; the first failing pass ends the run.
pub(crate) fn run_lint_passes<R: CommandRunner>(
    runner: &mut R,
    invocations: &[ClippyInvocation],
    dry_run: bool,
) -> Result<()> {
    for invocation in invocations {
        println!("\n   {} {}", "Pass".bold(), invocation.pass.bright_cyan());

        if dry_run {
            println!("   {}", invocation.command_line().dimmed());
            continue;
        }

        runner.run(&CargoCommand::new(invocation.args()))?;
        println!("   {}", format!("✓ {} is clean", invocation.pass).green());
    }
    Ok(())
}

/// Print the flag sequence for a rule list read from `input` (stdin for `-` or none)
pub fn execute_flags(level: LintLevel, input: Option<&Path>, json: bool) -> Result<()> {
    let rules = read_rule_list(input, std::io::stdin().lock())?;
    print!("{}", render_flags(level, &rules, json)?);
    Ok(())
}

/// Reads the rule list from `input`, falling back to `stdin` for `-` or no path.
pub(crate) fn read_rule_list<R: Read>(input: Option<&Path>, mut stdin: R) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buffer = String::new();
            stdin.read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// One flag per line, or a single-line JSON array.
pub(crate) fn render_flags(level: LintLevel, rules: &str, json: bool) -> Result<String> {
    let flags = build_flags(level.action(), rules);

    if json {
        return Ok(format!("{}\n", serde_json::to_string(&flags)?));
    }

    Ok(flags.iter().map(|flag| format!("{}\n", flag)).collect())
}

/// List configured passes with the command line each one produces
pub fn execute_passes(config: &ChoresConfig) -> Result<()> {
    let settings = &config.lint;
    println!("{}", "Configured lint passes:".cyan().bold());

    if settings.passes.is_empty() {
        println!("  {}", "(none)".dimmed());
        return Ok(());
    }

    for pass in &settings.passes {
        let invocation = ClippyInvocation::for_pass(settings, pass);
        let state = if pass.enabled {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!("\n  {} ({})", pass.name.white().bold(), state);
        println!("    {}", invocation.command_line().dimmed());
    }
    Ok(())
}
