use crate::config::{LintPass, LintSettings};
use crate::lint::LintFlag;

/// A fully assembled `cargo clippy` command line for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClippyInvocation {
    pub pass: String,
    pub cargo_args: Vec<String>,
    pub rustc_args: Vec<String>,
}

impl ClippyInvocation {
    /// Shared rule lists first, then the pass's own, so pass flags win.
    pub fn for_pass(settings: &LintSettings, pass: &LintPass) -> Self {
        let mut cargo_args = vec!["clippy".to_string()];
        cargo_args.extend(pass.targets.iter().cloned());
        cargo_args.extend(settings.features.iter().cloned());

        let mut rustc_args = Vec::new();
        if settings.deny_warnings {
            rustc_args.push("-D".to_string());
            rustc_args.push("warnings".to_string());
        }

        let flags: Vec<LintFlag> = settings
            .rules
            .flags()
            .into_iter()
            .chain(pass.rules.flags())
            .collect();
        rustc_args.extend(flags.iter().flat_map(LintFlag::to_args));

        Self {
            pass: pass.name.clone(),
            cargo_args,
            rustc_args,
        }
    }

    /// Every enabled pass, in configuration order.
    pub fn for_enabled_passes(settings: &LintSettings) -> Vec<Self> {
        settings
            .passes
            .iter()
            .filter(|pass| pass.enabled)
            .map(|pass| Self::for_pass(settings, pass))
            .collect()
    }

    /// Arguments handed to `cargo`; the `--` separator is only added when
    /// there is something to pass through to clippy.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.cargo_args.clone();
        if !self.rustc_args.is_empty() {
            args.push("--".to_string());
            args.extend(self.rustc_args.iter().cloned());
        }
        args
    }

    pub fn command_line(&self) -> String {
        format!("cargo {}", self.args().join(" "))
    }
}
