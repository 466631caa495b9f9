use crate::error::{ChoresError, Result};
use crate::lint::{LintFlag, LintLevel, parse_rule_list};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

/// File looked up in the project directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "chores.toml";

const SHARED_ALLOW: &str = "\
# Style choices the codebase deliberately makes
collapsible_else_if
module_inception
new_without_default
too_many_arguments
type_complexity
";

const TESTS_ALLOW: &str = "\
bool_assert_comparison
redundant_clone # clarity wins in fixtures
";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChoresConfig {
    pub lint: LintSettings,
    pub upgrade: UpgradeSettings,
}

/// Rule lists keyed by level, each one raw rule-list text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuleLists {
    pub allow: String,
    pub warn: String,
    pub deny: String,
    pub forbid: String,
}

impl RuleLists {
    pub fn get(&self, level: LintLevel) -> &str {
        match level {
            LintLevel::Allow => &self.allow,
            LintLevel::Warn => &self.warn,
            LintLevel::Deny => &self.deny,
            LintLevel::Forbid => &self.forbid,
        }
    }

    /// Flags for every level, allow first and forbid last.
    pub fn flags(&self) -> Vec<LintFlag> {
        LintLevel::ALL
            .iter()
            .flat_map(|level| parse_rule_list(level.action(), self.get(*level)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "LintSettingsFile")]
pub struct LintSettings {
    /// Feature selection passed to every clippy run.
    pub features: Vec<String>,
    /// Emit `-D warnings` ahead of the rule flags.
    pub deny_warnings: bool,
    /// Rule lists shared by every pass.
    pub rules: RuleLists,
    pub passes: Vec<LintPass>,
}

/// `[lint]` as written in `chores.toml`. Any key left out keeps its built-in value.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct LintSettingsFile {
    features: Vec<String>,
    deny_warnings: bool,
    allow: String,
    warn: String,
    deny: String,
    forbid: String,
    #[serde(rename = "pass")]
    passes: Vec<LintPass>,
}

impl Default for LintSettingsFile {
    fn default() -> Self {
        let LintSettings {
            features,
            deny_warnings,
            rules,
            passes,
        } = LintSettings::default();

        Self {
            features,
            deny_warnings,
            allow: rules.allow,
            warn: rules.warn,
            deny: rules.deny,
            forbid: rules.forbid,
            passes,
        }
    }
}

impl From<LintSettingsFile> for LintSettings {
    fn from(file: LintSettingsFile) -> Self {
        Self {
            features: file.features,
            deny_warnings: file.deny_warnings,
            rules: RuleLists {
                allow: file.allow,
                warn: file.warn,
                deny: file.deny,
                forbid: file.forbid,
            },
            passes: file.passes,
        }
    }
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            features: vec!["--all-features".to_string()],
            deny_warnings: true,
            rules: RuleLists {
                allow: SHARED_ALLOW.to_string(),
                ..RuleLists::default()
            },
            passes: vec![
                LintPass::new("sources", &["--lib", "--bins", "--examples"], RuleLists::default()),
                LintPass::new(
                    "tests",
                    &["--tests", "--benches"],
                    RuleLists {
                        allow: TESTS_ALLOW.to_string(),
                        ..RuleLists::default()
                    },
                ),
            ],
        }
    }
}

impl LintSettings {
    pub fn find_pass(&self, name: &str) -> Result<&LintPass> {
        self.passes
            .iter()
            .find(|pass| pass.name == name)
            .ok_or_else(|| {
                let known: Vec<&str> = self.passes.iter().map(|p| p.name.as_str()).collect();
                ChoresError::Config(format!(
                    "Unknown lint pass '{}' (known: {})",
                    name,
                    known.join(", ")
                ))
            })
    }
}

/// One `cargo clippy` run.
#[derive(Debug, Clone, Deserialize)]
pub struct LintPass {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(flatten)]
    pub rules: RuleLists,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl LintPass {
    pub fn new(name: &str, targets: &[&str], rules: RuleLists) -> Self {
        Self {
            name: name.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            rules,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpgradeSettings {
    /// Manifest path, relative to the project directory.
    pub manifest: PathBuf,
    /// Crate that provides `helper_subcommand`.
    pub helper_crate: String,
    pub helper_subcommand: String,
    pub upgrade_args: Vec<String>,
    pub pinned_key: String,
    pub pinned_line: String,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("Cargo.toml"),
            helper_crate: "cargo-edit".to_string(),
            helper_subcommand: "upgrade".to_string(),
            upgrade_args: vec!["--pinned".to_string(), "--incompatible".to_string()],
            pinned_key: "legacy_time".to_string(),
            pinned_line: r#"legacy_time = { package = "time", version = "0.1.42" }"#.to_string(),
        }
    }
}

impl UpgradeSettings {
    /// Version requirement carried by the pinned line.
    pub fn pinned_version(&self) -> Result<semver::VersionReq> {
        let doc = self.pinned_line.parse::<DocumentMut>().map_err(|e| {
            ChoresError::Config(format!("pinned_line is not a TOML key/value: {}", e))
        })?;

        let item = doc.get(&self.pinned_key).ok_or_else(|| {
            ChoresError::Config(format!(
                "pinned_line does not assign '{}'",
                self.pinned_key
            ))
        })?;

        let version = item
            .as_str()
            .or_else(|| {
                item.as_inline_table()
                    .and_then(|t| t.get("version"))
                    .and_then(|v| v.as_str())
            })
            .ok_or_else(|| {
                ChoresError::Config("pinned_line carries no version requirement".to_string())
            })?;

        semver::VersionReq::parse(version).map_err(|e| {
            ChoresError::Config(format!("Invalid pinned version '{}': {}", version, e))
        })
    }
}

impl ChoresConfig {
    /// Load the configuration for `project_path`.
    ///
    /// An explicit path must exist; otherwise `chores.toml` is used when present
    /// and the built-in defaults when not.
    pub fn load(project_path: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = project_path.join(CONFIG_FILE_NAME);
                candidate.is_file().then_some(candidate)
            }
        };

        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    ChoresError::Config(format!("Failed to read '{}': {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for pass in &self.lint.passes {
            if pass.name.trim().is_empty() {
                return Err(ChoresError::Config("Lint pass name must not be empty".into()));
            }
            if !seen.insert(pass.name.as_str()) {
                return Err(ChoresError::Config(format!(
                    "Duplicate lint pass '{}'",
                    pass.name
                )));
            }
        }

        let upgrade = &self.upgrade;
        if upgrade.pinned_key.trim().is_empty() {
            return Err(ChoresError::Config("pinned_key must not be empty".into()));
        }
        if !upgrade.pinned_line.starts_with(&upgrade.pinned_key) {
            return Err(ChoresError::Config(format!(
                "pinned_line must start with '{}'",
                upgrade.pinned_key
            )));
        }
        upgrade.pinned_version()?;

        Ok(())
    }
}
