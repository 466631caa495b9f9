use std::fmt;

/// Namespace every rule name is qualified with.
pub const NAMESPACE: &str = "clippy";

/// Lint level, mapped onto the rustc action token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LintLevel {
    Allow,
    Warn,
    Deny,
    Forbid,
}

impl LintLevel {
    /// Emission order inside a single rule source.
    pub const ALL: [LintLevel; 4] = [
        LintLevel::Allow,
        LintLevel::Warn,
        LintLevel::Deny,
        LintLevel::Forbid,
    ];

    pub fn action(self) -> &'static str {
        match self {
            LintLevel::Allow => "-A",
            LintLevel::Warn => "-W",
            LintLevel::Deny => "-D",
            LintLevel::Forbid => "-F",
        }
    }
}

/// A single `<action> clippy::<rule>` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFlag {
    pub action: String,
    pub rule: String,
}

impl LintFlag {
    pub fn qualified_rule(&self) -> String {
        format!("{}::{}", NAMESPACE, self.rule)
    }

    /// The two argv words a shell would have produced for this flag.
    pub fn to_args(&self) -> [String; 2] {
        [self.action.clone(), self.qualified_rule()]
    }
}

impl fmt::Display for LintFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}", self.action, NAMESPACE, self.rule)
    }
}

/// Parse a rule list into flags carrying `action`.
///
/// Blank lines and `#` comments (full-line or trailing) are dropped; `\#`
/// does not open a comment. Order of the surviving lines is preserved.
pub fn parse_rule_list(action: &str, rules: &str) -> Vec<LintFlag> {
    rules
        .lines()
        .map(strip_comment)
        .map(str::trim)
        .filter(|rule| !rule.is_empty())
        .map(|rule| LintFlag {
            action: action.to_string(),
            rule: rule.to_string(),
        })
        .collect()
}

/// Build the flag sequence for a rule list: one `"<action> clippy::<rule>"` per rule.
pub fn build_flags(action: &str, rules: &str) -> Vec<String> {
    parse_rule_list(action, rules)
        .iter()
        .map(LintFlag::to_string)
        .collect()
}

fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '\\' => escaped = !escaped,
            '#' if !escaped => return &line[..idx],
            _ => escaped = false,
        }
    }
    line
}
