pub mod invocation;
pub mod rules;

pub use invocation::ClippyInvocation;
pub use rules::{LintFlag, LintLevel, build_flags, parse_rule_list};
