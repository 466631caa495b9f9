use crate::error::Result;
use crate::manifest::ManifestBuffer;
use semver::{Comparator, VersionReq};
use std::collections::BTreeMap;
use std::fmt;
use toml_edit::Item;

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Version requirements declared by a manifest, keyed by dependency.
///
/// Normal dependencies use their bare key; dev and build dependencies are
/// prefixed with their table name (`dev-dependencies.tempfile`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySnapshot {
    entries: BTreeMap<String, String>,
}

impl DependencySnapshot {
    pub fn from_buffer(buffer: &ManifestBuffer) -> Result<Self> {
        let doc = buffer.parse()?;
        let mut entries = BTreeMap::new();

        for table_name in DEPENDENCY_TABLES {
            let Some(table) = doc.get(table_name).and_then(|t| t.as_table_like()) else {
                continue;
            };

            for (key, item) in table.iter() {
                if let Some(version) = requirement_of(item) {
                    let name = if table_name == "dependencies" {
                        key.to_string()
                    } else {
                        format!("{}.{}", table_name, key)
                    };
                    entries.insert(name, version);
                }
            }
        }

        Ok(Self { entries })
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Changes going from `self` to `after`, sorted by dependency name.
    pub fn diff(&self, after: &DependencySnapshot) -> Vec<DependencyChange> {
        let mut changes = Vec::new();

        for (name, old) in &self.entries {
            match after.entries.get(name) {
                Some(new) if new != old => changes.push(DependencyChange::Changed {
                    name: name.clone(),
                    old: old.clone(),
                    new: new.clone(),
                    bump: Bump::between(old, new),
                }),
                Some(_) => {}
                None => changes.push(DependencyChange::Removed {
                    name: name.clone(),
                    old: old.clone(),
                }),
            }
        }

        for (name, new) in &after.entries {
            if !self.entries.contains_key(name) {
                changes.push(DependencyChange::Added {
                    name: name.clone(),
                    new: new.clone(),
                });
            }
        }

        changes.sort_by(|a, b| a.name().cmp(b.name()));
        changes
    }
}

fn requirement_of(item: &Item) -> Option<String> {
    if let Some(version) = item.as_str() {
        return Some(version.to_string());
    }

    item.as_table_like()
        .and_then(|table| table.get("version"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyChange {
    Changed {
        name: String,
        old: String,
        new: String,
        bump: Bump,
    },
    Added {
        name: String,
        new: String,
    },
    Removed {
        name: String,
        old: String,
    },
}

impl DependencyChange {
    pub fn name(&self) -> &str {
        match self {
            DependencyChange::Changed { name, .. }
            | DependencyChange::Added { name, .. }
            | DependencyChange::Removed { name, .. } => name,
        }
    }
}

/// Which component of the lower bound moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    Major,
    Minor,
    Patch,
    Other,
}

impl Bump {
    pub fn between(old: &str, new: &str) -> Self {
        let (Some(old), Some(new)) = (lower_bound(old), lower_bound(new)) else {
            return Bump::Other;
        };

        if old.major != new.major {
            Bump::Major
        } else if old.minor.unwrap_or(0) != new.minor.unwrap_or(0) {
            Bump::Minor
        } else if old.patch.unwrap_or(0) != new.patch.unwrap_or(0) {
            Bump::Patch
        } else {
            Bump::Other
        }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Bump::Major => "major",
            Bump::Minor => "minor",
            Bump::Patch => "patch",
            Bump::Other => "other",
        };
        f.write_str(label)
    }
}

fn lower_bound(requirement: &str) -> Option<Comparator> {
    VersionReq::parse(requirement)
        .ok()
        .and_then(|req| req.comparators.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(content: &str) -> DependencySnapshot {
        DependencySnapshot::from_buffer(&ManifestBuffer::new("Cargo.toml", content)).unwrap()
    }

    #[test]
    fn reads_string_and_table_requirements() {
        let snap = snapshot(
            r#"
[dependencies]
log = "0.4"
serde = { version = "1.0", features = ["derive"] }
local = { path = "../local" }

[dependencies.regex]
version = "1.10"

[dev-dependencies]
tempfile = "3"
"#,
        );
        assert_eq!(snap.get("log"), Some("0.4"));
        assert_eq!(snap.get("serde"), Some("1.0"));
        assert_eq!(snap.get("regex"), Some("1.10"));
        assert_eq!(snap.get("dev-dependencies.tempfile"), Some("3"));
        assert_eq!(snap.get("local"), None);
    }

    #[test]
    fn diff_classifies_bumps() {
        let before = snapshot("[dependencies]\nlog = \"0.4.17\"\nclap = \"3.2\"\nold = \"1\"\n");
        let after = snapshot("[dependencies]\nlog = \"0.4.20\"\nclap = \"4.5\"\nnew = \"2\"\n");

        let changes = before.diff(&after);
        assert_eq!(
            changes,
            vec![
                DependencyChange::Changed {
                    name: "clap".into(),
                    old: "3.2".into(),
                    new: "4.5".into(),
                    bump: Bump::Major,
                },
                DependencyChange::Changed {
                    name: "log".into(),
                    old: "0.4.17".into(),
                    new: "0.4.20".into(),
                    bump: Bump::Patch,
                },
                DependencyChange::Added {
                    name: "new".into(),
                    new: "2".into(),
                },
                DependencyChange::Removed {
                    name: "old".into(),
                    old: "1".into(),
                },
            ]
        );
    }

    #[test]
    fn bump_handles_operators_and_garbage() {
        assert_eq!(Bump::between("^1.2", "^1.3"), Bump::Minor);
        assert_eq!(Bump::between("=0.1.40", "=0.1.42"), Bump::Patch);
        assert_eq!(Bump::between("1.0", "1.0.0"), Bump::Other);
        assert_eq!(Bump::between("*", "not a version"), Bump::Other);
    }

    #[test]
    fn unchanged_manifest_has_no_diff() {
        let snap = snapshot("[dependencies]\nlog = \"0.4\"\n");
        assert!(snap.diff(&snap.clone()).is_empty());
    }
}
