use crate::error::{ChoresError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

/// Pattern matching a line that assigns `key` at the start of the line.
pub fn key_assignment_pattern(key: &str) -> Result<Regex> {
    Regex::new(&format!(r"^{}\s*=", regex::escape(key)))
        .map_err(|e| ChoresError::Manifest(format!("Invalid key pattern for '{}': {}", key, e)))
}

/// Manifest text held in memory and edited line by line.
///
/// Nothing touches the file until [`ManifestBuffer::save`] is called.
#[derive(Debug, Clone)]
pub struct ManifestBuffer {
    path: PathBuf,
    content: String,
}

impl ManifestBuffer {
    pub fn new<P: AsRef<Path>>(path: P, content: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            content: content.into(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ChoresError::Manifest(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Ok(Self::new(path, content))
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.content).map_err(|e| {
            ChoresError::Manifest(format!("Failed to write '{}': {}", self.path.display(), e))
        })
    }

    #[cfg(test)]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Drop every line matching `pattern`, returning how many went.
    pub fn remove_matching(&mut self, pattern: &Regex) -> usize {
        let mut removed = 0;
        let mut kept = String::with_capacity(self.content.len());

        for line in self.content.split_inclusive('\n') {
            let body = line.strip_suffix('\n').unwrap_or(line);
            let body = body.strip_suffix('\r').unwrap_or(body);
            if pattern.is_match(body) {
                removed += 1;
            } else {
                kept.push_str(line);
            }
        }

        self.content = kept;
        removed
    }

    /// Append `line` at the end of the buffer. Existing copies are left alone.
    pub fn append_line(&mut self, line: &str) {
        if !self.content.is_empty() && !self.content.ends_with('\n') {
            self.content.push('\n');
        }
        self.content.push_str(line);
        self.content.push('\n');
    }

    pub fn count_matching(&self, pattern: &Regex) -> usize {
        self.content.lines().filter(|l| pattern.is_match(l)).count()
    }

    /// Parse the buffer as TOML.
    pub fn parse(&self) -> Result<DocumentMut> {
        self.content.parse::<DocumentMut>().map_err(|e| {
            ChoresError::Manifest(format!(
                "'{}' is not valid TOML: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PINNED: &str = r#"legacy_time = { package = "time", version = "0.1.42" }"#;

    const MANIFEST: &str = r#"[package]
name = "demo"
version = "0.1.0"

[dependencies]
log = "0.4"
legacy_time = { package = "time", version = "0.1.40" }
serde = "1.0"
"#;

    #[test]
    fn removes_pinned_line_and_keeps_the_rest() {
        let mut buffer = ManifestBuffer::new("Cargo.toml", MANIFEST);
        let pattern = key_assignment_pattern("legacy_time").unwrap();
        assert_eq!(buffer.remove_matching(&pattern), 1);
        assert!(!buffer.content().contains("legacy_time"));
        assert!(buffer.content().ends_with("serde = \"1.0\"\n"));
    }

    #[test]
    fn pattern_is_anchored_to_line_start() {
        let mut buffer = ManifestBuffer::new(
            "Cargo.toml",
            "  legacy_time = \"1\"\nnot_legacy_time = \"1\"\nlegacy_times = \"1\"\n",
        );
        let pattern = key_assignment_pattern("legacy_time").unwrap();
        assert_eq!(buffer.remove_matching(&pattern), 0);
    }

    #[test]
    fn removing_absent_line_is_a_noop() {
        let mut buffer = ManifestBuffer::new("Cargo.toml", "[dependencies]\nlog = \"0.4\"\n");
        let pattern = key_assignment_pattern("legacy_time").unwrap();
        assert_eq!(buffer.remove_matching(&pattern), 0);
        assert_eq!(buffer.content(), "[dependencies]\nlog = \"0.4\"\n");
    }

    #[test]
    fn unpin_then_repin_is_stable_across_runs() {
        let mut buffer = ManifestBuffer::new("Cargo.toml", MANIFEST);
        let pattern = key_assignment_pattern("legacy_time").unwrap();

        for _ in 0..2 {
            buffer.remove_matching(&pattern);
            buffer.append_line(PINNED);
        }

        assert_eq!(buffer.count_matching(&pattern), 1);
        assert!(buffer.content().ends_with(&format!("{}\n", PINNED)));
        buffer.parse().unwrap();
    }

    #[test]
    fn repeated_append_duplicates_the_line() {
        let mut buffer = ManifestBuffer::new("Cargo.toml", "[dependencies]\n");
        let pattern = key_assignment_pattern("legacy_time").unwrap();
        buffer.append_line(PINNED);
        buffer.append_line(PINNED);
        assert_eq!(buffer.count_matching(&pattern), 2);
        assert!(matches!(buffer.parse(), Err(ChoresError::Manifest(_))));
    }

    #[test]
    fn append_adds_missing_newline_first() {
        let mut buffer = ManifestBuffer::new("Cargo.toml", "[dependencies]\nlog = \"0.4\"");
        buffer.append_line(PINNED);
        assert_eq!(
            buffer.content(),
            format!("[dependencies]\nlog = \"0.4\"\n{}\n", PINNED)
        );
    }

    #[test]
    fn crlf_lines_are_matched() {
        let mut buffer = ManifestBuffer::new(
            "Cargo.toml",
            "[dependencies]\r\nlegacy_time = \"0.1\"\r\nlog = \"0.4\"\r\n",
        );
        let pattern = key_assignment_pattern("legacy_time").unwrap();
        assert_eq!(buffer.remove_matching(&pattern), 1);
        assert_eq!(buffer.content(), "[dependencies]\r\nlog = \"0.4\"\r\n");
    }

    #[test]
    fn load_and_save_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, MANIFEST).unwrap();

        let mut buffer = ManifestBuffer::load(&path).unwrap();
        buffer.remove_matching(&key_assignment_pattern("legacy_time").unwrap());
        buffer.save().unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("legacy_time"));
    }

    #[test]
    fn load_missing_manifest_fails() {
        let dir = tempdir().unwrap();
        let err = ManifestBuffer::load(dir.path().join("Cargo.toml")).unwrap_err();
        assert!(matches!(err, ChoresError::Manifest(_)));
    }
}
