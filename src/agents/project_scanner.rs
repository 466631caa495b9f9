use crate::error::{ChoresError, Result};
use std::path::{Path, PathBuf};

/// ProjectScannerAgent validates the project layout before any cargo call
pub struct ProjectScannerAgent {
    project_path: PathBuf,
}

impl ProjectScannerAgent {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
        }
    }

    /// Resolves the project directory and the manifest that lives in it
    pub fn validate(&self, manifest: &Path) -> Result<ProjectInfo> {
        let project_path = self.project_dir()?;
        let manifest_path = Self::manifest_in(&project_path, manifest)?;
        let has_lockfile = project_path.join("Cargo.lock").is_file();

        Ok(ProjectInfo {
            project_path,
            manifest_path,
            has_lockfile,
        })
    }

    fn project_dir(&self) -> Result<PathBuf> {
        let resolved = self.project_path.canonicalize().map_err(|e| {
            ChoresError::ProjectValidation(format!(
                "Cannot open project '{}': {e}",
                self.project_path.display()
            ))
        })?;

        if resolved.is_dir() {
            Ok(resolved)
        } else {
            Err(ChoresError::ProjectValidation(format!(
                "Project path '{}' is not a directory",
                resolved.display()
            )))
        }
    }

    // The manifest is rewritten in place, so it has to resolve under the project.
    fn manifest_in(project_path: &Path, manifest: &Path) -> Result<PathBuf> {
        let candidate = project_path.join(manifest);
        if !candidate.is_file() {
            return Err(ChoresError::ProjectValidation(format!(
                "{} not found in '{}'",
                manifest.display(),
                project_path.display()
            )));
        }

        let resolved = candidate.canonicalize()?;
        if !resolved.starts_with(project_path) {
            return Err(ChoresError::ProjectValidation(format!(
                "{} resolves outside '{}'",
                manifest.display(),
                project_path.display()
            )));
        }

        Ok(resolved)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub project_path: PathBuf,
    pub manifest_path: PathBuf,
    pub has_lockfile: bool,
}
