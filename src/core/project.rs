//! Project discovery - locates the directory holding `.difftrack/`

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker directory at the project root
pub const STATE_DIR: &str = ".difftrack";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not a difftrack project (no {STATE_DIR}/ found in {0} or any parent). Run 'difftrack init' first.")]
    NotFound(PathBuf),

    #[error("Project already initialized at {0} (use --force to overwrite)")]
    AlreadyInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A difftrack project rooted at a directory
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Find the project containing `start`, walking up through parents
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(STATE_DIR).is_dir())
            .map(|dir| Self {
                root: dir.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create the state directory under `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        Self::init_with(root, false)
    }

    /// Create the state directory, optionally reusing an existing one
    pub fn init_with(root: &Path, force: bool) -> Result<Self, ProjectError> {
        let state = root.join(STATE_DIR);
        if state.is_dir() && !force {
            return Err(ProjectError::AlreadyInitialized(root.to_path_buf()));
        }
        std::fs::create_dir_all(&state)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join("config.yaml")
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir().join("session.yaml")
    }

    /// Resolve a possibly relative path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_and_discover() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(project.state_dir().is_dir());

        let nested = tmp.path().join("images/run1");
        std::fs::create_dir_all(&nested).unwrap();
        let found = Project::discover_from(&nested).unwrap();
        assert_eq!(found.root(), tmp.path());
    }

    #[test]
    fn test_init_twice_requires_force() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        assert!(matches!(
            Project::init(tmp.path()),
            Err(ProjectError::AlreadyInitialized(_))
        ));
        assert!(Project::init_with(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_discover_outside_project() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path()),
            Err(ProjectError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_relative() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert_eq!(
            project.resolve(Path::new("protocol.csv")),
            tmp.path().join("protocol.csv")
        );
    }
}
