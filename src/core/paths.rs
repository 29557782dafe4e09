//! core::paths
//!
//! Centralized path routing for skillsync storage locations.
//!
//! All storage locations are computed here so no other module hard-codes
//! directory names. A project keeps its managed state under `.skillsync/`
//! beside the manifest; the default link target is `skills/` at the
//! project root.
//!
//! # Example
//!
//! ```
//! use skillsync::core::paths::ProjectPaths;
//! use std::path::{Path, PathBuf};
//!
//! let paths = ProjectPaths::new(Path::new("/project"));
//! assert_eq!(paths.store_dir(), PathBuf::from("/project/.skillsync/store"));
//! assert_eq!(paths.skills_dir(), PathBuf::from("/project/skills"));
//! ```

use std::path::{Path, PathBuf};

/// Storage layout for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// The project root (the directory holding the manifest).
    pub root: PathBuf,
}

impl ProjectPaths {
    /// Create the path layout for a project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of all managed state for this project.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".skillsync")
    }

    /// Directory holding mirror clones of remote origins.
    pub fn store_dir(&self) -> PathBuf {
        self.state_dir().join("store")
    }

    /// Default symlink target directory for installed skills.
    pub fn skills_dir(&self) -> PathBuf {
        self.root.join("skills")
    }

    /// Path to the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("skills.json")
    }

    /// Path to the lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("skills-lock.json")
    }
}

/// Walk upward from `start` looking for a directory containing a manifest.
///
/// Returns the manifest path when found.
pub fn find_manifest_upward(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join("skills.json");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
