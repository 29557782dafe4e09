//! manifest::state
//!
//! Project state: the manifest and lock located and loaded as one unit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::lock::{LockError, LockSet};
use crate::core::paths::{find_manifest_upward, ProjectPaths};
use crate::manifest::{Manifest, ManifestError};

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("state io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything a command needs about the current project.
#[derive(Debug)]
pub struct State {
    pub paths: ProjectPaths,
    pub manifest: Manifest,
    pub lock: LockSet,
}

impl State {
    /// Locate the manifest by walking up from `start` and load it together
    /// with the lock file beside it.
    pub fn load(start: &Path) -> Result<Self, StateError> {
        let manifest_path =
            find_manifest_upward(start).ok_or_else(|| ManifestError::NotFound {
                start: start.to_path_buf(),
            })?;
        // find_manifest_upward returns <root>/skills.json
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::load_at(&root)
    }

    /// Like [`State::load`], but an absent manifest starts an empty
    /// project rooted at `start` instead of failing. The second value is
    /// whether the state was initialized fresh.
    pub fn load_or_init(start: &Path) -> Result<(Self, bool), StateError> {
        match find_manifest_upward(start) {
            Some(manifest_path) => {
                let root = manifest_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok((Self::load_at(&root)?, false))
            }
            None => Ok((
                State {
                    paths: ProjectPaths::new(start),
                    manifest: Manifest::default(),
                    lock: LockSet::new(),
                },
                true,
            )),
        }
    }

    /// Load the project rooted at `root` directly.
    pub fn load_at(root: &Path) -> Result<Self, StateError> {
        let paths = ProjectPaths::new(root);
        let manifest = Manifest::load(&paths.manifest_path())?;
        let lock = LockSet::load(&paths.lock_path())?;

        Ok(State {
            paths,
            manifest,
            lock,
        })
    }

    /// Persist the manifest and the lock together.
    pub fn save(&self) -> Result<(), StateError> {
        self.manifest.save(&self.paths.manifest_path())?;
        self.save_lock()
    }

    /// Persist the lock. An empty lock means the file is removed rather
    /// than written out empty.
    pub fn save_lock(&self) -> Result<(), StateError> {
        let path = self.paths.lock_path();
        if self.lock.is_empty() {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StateError::Io { path, source }),
            }
        } else {
            Ok(self.lock.save(&path)?)
        }
    }
}
