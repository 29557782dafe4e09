//! store
//!
//! Content-addressed repository store.
//!
//! Each remote origin gets one bare-ish working clone under the store
//! directory, keyed by the SHA-256 of the normalized origin so arbitrary
//! URLs map to stable filesystem names. A per-repository advisory lock
//! serializes clone and fetch so concurrent invocations in the same
//! project never corrupt a clone in progress.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::types::{Origin, Revision};
use crate::git::{GitError, Repo};
use crate::remote::{resolve_remote_access, AccessError};
use crate::ui::{sanitize_origin, Logger};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("store lock for {origin}: {source}")]
    Lock {
        origin: String,
        #[source]
        source: io::Error,
    },

    #[error("store io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The on-disk repository store.
pub struct Store {
    dir: PathBuf,
    logger: Logger,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>, logger: Logger) -> Self {
        Store {
            dir: dir.into(),
            logger,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable filesystem key for an origin.
    pub fn repo_key(origin: &Origin) -> String {
        let mut hasher = Sha256::new();
        hasher.update(origin.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Path of the clone for `origin`, whether or not it exists yet.
    pub fn repo_path(&self, origin: &Origin) -> PathBuf {
        self.dir.join(Self::repo_key(origin))
    }

    /// Ensure a clone of `origin` exists and is up to date.
    ///
    /// Clones on first use, fetches branches and tags afterwards. Holds
    /// the per-repository lock for the duration.
    pub fn ensure(&self, origin: &Origin) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.repo_path(origin);
        let _lock = self.lock_repo(origin)?;

        let access = resolve_remote_access(origin.as_str())?;
        if path.join(".git").exists() {
            let repo = Repo::open(&path)?;
            // A key collision across a rewritten URL leaves a stale mirror;
            // re-clone rather than fetching from the wrong remote.
            if repo.origin_url()?.as_deref() == Some(access.url.as_str()) {
                self.logger
                    .debug(format!("fetching {}", sanitize_origin(origin.as_str())));
                repo.fetch_origin(access.callbacks())?;
                return Ok(path);
            }
            drop(repo);
            fs::remove_dir_all(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        }

        self.logger
            .debug(format!("cloning {}", sanitize_origin(origin.as_str())));
        Repo::clone(access.url.as_str(), &path, access.callbacks())?;

        Ok(path)
    }

    /// Check out `rev` in the clone for `origin`, detaching HEAD.
    pub fn checkout(&self, origin: &Origin, rev: &str) -> Result<(), StoreError> {
        let path = self.repo_path(origin);
        let _lock = self.lock_repo(origin)?;
        let repo = Repo::open(&path)?;
        repo.checkout_force(rev)?;
        Ok(())
    }

    /// HEAD revision of the clone at `path`.
    pub fn head(&self, path: &Path) -> Result<Revision, StoreError> {
        let repo = Repo::open(path)?;
        Ok(repo.head_rev()?)
    }

    /// Remove the clone for `origin`, if present.
    pub fn remove(&self, origin: &Origin) -> Result<(), StoreError> {
        let path = self.repo_path(origin);
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|source| StoreError::Io { path, source })?;
        }
        Ok(())
    }

    fn lock_repo(&self, origin: &Origin) -> Result<fs::File, StoreError> {
        let lock_path = self.dir.join(format!("{}.lock", Self::repo_key(origin)));
        let file = fs::File::create(&lock_path).map_err(|source| StoreError::Lock {
            origin: sanitize_origin(origin.as_str()),
            source,
        })?;
        file.lock_exclusive().map_err(|source| StoreError::Lock {
            origin: sanitize_origin(origin.as_str()),
            source,
        })?;
        Ok(file)
    }
}
