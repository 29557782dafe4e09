//! git::repo
//!
//! Repository access built on git2.
//!
//! # Error Handling
//!
//! Git failures are normalized into typed [`GitError`] variants so higher
//! layers can distinguish the cases the resolution engine cares about:
//! missing refs, missing commits, ambiguous hash prefixes. Everything else
//! is surfaced as [`GitError::Internal`] with context attached.
//!
//! # Example
//!
//! ```ignore
//! use skillsync::git::Repo;
//! use std::path::Path;
//!
//! let repo = Repo::open(Path::new("/store/abc123"))?;
//! let head = repo.head_rev()?;
//! println!("mirror is at {head}");
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::core::types::Revision;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path does not contain a git repository.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// A named reference does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// No commit matches the given hash or prefix.
    #[error("commit {prefix:?} not found")]
    CommitNotFound { prefix: String },

    /// More than one commit matches a short hash prefix.
    #[error("commit prefix {prefix:?} is ambiguous")]
    AmbiguousPrefix { prefix: String },

    /// Internal git2 error with context.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    fn internal(context: &str, err: git2::Error) -> Self {
        GitError::Internal {
            message: format!("{}: {}", context, err.message()),
        }
    }
}

/// A git repository handle.
///
/// All revision values crossing this boundary are full lowercase 40-hex
/// commit hashes; `git2` types never leak to callers, with the exception
/// of [`git2::RemoteCallbacks`] accepted by the network operations so the
/// remote-access layer can supply credentials.
pub struct Repo {
    inner: git2::Repository,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo").field("path", &self.inner.path()).finish()
    }
}

impl Repo {
    // =========================================================================
    // Opening, cloning, fetching
    // =========================================================================

    /// Open the repository at exactly `path` (no upward discovery; store
    /// mirrors and replace paths are exact locations).
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let inner = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { inner })
    }

    /// Clone `url` into `path`, downloading all tags.
    pub fn clone(
        url: &str,
        path: &Path,
        callbacks: Option<git2::RemoteCallbacks<'_>>,
    ) -> Result<Self, GitError> {
        let mut options = git2::FetchOptions::new();
        options.download_tags(git2::AutotagOption::All);
        if let Some(callbacks) = callbacks {
            options.remote_callbacks(callbacks);
        }

        let inner = git2::build::RepoBuilder::new()
            .fetch_options(options)
            .clone(url, path)
            .map_err(|err| GitError::internal(&format!("clone {url}"), err))?;
        Ok(Self { inner })
    }

    /// Fetch branches and tags from the `origin` remote.
    pub fn fetch_origin(
        &self,
        callbacks: Option<git2::RemoteCallbacks<'_>>,
    ) -> Result<(), GitError> {
        let mut remote = self
            .inner
            .find_remote("origin")
            .map_err(|err| GitError::internal("find remote origin", err))?;

        let mut options = git2::FetchOptions::new();
        options.download_tags(git2::AutotagOption::All);
        if let Some(callbacks) = callbacks {
            options.remote_callbacks(callbacks);
        }

        remote
            .fetch(
                &[
                    "+refs/heads/*:refs/remotes/origin/*",
                    "+refs/tags/*:refs/tags/*",
                ],
                Some(&mut options),
                None,
            )
            .map_err(|err| GitError::internal("fetch origin", err))
    }

    /// URL of the `origin` remote, if configured.
    pub fn origin_url(&self) -> Result<Option<String>, GitError> {
        match self.inner.find_remote("origin") {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(GitError::internal("read origin remote", err)),
        }
    }

    // =========================================================================
    // Commit lookup
    // =========================================================================

    /// Resolve HEAD to its commit hash.
    pub fn head_rev(&self) -> Result<Revision, GitError> {
        let head = self
            .inner
            .head()
            .map_err(|err| GitError::internal("read head", err))?;
        let commit = head
            .peel_to_commit()
            .map_err(|err| GitError::internal("load head commit", err))?;
        Ok(commit.id().to_string())
    }

    /// Whether `rev` names an existing commit.
    pub fn commit_exists(&self, rev: &str) -> bool {
        git2::Oid::from_str(rev)
            .ok()
            .and_then(|oid| self.inner.find_commit(oid).ok())
            .is_some()
    }

    /// The committer timestamp of `rev`, in UTC.
    pub fn committer_time(&self, rev: &str) -> Result<DateTime<Utc>, GitError> {
        let commit = self.find_commit(rev)?;
        let seconds = commit.committer().when().seconds();
        Utc.timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| GitError::Internal {
                message: format!("commit {rev} has an out-of-range timestamp"),
            })
    }

    /// The parent hashes of `rev`, in order.
    pub fn parent_revs(&self, rev: &str) -> Result<Vec<Revision>, GitError> {
        let commit = self.find_commit(rev)?;
        Ok(commit.parent_ids().map(|id| id.to_string()).collect())
    }

    /// Find the unique commit whose hash starts with `prefix`.
    ///
    /// # Errors
    ///
    /// - [`GitError::CommitNotFound`] when no commit matches
    /// - [`GitError::AmbiguousPrefix`] when more than one commit matches
    pub fn commit_for_prefix(&self, prefix: &str) -> Result<Revision, GitError> {
        let prefix = prefix.to_ascii_lowercase();

        if prefix.len() == 40 {
            let oid = git2::Oid::from_str(&prefix).map_err(|_| GitError::CommitNotFound {
                prefix: prefix.clone(),
            })?;
            return match self.inner.find_commit(oid) {
                Ok(commit) => Ok(commit.id().to_string()),
                Err(_) => Err(GitError::CommitNotFound { prefix }),
            };
        }

        let odb = self
            .inner
            .odb()
            .map_err(|err| GitError::internal("open object database", err))?;

        let mut candidates: Vec<git2::Oid> = Vec::new();
        odb.foreach(|oid| {
            if oid.to_string().starts_with(&prefix) {
                candidates.push(*oid);
            }
            true
        })
        .map_err(|err| GitError::internal("iterate objects", err))?;

        let mut found: Option<git2::Oid> = None;
        for oid in candidates {
            // Prefix matches may include trees and blobs; only commits count.
            if self.inner.find_commit(oid).is_err() {
                continue;
            }
            if found.is_some() {
                return Err(GitError::AmbiguousPrefix { prefix });
            }
            found = Some(oid);
        }

        match found {
            Some(oid) => Ok(oid.to_string()),
            None => Err(GitError::CommitNotFound { prefix }),
        }
    }

    // =========================================================================
    // References and tags
    // =========================================================================

    /// Resolve a fully-qualified reference (`refs/...`) to its commit.
    pub fn reference_commit(&self, refname: &str) -> Result<Revision, GitError> {
        let reference = self.inner.find_reference(refname).map_err(|_| {
            GitError::RefNotFound {
                refname: refname.to_string(),
            }
        })?;
        let commit = reference
            .peel_to_commit()
            .map_err(|err| GitError::internal(&format!("load commit for {refname}"), err))?;
        Ok(commit.id().to_string())
    }

    /// Resolve a tag by short name, dereferencing annotated tags to their
    /// target commit.
    pub fn tag_commit(&self, tag: &str) -> Result<Revision, GitError> {
        self.reference_commit(&format!("refs/tags/{tag}"))
    }

    /// Resolve a local branch by short name.
    pub fn branch_commit(&self, branch: &str) -> Result<Revision, GitError> {
        self.reference_commit(&format!("refs/heads/{branch}"))
    }

    /// Resolve a tracked remote branch by short name.
    pub fn remote_branch_commit(&self, remote: &str, branch: &str) -> Result<Revision, GitError> {
        self.reference_commit(&format!("refs/remotes/{remote}/{branch}"))
    }

    /// List all tags as `(short name, target commit)` pairs, with annotated
    /// tags peeled. Tags that do not point at commits are skipped.
    pub fn tags(&self) -> Result<Vec<(String, Revision)>, GitError> {
        let names = self
            .inner
            .tag_names(None)
            .map_err(|err| GitError::internal("list tags", err))?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            let Ok(reference) = self.inner.find_reference(&format!("refs/tags/{name}")) else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };
            tags.push((name.to_string(), commit.id().to_string()));
        }
        Ok(tags)
    }

    // =========================================================================
    // Worktree mutation
    // =========================================================================

    /// Force-checkout `rev` as a detached head.
    ///
    /// Only the store layer calls this, and only against mirrors the tool
    /// exclusively owns. Replace paths are never passed here.
    pub fn checkout_force(&self, rev: &str) -> Result<(), GitError> {
        let oid = git2::Oid::from_str(rev).map_err(|_| GitError::CommitNotFound {
            prefix: rev.to_string(),
        })?;
        let commit = self.inner.find_commit(oid).map_err(|_| GitError::CommitNotFound {
            prefix: rev.to_string(),
        })?;

        let mut options = git2::build::CheckoutBuilder::new();
        options.force();
        self.inner
            .checkout_tree(commit.as_object(), Some(&mut options))
            .map_err(|err| GitError::internal(&format!("checkout {rev}"), err))?;
        self.inner
            .set_head_detached(oid)
            .map_err(|err| GitError::internal(&format!("detach head at {rev}"), err))
    }

    fn find_commit(&self, rev: &str) -> Result<git2::Commit<'_>, GitError> {
        let oid = git2::Oid::from_str(rev).map_err(|_| GitError::CommitNotFound {
            prefix: rev.to_string(),
        })?;
        self.inner
            .find_commit(oid)
            .map_err(|_| GitError::CommitNotFound {
                prefix: rev.to_string(),
            })
    }
}
