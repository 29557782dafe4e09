//! resolve
//!
//! Origin resolution orchestrator.
//!
//! Ties the store, the version resolver and the lock together: for each
//! requested origin it produces a checked-out working tree at a concrete
//! revision, keeping the lock consistent along the way.
//!
//! # Lock discipline
//!
//! - Pseudo-versions embed a commit prefix. A lock entry whose revision
//!   does not start with that prefix is corrupt and always fails.
//! - Semver tags can move upstream. In strict mode a moved tag fails;
//!   otherwise the lock is re-pinned and the change reported.
//! - Replaced origins are local working trees. They are never checked
//!   out by us; a HEAD that differs from the resolved revision only
//!   produces a warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::lock::{LockKey, LockSet};
use crate::core::types::{Origin, Revision};
use crate::git::{GitError, Repo};
use crate::store::{Store, StoreError};
use crate::ui::{sanitize_origin, Logger};
use crate::version::pseudo::{is_pseudo_version, pseudo_version_rev};
use crate::version::resolve::{resolve_for_version, ResolveError};
use crate::version::is_valid_tag;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum OriginResolveError {
    /// A semver tag no longer points at the locked revision (strict mode).
    #[error(
        "version {version} of {origin} moved: locked {locked}, now {resolved} \
         (run update to accept the new revision)"
    )]
    VersionMoved {
        origin: String,
        version: String,
        locked: Revision,
        resolved: Revision,
    },

    /// The locked revision contradicts the commit embedded in a
    /// pseudo-version. The lock is corrupt.
    #[error("lock entry for {origin}@{version} does not match the pinned commit ({locked})")]
    LockMismatch {
        origin: String,
        version: String,
        locked: Revision,
    },

    #[error("invalid version {version:?} for {origin}")]
    InvalidVersion { origin: String, version: String },

    #[error(transparent)]
    Version(#[from] ResolveError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Types
// ============================================================================

/// How an origin's working tree was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// Checked out from the managed store at the resolved revision.
    ManagedStore,
    /// A local directory named in the replace table, used as-is.
    ReplacedLocal,
}

/// A resolved origin: where its files live and which revision they are at.
#[derive(Debug, Clone)]
pub struct OriginResolution {
    pub origin: Origin,
    pub version: String,
    pub path: PathBuf,
    pub rev: Revision,
    pub kind: ResolutionKind,
}

/// The result of resolving a whole request set.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    pub resolutions: Vec<OriginResolution>,
    pub lock_changed: bool,
    pub warnings: Vec<String>,
}

// ============================================================================
// Lock-consistent revision resolution
// ============================================================================

/// Resolve `version` of `origin` against `repo`, consulting and updating
/// the lock. Returns the revision and whether the lock changed.
pub fn resolve_revision(
    repo: &Repo,
    origin: &Origin,
    version: &str,
    lock: &mut LockSet,
    strict: bool,
) -> Result<(Revision, bool), OriginResolveError> {
    let key = LockKey::new(origin.clone(), version);

    if is_pseudo_version(version) {
        let prefix = pseudo_version_rev(version).ok_or_else(|| {
            OriginResolveError::InvalidVersion {
                origin: sanitize_origin(origin.as_str()),
                version: version.to_string(),
            }
        })?;

        if let Some(locked) = lock.get(&key) {
            if !locked.starts_with(prefix) {
                return Err(OriginResolveError::LockMismatch {
                    origin: sanitize_origin(origin.as_str()),
                    version: version.to_string(),
                    locked: locked.clone(),
                });
            }
            if repo.commit_exists(locked) {
                return Ok((locked.clone(), false));
            }
        }

        let rev = resolve_for_version(repo, version)?;
        let changed = lock.pin(key, rev.clone());
        return Ok((rev, changed));
    }

    if is_valid_tag(version) {
        let resolved = resolve_for_version(repo, version)?;

        if let Some(locked) = lock.get(&key) {
            if locked == &resolved {
                return Ok((resolved, false));
            }
            if strict {
                return Err(OriginResolveError::VersionMoved {
                    origin: sanitize_origin(origin.as_str()),
                    version: version.to_string(),
                    locked: locked.clone(),
                    resolved,
                });
            }
        }

        let changed = lock.pin(key, resolved.clone());
        return Ok((resolved, changed));
    }

    Err(OriginResolveError::InvalidVersion {
        origin: sanitize_origin(origin.as_str()),
        version: version.to_string(),
    })
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Resolves a set of origins into checked-out working trees.
pub struct OriginResolver<'a> {
    store: &'a Store,
    logger: Logger,
}

impl<'a> OriginResolver<'a> {
    pub fn new(store: &'a Store, logger: Logger) -> Self {
        OriginResolver { store, logger }
    }

    /// Resolve every requested origin, honoring the replace table.
    ///
    /// Iteration order is the map order, so output and lock updates are
    /// deterministic. A failing replace path degrades to the store with a
    /// warning rather than failing the run.
    pub fn resolve_origins(
        &self,
        requests: &BTreeMap<Origin, String>,
        replace: &BTreeMap<Origin, PathBuf>,
        lock: &mut LockSet,
        strict: bool,
    ) -> Result<ResolveOutcome, OriginResolveError> {
        let mut outcome = ResolveOutcome::default();

        for (origin, version) in requests {
            let resolution = match replace.get(origin) {
                Some(path) => match self.resolve_replaced(origin, version, path, lock, strict) {
                    Ok((resolution, changed, warnings)) => {
                        outcome.lock_changed |= changed;
                        outcome.warnings.extend(warnings);
                        Some(resolution)
                    }
                    Err(reason) => {
                        let warning = format!(
                            "replace path {} for {} is unusable ({reason}), using store",
                            path.display(),
                            sanitize_origin(origin.as_str()),
                        );
                        self.logger.warn(&warning);
                        outcome.warnings.push(warning);
                        None
                    }
                },
                None => None,
            };

            let resolution = match resolution {
                Some(resolution) => resolution,
                None => {
                    let (resolution, changed) =
                        self.resolve_managed(origin, version, lock, strict)?;
                    outcome.lock_changed |= changed;
                    resolution
                }
            };

            outcome.resolutions.push(resolution);
        }

        Ok(outcome)
    }

    fn resolve_managed(
        &self,
        origin: &Origin,
        version: &str,
        lock: &mut LockSet,
        strict: bool,
    ) -> Result<(OriginResolution, bool), OriginResolveError> {
        let path = self.store.ensure(origin)?;
        let repo = Repo::open(&path)?;
        let (rev, changed) = resolve_revision(&repo, origin, version, lock, strict)?;

        self.logger.debug(format!(
            "{} {}@{} -> {}",
            path.display(),
            sanitize_origin(origin.as_str()),
            version,
            rev
        ));
        self.store.checkout(origin, &rev)?;

        Ok((
            OriginResolution {
                origin: origin.clone(),
                version: version.to_string(),
                path,
                rev,
                kind: ResolutionKind::ManagedStore,
            },
            changed,
        ))
    }

    /// Resolve from a replace path. Any failure here is the reason string
    /// of an `Err`; the caller downgrades it to a warning and retries
    /// against the managed store, where a real lock problem surfaces the
    /// same way it would without the replace.
    fn resolve_replaced(
        &self,
        origin: &Origin,
        version: &str,
        path: &Path,
        lock: &mut LockSet,
        strict: bool,
    ) -> Result<(OriginResolution, bool, Vec<String>), String> {
        if !path.is_dir() {
            return Err("directory missing".to_string());
        }

        let repo = Repo::open(path).map_err(|err| err.to_string())?;

        let (rev, changed) =
            resolve_revision(&repo, origin, version, lock, strict).map_err(|err| err.to_string())?;

        // Never touch the user's working tree, only report divergence.
        let mut warnings = Vec::new();
        match repo.head_rev() {
            Ok(head) if head != rev => {
                let warning = format!(
                    "replace path {} for {} is at {head}, expected {rev}",
                    path.display(),
                    sanitize_origin(origin.as_str()),
                );
                self.logger.warn(&warning);
                warnings.push(warning);
            }
            Ok(_) => {}
            Err(err) => return Err(err.to_string()),
        }

        Ok((
            OriginResolution {
                origin: origin.clone(),
                version: version.to_string(),
                path: path.to_path_buf(),
                rev,
                kind: ResolutionKind::ReplacedLocal,
            },
            changed,
            warnings,
        ))
    }
}
