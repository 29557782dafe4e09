//! version::resolve
//!
//! Ref and version resolution against an open repository.
//!
//! `resolve_for_ref` turns any human-supplied ref into a `(version,
//! revision)` pair; `resolve_for_version` turns an already-pinned version
//! string back into its revision. Interpretation order for a free-form ref:
//! fully-qualified reference, then unique hash prefix (12 hex chars or
//! more), then local branch, then tracked remote branch. First successful
//! interpretation wins.
//!
//! When a concrete commit must be reported as a version and no tag points
//! at it exactly, the nearest ancestor tag is found by breadth-first
//! traversal of parent edges, expanding strictly level by level and
//! stopping at the first depth that carries any tag. All tags at that
//! minimal depth are candidates; the maximum by semver precedence becomes
//! the pseudo-version's base.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::core::types::Revision;
use crate::git::{GitError, Repo};
use crate::version::pseudo::{
    is_pseudo_version, pseudo_version, pseudo_version_rev, SHORT_HASH_LEN,
};

/// A resolved ref: the reportable version and the concrete revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub version: String,
    pub rev: Revision,
}

/// Errors from version resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A version tag was requested but no such tag exists.
    #[error("tag {tag:?} not found")]
    TagNotFound { tag: String },

    /// A free-form ref matched none of the interpretations.
    #[error("ref {refname:?} not found")]
    RefNotFound { refname: String },

    /// A version string is neither valid semver nor a pseudo-version.
    #[error("version {version:?} is not valid")]
    InvalidVersion { version: String },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Resolve a ref string to a version and revision.
///
/// An empty ref resolves the repository's current head.
pub fn resolve_for_ref(repo: &Repo, refspec: &str) -> Result<Resolved, ResolveError> {
    if refspec.is_empty() {
        let rev = repo.head_rev()?;
        return resolve_from_commit(repo, &rev);
    }

    if is_pseudo_version(refspec) {
        let rev = resolve_for_version(repo, refspec)?;
        return Ok(Resolved {
            version: refspec.to_string(),
            rev,
        });
    }

    if crate::version::is_valid_tag(refspec) {
        let rev = tag_commit(repo, refspec)?;
        return Ok(Resolved {
            version: refspec.to_string(),
            rev,
        });
    }

    let rev = commit_for_ref(repo, refspec)?;
    resolve_from_commit(repo, &rev)
}

/// Resolve an already-pinned version string to its revision.
///
/// Accepts exactly two shapes: a pseudo-version (resolved through its
/// embedded revision prefix) or a valid semver tag (resolved through an
/// exact tag lookup). Anything else is invalid input.
pub fn resolve_for_version(repo: &Repo, version: &str) -> Result<Revision, ResolveError> {
    if is_pseudo_version(version) {
        let prefix = pseudo_version_rev(version).ok_or_else(|| ResolveError::InvalidVersion {
            version: version.to_string(),
        })?;
        return Ok(repo.commit_for_prefix(prefix)?);
    }

    if crate::version::is_valid_tag(version) {
        return tag_commit(repo, version);
    }

    Err(ResolveError::InvalidVersion {
        version: version.to_string(),
    })
}

/// Convert a concrete commit into a reportable version.
fn resolve_from_commit(repo: &Repo, rev: &str) -> Result<Resolved, ResolveError> {
    let tags_by_commit = semver_tags_by_commit(repo)?;

    if let Some(tags) = tags_by_commit.get(rev) {
        // max_tag of a non-empty valid set always yields a value.
        if let Some(version) = crate::version::max_tag(tags) {
            return Ok(Resolved {
                version,
                rev: rev.to_string(),
            });
        }
    }

    let base = base_version(repo, rev, &tags_by_commit)?;
    let major = base
        .as_deref()
        .and_then(crate::version::tag_major)
        .unwrap_or_else(|| "v0".to_string());
    let when = repo.committer_time(rev)?;
    let short = &rev[..SHORT_HASH_LEN.min(rev.len())];

    Ok(Resolved {
        version: pseudo_version(&major, base.as_deref().unwrap_or(""), when, short),
        rev: rev.to_string(),
    })
}

fn tag_commit(repo: &Repo, tag: &str) -> Result<Revision, ResolveError> {
    match repo.tag_commit(tag) {
        Ok(rev) => Ok(rev),
        Err(GitError::RefNotFound { .. }) => Err(ResolveError::TagNotFound {
            tag: tag.to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}

fn commit_for_ref(repo: &Repo, refspec: &str) -> Result<Revision, ResolveError> {
    if refspec.starts_with("refs/") {
        return match repo.reference_commit(refspec) {
            Ok(rev) => Ok(rev),
            Err(GitError::RefNotFound { refname }) => Err(ResolveError::RefNotFound { refname }),
            Err(err) => Err(err.into()),
        };
    }

    if refspec.len() >= SHORT_HASH_LEN && is_hex(refspec) {
        return Ok(repo.commit_for_prefix(refspec)?);
    }

    if let Ok(rev) = repo.branch_commit(refspec) {
        return Ok(rev);
    }
    if let Ok(rev) = repo.remote_branch_commit("origin", refspec) {
        return Ok(rev);
    }

    Err(ResolveError::RefNotFound {
        refname: refspec.to_string(),
    })
}

/// Canonical semver tags grouped by the commit they (after peeling) point at.
fn semver_tags_by_commit(repo: &Repo) -> Result<HashMap<Revision, Vec<String>>, ResolveError> {
    let mut tags: HashMap<Revision, Vec<String>> = HashMap::new();
    for (name, rev) in repo.tags()? {
        let Some(canonical) = crate::version::canonical_tag(&name) else {
            continue;
        };
        tags.entry(rev).or_default().push(canonical);
    }
    Ok(tags)
}

/// Nearest-ancestor tag by breadth-first search over parent edges.
///
/// The queue expands strictly level by level; once any tagged commit is
/// found at a depth, commits at deeper levels are never expanded, and all
/// tags at that minimal depth compete. The visited set guards against
/// re-expanding diamonds.
fn base_version(
    repo: &Repo,
    rev: &str,
    tags: &HashMap<Revision, Vec<String>>,
) -> Result<Option<String>, ResolveError> {
    let mut queue: VecDeque<(Revision, usize)> = VecDeque::new();
    let mut visited: HashSet<Revision> = HashSet::new();
    queue.push_back((rev.to_string(), 0));
    visited.insert(rev.to_string());

    let mut best_depth: Option<usize> = None;
    let mut candidates: Vec<String> = Vec::new();

    while let Some((hash, depth)) = queue.pop_front() {
        if let Some(best) = best_depth {
            if depth > best {
                break;
            }
        }

        if let Some(found) = tags.get(&hash) {
            match best_depth {
                None => {
                    best_depth = Some(depth);
                    candidates = found.clone();
                }
                Some(best) if depth < best => {
                    best_depth = Some(depth);
                    candidates = found.clone();
                }
                Some(best) if depth == best => {
                    candidates.extend(found.iter().cloned());
                }
                Some(_) => {}
            }
        }

        if let Some(best) = best_depth {
            if depth >= best {
                continue;
            }
        }

        for parent in repo.parent_revs(&hash)? {
            if visited.insert(parent.clone()) {
                queue.push_back((parent, depth + 1));
            }
        }
    }

    Ok(crate::version::max_tag(candidates))
}

fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_detection() {
        assert!(is_hex("abcdef012345"));
        assert!(is_hex("ABCDEF012345"));
        assert!(!is_hex("abcdefg"));
        assert!(!is_hex(""));
    }
}
