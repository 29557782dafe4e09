//! remote::refs
//!
//! Remote ref listing without a clone.
//!
//! Used to validate ref existence before paying for a clone and to
//! disambiguate ref names that themselves contain `/` (a branch named
//! `release/2024` vs. a path under branch `release`) by longest-prefix
//! match against the advertised ref set.

use std::collections::HashSet;

use thiserror::Error;

use crate::core::types::Revision;
use crate::remote::access::{resolve_remote_access, AccessError};
use crate::ui::sanitize_origin;

/// Errors from remote ref listing.
#[derive(Debug, Error)]
pub enum RefsError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("list remote refs for {origin}: {message}")]
    List { origin: String, message: String },

    #[error("remote head not found for {origin}")]
    HeadNotFound { origin: String },
}

/// The advertised refs of a remote, split by kind. Names are short
/// (without the `refs/heads/` / `refs/tags/` prefix).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefIndex {
    pub all: HashSet<String>,
    pub branches: HashSet<String>,
    pub tags: HashSet<String>,
}

impl RefIndex {
    /// Split `path` into a known ref name and a trailing sub-path, by
    /// longest-prefix match against the ref set. `release/2024/docs`
    /// resolves to `("release/2024", "docs")` when `release/2024` is an
    /// advertised ref, even if `release` is one too.
    pub fn split_ref_prefix<'a>(&self, path: &'a str) -> Option<(&str, &'a str)> {
        let mut best: Option<&str> = None;
        for name in &self.all {
            let matches = path == name.as_str()
                || path
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('/'));
            if !matches {
                continue;
            }
            match best {
                Some(current) if current.len() >= name.len() => {}
                _ => best = Some(name),
            }
        }

        best.map(|name| {
            let rest = path[name.len()..].trim_start_matches('/');
            (name, rest)
        })
    }
}

struct RemoteRef {
    name: String,
    oid: Option<Revision>,
    symref_target: Option<String>,
}

/// List the branches and tags a remote advertises.
pub fn list_remote_refs(origin: &str) -> Result<RefIndex, RefsError> {
    let refs = advertised_refs(origin)?;

    let mut index = RefIndex::default();
    for remote_ref in refs {
        // Peeled tag entries (`<name>^{}`) duplicate the base tag.
        if remote_ref.name.ends_with("^{}") {
            continue;
        }
        if let Some(name) = remote_ref.name.strip_prefix("refs/heads/") {
            index.all.insert(name.to_string());
            index.branches.insert(name.to_string());
        } else if let Some(name) = remote_ref.name.strip_prefix("refs/tags/") {
            index.all.insert(name.to_string());
            index.tags.insert(name.to_string());
        }
    }

    Ok(index)
}

/// Resolve the remote's HEAD commit without cloning.
///
/// Prefers the advertised HEAD hash; chases a symbolic HEAD to its target
/// ref when the hash is absent.
pub fn remote_head(origin: &str) -> Result<Revision, RefsError> {
    let refs = advertised_refs(origin)?;

    let head = refs
        .iter()
        .find(|r| r.name == "HEAD")
        .ok_or_else(|| RefsError::HeadNotFound {
            origin: sanitize_origin(origin),
        })?;

    if let Some(oid) = &head.oid {
        return Ok(oid.clone());
    }
    if let Some(target) = &head.symref_target {
        if let Some(resolved) = refs
            .iter()
            .find(|r| &r.name == target)
            .and_then(|r| r.oid.clone())
        {
            return Ok(resolved);
        }
    }

    Err(RefsError::HeadNotFound {
        origin: sanitize_origin(origin),
    })
}

fn advertised_refs(origin: &str) -> Result<Vec<RemoteRef>, RefsError> {
    let access = resolve_remote_access(origin)?;

    let list_err = |err: git2::Error| RefsError::List {
        origin: sanitize_origin(origin),
        message: err.message().to_string(),
    };

    let mut remote = git2::Remote::create_detached(access.url.as_str()).map_err(list_err)?;
    remote
        .connect_auth(git2::Direction::Fetch, access.callbacks(), None)
        .map_err(list_err)?;

    let refs = remote
        .list()
        .map_err(list_err)?
        .iter()
        .map(|head| RemoteRef {
            name: head.name().to_string(),
            oid: if head.oid().is_zero() {
                None
            } else {
                Some(head.oid().to_string())
            },
            symref_target: head.symref_target().map(str::to_string),
        })
        .collect();

    Ok(refs)
}
