//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Origin`] - Normalized identity of a dependency source
//! - [`Revision`] - Full commit hash
//!
//! Origin equality is the sole identity key used by the lock set, the
//! replace map and the store, so normalization happens exactly once, at
//! construction time.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Normalized identity of a dependency's source.
///
/// Remote origins are normalized by stripping a trailing `.git` and a
/// trailing slash; local origins are normalized to a cleaned path. Two
/// spellings of the same source compare equal after normalization:
///
/// ```
/// use skillsync::core::types::Origin;
///
/// let a = Origin::new("https://github.com/acme/skills.git");
/// let b = Origin::new("https://github.com/acme/skills/");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Origin(String);

impl Origin {
    /// Create a normalized origin from a raw origin string.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize_origin(raw.as_ref()))
    }

    /// Get the normalized origin string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this origin names a remote repository (as opposed to a
    /// local directory).
    pub fn is_remote(&self) -> bool {
        is_remote_origin(&self.0)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Origin {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.0
    }
}

/// A full commit hash. Immutable, content-addressed by git.
pub type Revision = String;

/// Whether a raw origin string names a remote repository.
///
/// Recognizes `git://`, `http(s)://` and `ssh://` URLs plus scp-like
/// `user@host:path` syntax. Everything else is a local path.
pub fn is_remote_origin(origin: &str) -> bool {
    if let Some(scheme) = origin_scheme(origin) {
        return matches!(scheme.as_str(), "git" | "http" | "https" | "ssh");
    }
    is_scp_like(origin)
}

/// Extract the lowercase scheme of a URL-shaped origin, if any.
pub(crate) fn origin_scheme(origin: &str) -> Option<String> {
    let index = origin.find("://")?;
    if index == 0 {
        return None;
    }
    Some(origin[..index].to_ascii_lowercase())
}

/// Match scp-like `user@host:path` remote syntax.
pub(crate) fn is_scp_like(origin: &str) -> bool {
    let Some(at) = origin.find('@') else {
        return false;
    };
    if at == 0 {
        return false;
    }
    origin[at + 1..].contains(':') && !origin[at + 1..].starts_with(':')
}

fn normalize_origin(origin: &str) -> String {
    let trimmed = origin.trim_end_matches('/');
    let trimmed = trimmed
        .strip_suffix(".git")
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if is_remote_origin(origin) {
        return trimmed.to_string();
    }

    clean_path(Path::new(trimmed)).to_string_lossy().into_owned()
}

/// Lexically clean a path: drop `.` components and fold `..` where a
/// parent component is available to consume.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Fold only against a real parent. Above the root the
                // component drops; a relative prefix keeps stacking.
                match cleaned.components().next_back() {
                    Some(Component::Normal(_)) => {
                        cleaned.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => cleaned.push(".."),
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}
