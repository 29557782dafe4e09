//! sync
//!
//! Symlink synchronizer.
//!
//! Materializes resolved skills into target directories as symlinks
//! pointing into the store (or a replace path). The engine is
//! idempotent: a link that already points at the right place is left
//! untouched, so repeated runs report zero work.
//!
//! Names may contain `/` and become nested paths under the target, but
//! are validated so a hostile name can never escape the target
//! directory.

pub mod prune;

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub use prune::{prune, sync_and_prune};

// ============================================================================
// Types
// ============================================================================

/// A named source directory to expose under each target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Relative path under the target, e.g. `"alpha"` or `"author/beta"`.
    pub name: String,
    /// Directory the symlink should point at.
    pub path: PathBuf,
}

/// A non-fatal problem encountered while syncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// The filesystem entry the warning is about, when there is one.
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Warning {
    fn at(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Warning {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    fn general(message: impl Into<String>) -> Self {
        Warning {
            path: None,
            message: message.into(),
        }
    }
}

/// What a sync pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Symlinks created or repointed.
    pub linked: usize,
    /// Entries removed (orphan links, empty directories).
    pub removed: usize,
    pub warnings: Vec<Warning>,
}

impl SyncReport {
    fn merge(&mut self, other: SyncReport) {
        self.linked += other.linked;
        self.removed += other.removed;
        self.warnings.extend(other.warnings);
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("empty skill name")]
    EmptyName,

    #[error("skill name {name:?} is absolute")]
    AbsoluteName { name: String },

    #[error("skill name {name:?} contains an invalid path segment")]
    InvalidName { name: String },

    #[error("target {path} exists and is not a directory")]
    TargetNotDirectory { path: PathBuf },

    #[error("sync io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> SyncError {
    let path = path.into();
    move |source| SyncError::Io { path, source }
}

// ============================================================================
// Name validation
// ============================================================================

/// Validate a skill name and return it as a relative path.
///
/// Rejects names that are empty, absolute, or contain `.`, `..` or empty
/// segments so the joined path always stays inside the target.
pub fn safe_name_path(name: &str) -> Result<PathBuf, SyncError> {
    if name.is_empty() {
        return Err(SyncError::EmptyName);
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return Err(SyncError::AbsoluteName {
            name: name.to_string(),
        });
    }
    if name
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(SyncError::InvalidName {
            name: name.to_string(),
        });
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => {
                return Err(SyncError::InvalidName {
                    name: name.to_string(),
                })
            }
        }
    }
    Ok(path.to_path_buf())
}

// ============================================================================
// Linking
// ============================================================================

/// Sync every source into every target directory.
///
/// Missing source paths are skipped with a warning so one broken skill
/// does not block the rest.
pub fn sync(targets: &[PathBuf], sources: &[Source]) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    for target in targets {
        report.merge(sync_target(target, sources)?);
    }

    Ok(report)
}

fn sync_target(target: &Path, sources: &[Source]) -> Result<SyncReport, SyncError> {
    if target.exists() && !target.is_dir() {
        return Err(SyncError::TargetNotDirectory {
            path: target.to_path_buf(),
        });
    }
    fs::create_dir_all(target).map_err(io_at(target))?;

    let mut report = SyncReport::default();

    for source in sources {
        if !source.path.is_dir() {
            report.warnings.push(Warning::general(format!(
                "skill {} has no directory at {}, skipping",
                source.name,
                source.path.display()
            )));
            continue;
        }

        let link_path = target.join(safe_name_path(&source.name)?);
        report.merge(ensure_symlink(&link_path, &source.path)?);
    }

    Ok(report)
}

/// Create or repoint a single symlink. Non-symlink collisions are left
/// alone and reported.
fn ensure_symlink(link_path: &Path, source_path: &Path) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    match fs::symlink_metadata(link_path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if link_matches(link_path, source_path) {
                return Ok(report);
            }
            fs::remove_file(link_path).map_err(io_at(link_path))?;
        }
        Ok(_) => {
            report.warnings.push(Warning::at(
                link_path,
                format!(
                    "destination {} exists and is not a symlink, leaving it alone",
                    link_path.display()
                ),
            ));
            return Ok(report);
        }
        Err(_) => {}
    }

    if let Some(parent) = link_path.parent() {
        fs::create_dir_all(parent).map_err(io_at(parent))?;
    }
    std::os::unix::fs::symlink(source_path, link_path).map_err(io_at(link_path))?;
    report.linked += 1;

    Ok(report)
}

/// Whether an existing symlink already points at `source_path`.
fn link_matches(link_path: &Path, source_path: &Path) -> bool {
    let Ok(current) = fs::read_link(link_path) else {
        return false;
    };

    let resolved = if current.is_absolute() {
        current
    } else {
        match link_path.parent() {
            Some(parent) => parent.join(current),
            None => current,
        }
    };

    // Canonicalize both sides when possible so dot segments and nested
    // symlinks compare equal; fall back to a lexical comparison for
    // dangling links.
    match (fs::canonicalize(&resolved), fs::canonicalize(source_path)) {
        (Ok(a), Ok(b)) => a == b,
        _ => resolved == source_path,
    }
}

// ============================================================================
// Cleanup
// ============================================================================

/// Remove exactly the named symlinks from `target`.
///
/// Entries that exist but are not symlinks are reported, not removed.
pub fn cleanup(target: &Path, sources: &[Source]) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    if !target.is_dir() {
        return Ok(report);
    }

    for source in sources {
        let link_path = target.join(safe_name_path(&source.name)?);
        match fs::symlink_metadata(&link_path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::remove_file(&link_path).map_err(io_at(&link_path))?;
                report.removed += 1;
            }
            Ok(_) => {
                report.warnings.push(Warning::at(
                    &link_path,
                    format!(
                        "{} exists and is not a symlink, leaving it alone",
                        link_path.display()
                    ),
                ));
            }
            Err(_) => {}
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_names() {
        assert_eq!(safe_name_path("alpha").unwrap(), PathBuf::from("alpha"));
        assert_eq!(
            safe_name_path("author/beta").unwrap(),
            PathBuf::from("author/beta")
        );
    }

    #[test]
    fn unsafe_names_are_rejected() {
        assert!(matches!(safe_name_path(""), Err(SyncError::EmptyName)));
        assert!(matches!(
            safe_name_path("/etc"),
            Err(SyncError::AbsoluteName { .. })
        ));
        assert!(matches!(
            safe_name_path("../../etc"),
            Err(SyncError::InvalidName { .. })
        ));
        assert!(matches!(
            safe_name_path("a/./b"),
            Err(SyncError::InvalidName { .. })
        ));
        assert!(matches!(
            safe_name_path("a//b"),
            Err(SyncError::InvalidName { .. })
        ));
    }
}
