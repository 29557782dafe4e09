//! sync::prune
//!
//! Orphan removal.
//!
//! After linking, a target directory may still hold symlinks for skills
//! that were removed from the manifest, and empty directories left
//! behind by renamed nested skills. Pruning removes exactly those,
//! while anything the user put there themselves is only reported.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{io_at, safe_name_path, sync, Source, SyncError, SyncReport, Warning};

/// Sync all sources into all targets, then prune each target.
pub fn sync_and_prune(targets: &[PathBuf], sources: &[Source]) -> Result<SyncReport, SyncError> {
    let mut report = sync(targets, sources)?;
    for target in targets {
        report.merge(prune(target, sources)?);
    }
    Ok(report)
}

/// Remove entries under `target` that this tool created but no longer
/// manages.
///
/// - symlinks whose path is not a current skill name are removed
/// - directories that end up empty and are not a parent of a skill
///   name are removed, deepest first
/// - everything else is left in place and reported
pub fn prune(target: &Path, sources: &[Source]) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    if !target.is_dir() {
        return Ok(report);
    }

    let mut keep: HashSet<PathBuf> = HashSet::new();
    let mut keep_dirs: HashSet<PathBuf> = HashSet::new();
    for source in sources {
        let rel = safe_name_path(&source.name)?;
        let mut ancestor = rel.parent();
        while let Some(dir) = ancestor {
            if dir.as_os_str().is_empty() {
                break;
            }
            keep_dirs.insert(dir.to_path_buf());
            ancestor = dir.parent();
        }
        keep.insert(rel);
    }

    let mut dirs: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(target).min_depth(1) {
        let entry = entry.map_err(|err| SyncError::Io {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| target.to_path_buf()),
            source: io::Error::from(err),
        })?;

        let rel = match entry.path().strip_prefix(target) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            if !keep.contains(&rel) {
                fs::remove_file(entry.path()).map_err(io_at(entry.path()))?;
                report.removed += 1;
            }
        } else if file_type.is_dir() {
            if keep.contains(&rel) {
                report.warnings.push(Warning::at(
                    entry.path(),
                    format!(
                        "destination {} exists and is not a symlink, leaving it alone",
                        entry.path().display()
                    ),
                ));
            } else if !keep_dirs.contains(&rel) {
                dirs.push(rel);
            }
        } else if keep.contains(&rel) {
            report.warnings.push(Warning::at(
                entry.path(),
                format!(
                    "destination {} exists and is not a symlink, leaving it alone",
                    entry.path().display()
                ),
            ));
        } else {
            report.warnings.push(Warning::at(
                entry.path(),
                format!("unmanaged entry {} left in place", entry.path().display()),
            ));
        }
    }

    // Deepest first, so a chain of nested empty directories collapses in
    // one pass.
    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
    for rel in dirs {
        let path = target.join(&rel);
        let is_empty = match fs::read_dir(&path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => false,
        };
        if is_empty {
            fs::remove_dir(&path).map_err(io_at(&path))?;
            report.removed += 1;
        }
    }

    Ok(report)
}
