//! manifest
//!
//! The `skills.json` manifest: which skills a project declares, where
//! they come from, and which local replacements are in effect.
//!
//! # Modules
//!
//! - [`state`] - project state (manifest + lock located and loaded together)

pub mod state;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Origin;
use crate::version::pseudo::is_pseudo_version;
use crate::version::is_valid_tag;

pub use state::State;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no skills.json found from {start} upward")]
    NotFound { start: PathBuf },

    #[error("skills[{index}]: missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("skills[{index}]: duplicate name {name:?}")]
    DuplicateName { index: usize, name: String },

    #[error("skills[{index}]: origin {origin:?} subdir {subdir:?} already used")]
    DuplicateIdentity {
        index: usize,
        origin: String,
        subdir: String,
    },

    #[error("skills[{index}]: origin {origin:?} uses multiple versions")]
    MixedVersions { index: usize, origin: String },

    #[error("skills[{index}]: invalid version {version:?}")]
    InvalidVersion { index: usize, version: String },

    #[error("skills[{index}]: path skills cannot set a version")]
    PathSkillVersion { index: usize },

    #[error("skills[{index}]: invalid subdir {subdir:?}")]
    InvalidSubdir { index: usize, subdir: String },

    #[error("no resolved path for origin {origin:?} (skill {skill:?})")]
    MissingOriginPath { origin: String, skill: String },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Types
// ============================================================================

/// Where a skill's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    /// Fetched from a git origin at a pinned version.
    Git,
    /// A local directory, used as-is.
    Path,
}

/// One declared skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SkillKind,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The parsed `skills.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Origin -> local directory overriding the store for that origin.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replace: BTreeMap<String, String>,
}

/// A skill name paired with the directory its symlink should point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillPath {
    pub name: String,
    pub path: PathBuf,
}

// ============================================================================
// Load / save
// ============================================================================

pub const MANIFEST_FILE: &str = "skills.json";

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let data = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&data).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        self.validate()?;
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut data = serde_json::to_string_pretty(self).map_err(|source| {
            ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        data.push('\n');
        fs::write(path, data).map_err(io_err)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut names: BTreeMap<&str, usize> = BTreeMap::new();
        let mut identities: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut versions: BTreeMap<&str, &str> = BTreeMap::new();

        for (index, skill) in self.skills.iter().enumerate() {
            skill.validate(index)?;

            if names.insert(&skill.name, index).is_some() {
                return Err(ManifestError::DuplicateName {
                    index,
                    name: skill.name.clone(),
                });
            }

            let subdir = normalize_subdir(skill.subdir.as_deref()).ok_or_else(|| {
                ManifestError::InvalidSubdir {
                    index,
                    subdir: skill.subdir.clone().unwrap_or_default(),
                }
            })?;
            let identity = (skill.origin.clone(), subdir.clone());
            if identities.insert(identity, index).is_some() {
                return Err(ManifestError::DuplicateIdentity {
                    index,
                    origin: skill.origin.clone(),
                    subdir,
                });
            }

            if skill.kind != SkillKind::Git {
                continue;
            }
            let version = skill.version.as_deref().unwrap_or_default();
            match versions.insert(&skill.origin, version) {
                Some(existing) if existing != version => {
                    return Err(ManifestError::MixedVersions {
                        index,
                        origin: skill.origin.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// The origin -> version set that needs git resolution.
    pub fn git_origin_versions(&self) -> BTreeMap<Origin, String> {
        let mut versions = BTreeMap::new();
        for skill in &self.skills {
            if skill.kind != SkillKind::Git {
                continue;
            }
            if let Some(version) = &skill.version {
                versions.insert(Origin::new(&skill.origin), version.clone());
            }
        }
        versions
    }

    /// The replace table with paths resolved against the project root.
    pub fn replace_paths(&self, root: &Path) -> BTreeMap<Origin, PathBuf> {
        self.replace
            .iter()
            .map(|(origin, path)| (Origin::new(origin), absolute_under(root, Path::new(path))))
            .collect()
    }

    /// Map every skill to the directory its symlink should point at.
    ///
    /// Git skills look their origin up in `origin_paths` (produced by
    /// resolution); path skills resolve against the project root. Subdirs
    /// are appended in both cases.
    pub fn resolve_skill_paths(
        &self,
        root: &Path,
        origin_paths: &BTreeMap<Origin, PathBuf>,
    ) -> Result<Vec<SkillPath>, ManifestError> {
        let mut paths = Vec::with_capacity(self.skills.len());

        for skill in &self.skills {
            let base = match skill.kind {
                SkillKind::Git => {
                    let origin = Origin::new(&skill.origin);
                    origin_paths
                        .get(&origin)
                        .cloned()
                        .ok_or_else(|| ManifestError::MissingOriginPath {
                            origin: skill.origin.clone(),
                            skill: skill.name.clone(),
                        })?
                }
                SkillKind::Path => absolute_under(root, Path::new(&skill.origin)),
            };

            let path = match skill.subdir.as_deref() {
                Some(subdir) if !subdir.is_empty() => base.join(subdir),
                _ => base,
            };
            paths.push(SkillPath {
                name: skill.name.clone(),
                path,
            });
        }

        Ok(paths)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert `skill`, replacing an existing entry with the same name.
    ///
    /// Validation runs on the updated set; callers abort before saving
    /// when it fails.
    pub fn upsert_skill(&mut self, skill: Skill) -> Result<(), ManifestError> {
        match self
            .skills
            .iter_mut()
            .find(|existing| existing.name == skill.name)
        {
            Some(existing) => *existing = skill,
            None => self.skills.push(skill),
        }
        self.validate()
    }

    /// Remove the skill named `name`, returning it.
    pub fn remove_skill(&mut self, name: &str) -> Option<Skill> {
        let index = self.skills.iter().position(|skill| skill.name == name)?;
        Some(self.skills.remove(index))
    }

    /// Whether any git skill still uses `origin`.
    pub fn origin_in_use(&self, origin: &Origin) -> bool {
        self.skills
            .iter()
            .any(|skill| skill.kind == SkillKind::Git && &Origin::new(&skill.origin) == origin)
    }

    /// Drop any replace entry for `origin`.
    pub fn remove_replace(&mut self, origin: &Origin) {
        self.replace.retain(|key, _| &Origin::new(key) != origin);
    }
}

impl Skill {
    fn validate(&self, index: usize) -> Result<(), ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::MissingField {
                index,
                field: "name",
            });
        }
        if self.origin.is_empty() {
            return Err(ManifestError::MissingField {
                index,
                field: "origin",
            });
        }
        match self.kind {
            SkillKind::Git => {
                let version = self.version.as_deref().unwrap_or_default();
                if version.is_empty() {
                    return Err(ManifestError::MissingField {
                        index,
                        field: "version",
                    });
                }
                if !is_valid_tag(version) && !is_pseudo_version(version) {
                    return Err(ManifestError::InvalidVersion {
                        index,
                        version: version.to_string(),
                    });
                }
            }
            SkillKind::Path => {
                if self.version.is_some() {
                    return Err(ManifestError::PathSkillVersion { index });
                }
            }
        }
        Ok(())
    }
}

/// Normalize a subdir for identity comparison. `None` means invalid.
fn normalize_subdir(subdir: Option<&str>) -> Option<String> {
    let Some(subdir) = subdir else {
        return Some(String::new());
    };
    if subdir.is_empty() {
        return Some(String::new());
    }
    if Path::new(subdir).is_absolute() {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in subdir.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

fn absolute_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
