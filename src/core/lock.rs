//! core::lock
//!
//! The persisted lock set: `(origin, version)` -> revision pins.
//!
//! The lock set is the only durable cross-run state for revision pinning.
//! It is modeled as an ordered map with an equality-comparable composite
//! key, which makes duplicate detection at load time and deterministic
//! serialization trivial.
//!
//! # File format
//!
//! ```json
//! {
//!   "schema": 1,
//!   "entries": [
//!     { "origin": "https://github.com/acme/skills", "version": "v1.2.0", "rev": "..." }
//!   ]
//! }
//! ```
//!
//! Entries are written sorted by origin, then version, then revision, so
//! lock-file diffs are reproducible.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Origin, Revision};

const LOCK_SCHEMA_VERSION: u32 = 1;

/// Errors from lock-file load and save.
#[derive(Debug, Error)]
pub enum LockError {
    /// Two entries share a key but disagree on the revision.
    #[error("lock file has conflicting entries for {origin} {version}")]
    ConflictingEntries { origin: Origin, version: String },

    /// An entry is missing one of its required fields.
    #[error("invalid lock entry: origin={origin:?} version={version:?} rev={rev:?}")]
    InvalidEntry {
        origin: String,
        version: String,
        rev: String,
    },

    /// The file's schema version is not supported.
    #[error("unsupported lock schema {schema}")]
    UnsupportedSchema { schema: u32 },

    #[error("lock file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Composite lock key. `Ord` is derived so a `BTreeMap` keyed by it
/// iterates in the serialization order the lock file requires.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey {
    pub origin: Origin,
    pub version: String,
}

impl LockKey {
    pub fn new(origin: Origin, version: impl Into<String>) -> Self {
        Self {
            origin,
            version: version.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockFile {
    #[serde(default)]
    schema: u32,
    #[serde(default)]
    entries: Vec<LockEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockEntry {
    origin: String,
    version: String,
    rev: String,
}

/// The in-memory lock set for one logical run.
///
/// Callers treat one instance as owned by one run and persist it after all
/// resolutions in that run complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSet {
    entries: BTreeMap<LockKey, Revision>,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the lock set from `path`. A missing file yields an empty set.
    ///
    /// # Errors
    ///
    /// - [`LockError::ConflictingEntries`] when two entries share a key
    ///   but carry different revisions
    /// - [`LockError::InvalidEntry`] when a field is empty
    /// - [`LockError::UnsupportedSchema`] for unknown schema versions
    pub fn load(path: &Path) -> Result<Self, LockError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(err.into()),
        };

        let parsed: LockFile = serde_json::from_slice(&data)?;
        if parsed.schema != 0 && parsed.schema != LOCK_SCHEMA_VERSION {
            return Err(LockError::UnsupportedSchema {
                schema: parsed.schema,
            });
        }

        let mut entries = BTreeMap::new();
        for entry in parsed.entries {
            if entry.origin.is_empty() || entry.version.is_empty() || entry.rev.is_empty() {
                return Err(LockError::InvalidEntry {
                    origin: entry.origin,
                    version: entry.version,
                    rev: entry.rev,
                });
            }
            let key = LockKey::new(Origin::new(&entry.origin), entry.version);
            match entries.get(&key) {
                Some(existing) if *existing != entry.rev => {
                    return Err(LockError::ConflictingEntries {
                        origin: key.origin,
                        version: key.version,
                    });
                }
                _ => {
                    entries.insert(key, entry.rev);
                }
            }
        }

        Ok(Self { entries })
    }

    /// Save the lock set to `path` in deterministic order.
    pub fn save(&self, path: &Path) -> Result<(), LockError> {
        let entries: Vec<LockEntry> = self
            .entries
            .iter()
            .map(|(key, rev)| LockEntry {
                origin: key.origin.as_str().to_string(),
                version: key.version.clone(),
                rev: rev.clone(),
            })
            .collect();

        let mut payload = serde_json::to_vec_pretty(&LockFile {
            schema: LOCK_SCHEMA_VERSION,
            entries,
        })?;
        payload.push(b'\n');

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, payload)?;
        Ok(())
    }

    pub fn get(&self, key: &LockKey) -> Option<&Revision> {
        self.entries.get(key)
    }

    /// Insert or update a pin. Returns true when the stored revision
    /// actually changed.
    pub fn pin(&mut self, key: LockKey, rev: Revision) -> bool {
        match self.entries.get(&key) {
            Some(existing) if *existing == rev => false,
            _ => {
                self.entries.insert(key, rev);
                true
            }
        }
    }

    /// Drop every pin for the given origin. Used when the last dependency
    /// on an origin is removed.
    pub fn remove_origin(&mut self, origin: &Origin) {
        self.entries.retain(|key, _| key.origin != *origin);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, LockKey, Revision> {
        self.entries.iter()
    }
}
