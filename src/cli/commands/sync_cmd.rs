//! cli::commands::sync
//!
//! Relink the skills tree from the lock, offline.
//!
//! Uses only what is already on disk: locked revisions checked out from
//! existing store clones, plus replace paths. Anything missing locally
//! is an error pointing at `sks install` rather than a silent fetch.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use super::{print_report, skill_sources, Context};
use crate::core::lock::LockKey;
use crate::manifest::State;
use crate::store::Store;
use crate::sync::sync_and_prune;
use crate::ui::sanitize_origin;

/// Run the sync command.
pub fn sync(ctx: &Context) -> Result<()> {
    let state = State::load(&ctx.start)?;
    let root = state.paths.root.clone();
    let targets = vec![state.paths.skills_dir()];

    let store = Store::new(state.paths.store_dir(), ctx.logger);
    let replace = state.manifest.replace_paths(&root);

    let mut origin_paths = BTreeMap::new();
    for (origin, version) in state.manifest.git_origin_versions() {
        if let Some(path) = replace.get(&origin) {
            if path.is_dir() {
                origin_paths.insert(origin, path.clone());
                continue;
            }
            ctx.logger.warn(format!(
                "replace path {} for {} is missing, using store",
                path.display(),
                sanitize_origin(origin.as_str())
            ));
        }

        let key = LockKey::new(origin.clone(), &version);
        let Some(rev) = state.lock.get(&key).cloned() else {
            bail!(
                "no lock entry for {}@{version}; run sks install first",
                sanitize_origin(origin.as_str())
            );
        };

        // An openable mirror with a HEAD is the offline prerequisite.
        let path = store.repo_path(&origin);
        if store.head(&path).is_err() {
            bail!(
                "no local copy of {}; run sks install first",
                sanitize_origin(origin.as_str())
            );
        }
        store.checkout(&origin, &rev)?;
        origin_paths.insert(origin, path);
    }

    let sources = skill_sources(&state, &root, &origin_paths)?;
    let report = sync_and_prune(&targets, &sources)?;

    print_report(&ctx.logger, &report);
    Ok(())
}
