//! cli::commands
//!
//! Command handlers.
//!
//! `install` and `update` share one flow and differ only in strictness;
//! `add` and `remove` edit the manifest and then run that flow; `sync`
//! relinks from the lock without touching the network.

pub mod add;
pub mod install;
pub mod remove;
pub mod sync_cmd;
pub mod update;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::cli::args::Command;
use crate::manifest::State;
use crate::resolve::OriginResolver;
use crate::store::Store;
use crate::sync::{self, Source, SyncReport};
use crate::ui::Logger;

/// Execution context built from the global CLI flags.
pub struct Context {
    /// Directory the command acts from (cwd or `--cwd`).
    pub start: PathBuf,
    pub logger: Logger,
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Add { input, path, name } => {
            add::add(ctx, &input, path.as_deref(), name.as_deref())
        }
        Command::Install => install::install(ctx),
        Command::Remove { name } => remove::remove(ctx, &name),
        Command::Update => update::update(ctx),
        Command::Sync => sync_cmd::sync(ctx),
    }
}

/// The shared install/update flow: resolve every git origin, build the
/// source list, link and prune, and persist the lock if it changed.
pub(crate) fn install_skills(ctx: &Context, strict: bool) -> Result<()> {
    let mut state = State::load(&ctx.start)?;
    let root = state.paths.root.clone();
    let targets = vec![state.paths.skills_dir()];

    // An empty manifest still prunes, so removing the last skill cleans up.
    if state.manifest.skills.is_empty() {
        let report = sync::prune(&state.paths.skills_dir(), &[])?;
        print_report(&ctx.logger, &report);
        return Ok(());
    }

    let store = Store::new(state.paths.store_dir(), ctx.logger);
    let resolver = OriginResolver::new(&store, ctx.logger);

    let requests = state.manifest.git_origin_versions();
    let replace = state.manifest.replace_paths(&root);
    let outcome = resolver.resolve_origins(&requests, &replace, &mut state.lock, strict)?;

    let mut origin_paths = BTreeMap::new();
    for resolution in &outcome.resolutions {
        origin_paths.insert(resolution.origin.clone(), resolution.path.clone());
    }

    let sources = skill_sources(&state, &root, &origin_paths)?;
    let report = sync::sync_and_prune(&targets, &sources)?;

    if outcome.lock_changed {
        state.save_lock()?;
    }

    print_report(&ctx.logger, &report);
    Ok(())
}

pub(crate) fn skill_sources(
    state: &State,
    root: &std::path::Path,
    origin_paths: &BTreeMap<crate::core::types::Origin, PathBuf>,
) -> Result<Vec<Source>> {
    let skill_paths = state.manifest.resolve_skill_paths(root, origin_paths)?;
    Ok(skill_paths
        .into_iter()
        .map(|skill| Source {
            name: skill.name,
            path: skill.path,
        })
        .collect())
}

pub(crate) fn print_report(logger: &Logger, report: &SyncReport) {
    for warning in &report.warnings {
        logger.warn(&warning.message);
    }
    logger.print(format!(
        "linked {}, removed {}",
        report.linked, report.removed
    ));
}
