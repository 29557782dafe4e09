//! cli::commands::remove
//!
//! Drop a skill from the manifest and relink the rest.
//!
//! When the removed skill was the last one using its origin, the origin's
//! lock entries, replace entry and store mirror go with it.

use anyhow::{bail, Result};

use super::{install_skills, Context};
use crate::core::types::Origin;
use crate::manifest::{SkillKind, State};
use crate::store::Store;
use crate::ui::sanitize_origin;

/// Run the remove command.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    let mut state = State::load(&ctx.start)?;

    let Some(removed) = state.manifest.remove_skill(name) else {
        bail!("skill {name:?} not found");
    };

    if removed.kind == SkillKind::Git {
        let origin = Origin::new(&removed.origin);
        if !state.manifest.origin_in_use(&origin) {
            state.manifest.remove_replace(&origin);
            state.lock.remove_origin(&origin);

            let store = Store::new(state.paths.store_dir(), ctx.logger);
            store.remove(&origin)?;
            ctx.logger.debug(format!(
                "pruned store mirror of {}",
                sanitize_origin(origin.as_str())
            ));
        }
    }

    state.save()?;
    ctx.logger.print(format!("removed {name}"));

    install_skills(ctx, true)
}
