//! cli::commands::update
//!
//! Update skills to whatever their declared versions currently resolve
//! to.
//!
//! The only difference from install is strictness: a moved semver tag is
//! accepted and re-pinned in the lock instead of failing.

use anyhow::Result;

use super::{install_skills, Context};

/// Run the update command.
pub fn update(ctx: &Context) -> Result<()> {
    install_skills(ctx, false)
}
