//! cli::commands::install
//!
//! Install every declared skill at its locked revision.
//!
//! Resolution is strict: a semver tag that moved since it was locked is
//! an error, so CI and fresh checkouts always get the revisions the lock
//! records.

use anyhow::Result;

use super::{install_skills, Context};

/// Run the install command.
pub fn install(ctx: &Context) -> Result<()> {
    install_skills(ctx, true)
}
