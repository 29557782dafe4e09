//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT resolve or link anything directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds a
//! [`commands::Context`] from the global flags and dispatches to the
//! `resolve` / `sync` modules through the command handlers.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::Result;

use crate::ui::{Logger, Verbosity};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let logger = Logger::new(Verbosity::from_flags(cli.quiet, cli.debug));
    let start = match cli.cwd.clone() {
        Some(cwd) => cwd,
        None => std::env::current_dir()?,
    };

    let ctx = commands::Context { start, logger };
    commands::dispatch(cli.command, &ctx)
}
