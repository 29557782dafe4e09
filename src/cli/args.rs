//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// skillsync - pin, fetch and link versioned skill bundles
#[derive(Parser, Debug)]
#[command(name = "sks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if sks was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Declare a new skill and install it
    Add {
        /// Git origin with an optional `@ref`, a github tree url, or a local path
        input: String,

        /// Subdirectory of the origin to link
        #[arg(long)]
        path: Option<String>,

        /// Name to register the skill under
        #[arg(long)]
        name: Option<String>,
    },
    /// Fetch, resolve and link all declared skills (locked versions must hold)
    Install,
    /// Drop a declared skill and relink the remaining ones
    Remove {
        /// Skill name as registered in the manifest
        name: String,
    },
    /// Like install, but accept moved tags and update the lock
    Update,
    /// Relink skills from the lock without contacting the network
    Sync,
}
