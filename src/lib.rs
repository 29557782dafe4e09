//! Skillsync - a dependency manager for skill content bundles.
//!
//! Skillsync resolves human-supplied references (URLs, local paths, branch or
//! tag names) to immutable git revisions, pins them in a lock file, mirrors
//! remote repositories into a local store, and materializes the resolved
//! content into a project directory as a tree of symbolic links.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to commands)
//! - [`resolve`] - Lock consistency and origin resolution orchestration
//! - [`version`] - Version and pseudo-version resolution against a repository
//! - [`remote`] - Remote access: auth selection, URL rewriting, ref listing
//! - [`store`] - Content-addressed local mirror store of remote origins
//! - [`sync`] - Symlink install/sync engine with orphan pruning
//! - [`manifest`] - Manifest (`skills.json`) and project state
//! - [`core`] - Domain types, path layout, and the lock set
//! - [`git`] - Single doorway for all git operations
//! - [`ui`] - Output helpers and the logging context
//!
//! # Correctness Invariants
//!
//! 1. Pseudo-version synthesis is deterministic: the same commit always
//!    yields the same version string.
//! 2. The lock set never holds two revisions for one `(origin, version)` key.
//! 3. A replace-path working tree is never force-checked-out; only managed
//!    store mirrors are mutated.
//! 4. The sync engine only ever creates or removes symlinks under the target
//!    root; non-symlink content is reported, never touched.

pub mod cli;
pub mod core;
pub mod git;
pub mod manifest;
pub mod remote;
pub mod resolve;
pub mod store;
pub mod sync;
pub mod ui;
pub mod version;
