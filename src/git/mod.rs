//! git
//!
//! Single doorway for all git operations.
//!
//! The [`Repo`] struct wraps `git2` and is the only way the rest of the
//! crate reads or mutates a repository. Keeping the doorway single ensures
//! consistent error handling and makes the "only managed mirrors are
//! force-checked-out" invariant auditable in one place. The sole exception
//! is [`crate::remote::refs`], which needs `git2::Remote::create_detached`
//! to list refs without a repository.

pub mod repo;

pub use repo::{GitError, Repo};
